//! Enumerated wire fields.
//! 配置中的枚举字段。
//!
//! Every enum here is declared through [`wire_enum!`](crate::wire_enum); the
//! first alias is what gets written back.

use crate::wire_enum;

wire_enum! {
    /// Transport discriminator (`streamSettings.network`).
    pub enum StreamNetwork {
        Raw => ["raw", "tcp"],
        XHttp => ["xhttp", "splithttp"],
        Kcp => ["kcp", "mkcp"],
        Grpc => ["grpc"],
        Ws => ["ws", "websocket"],
        HttpUpgrade => ["httpupgrade"],
    }
}

wire_enum! {
    /// Security discriminator (`streamSettings.security`).
    pub enum StreamSecurity {
        None => ["none"],
        Tls => ["tls"],
        Reality => ["reality"],
    }
}

wire_enum! {
    /// uTLS client fingerprint. `None` is the empty token.
    pub enum Fingerprint {
        None => [""],
        Chrome => ["chrome"],
        Firefox => ["firefox"],
        Safari => ["safari"],
        Ios => ["ios"],
        Android => ["android"],
        Edge => ["edge"],
        E360 => ["360"],
        Qq => ["qq"],
        Unsafe => ["unsafe"],
        Random => ["random"],
        Randomized => ["randomized"],
    }
}

impl Fingerprint {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

wire_enum! {
    /// XTLS flow control. `None` is the empty token.
    pub enum Flow {
        None => [""],
        XtlsRprxVision => ["xtls-rprx-vision"],
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::None
    }
}

impl Flow {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

wire_enum! {
    /// Raw transport header obfuscation.
    pub enum HeadersType {
        None => ["none"],
        Http => ["http"],
    }
}

impl Default for HeadersType {
    fn default() -> Self {
        Self::None
    }
}

wire_enum! {
    /// mKCP packet header disguise.
    pub enum KcpHeaderType {
        None => ["none"],
        Srtp => ["srtp"],
        Utp => ["utp"],
        WechatVideo => ["wechat-video"],
        Dtls => ["dtls"],
        Wireguard => ["wireguard"],
        Dns => ["dns"],
    }
}

impl Default for KcpHeaderType {
    fn default() -> Self {
        Self::None
    }
}

wire_enum! {
    pub enum XHttpMode {
        Auto => ["auto"],
        PacketUp => ["packet-up"],
        StreamUp => ["stream-up"],
        StreamOne => ["stream-one"],
    }
}

impl Default for XHttpMode {
    fn default() -> Self {
        Self::Auto
    }
}

wire_enum! {
    /// Shadowsocks cipher.
    pub enum EncryptionMethod {
        Blake3Aes128Gcm => ["2022-blake3-aes-128-gcm"],
        Blake3Aes256Gcm => ["2022-blake3-aes-256-gcm"],
        Blake3Chacha20Poly1305 => ["2022-blake3-chacha20-poly1305"],
        Aes256Gcm => ["aes-256-gcm"],
        Aes128Gcm => ["aes-128-gcm"],
        Chacha20Poly1305 => ["chacha20-poly1305", "chacha20-ietf-poly1305"],
        XChacha20Poly1305 => ["xchacha20-poly1305", "xchacha20-ietf-poly1305"],
        None => ["none", "plain"],
    }
}

impl EncryptionMethod {
    /// Shadowsocks 2022 ciphers carry a server key in addition to the user key.
    pub fn is_2022(&self) -> bool {
        matches!(
            self,
            Self::Blake3Aes128Gcm | Self::Blake3Aes256Gcm | Self::Blake3Chacha20Poly1305
        )
    }
}

wire_enum! {
    /// VMess client-side cipher (`scy`).
    pub enum VMessSecurity {
        None => ["none"],
        Aes128Gcm => ["aes-128-gcm"],
        Chacha20Poly1305 => ["chacha20-poly1305"],
        Auto => ["auto"],
        Zero => ["zero"],
    }
}

wire_enum! {
    pub enum VlessDecryption {
        None => ["none"],
    }
}

impl Default for VlessDecryption {
    fn default() -> Self {
        Self::None
    }
}

wire_enum! {
    pub enum SocksAuth {
        NoAuth => ["noauth"],
        Password => ["password"],
    }
}

impl Default for SocksAuth {
    fn default() -> Self {
        Self::NoAuth
    }
}

wire_enum! {
    /// Inbound protocol discriminator.
    pub enum InboundProtocol {
        DokodemoDoor => ["dokodemo-door", "tunnel"],
        Http => ["http"],
        Shadowsocks => ["shadowsocks"],
        Socks => ["socks"],
        Vless => ["vless"],
        Vmess => ["vmess"],
        Trojan => ["trojan"],
        Wireguard => ["wireguard"],
        Tun => ["tun"],
    }
}

wire_enum! {
    /// Outbound protocol discriminator.
    pub enum OutboundProtocol {
        Blackhole => ["blackhole"],
        Dns => ["dns"],
        Freedom => ["freedom", "direct"],
        Loopback => ["loopback"],
        Http => ["http"],
        Shadowsocks => ["shadowsocks"],
        Socks => ["socks"],
        Vless => ["vless"],
        Vmess => ["vmess"],
        Trojan => ["trojan"],
        Wireguard => ["wireguard"],
        Hysteria => ["hysteria"],
    }
}

wire_enum! {
    pub enum LogLevel {
        None => ["none"],
        Debug => ["debug"],
        Info => ["info"],
        Warning => ["warning"],
        Error => ["error"],
    }
}

wire_enum! {
    /// Outbound/sockopt domain resolution strategy.
    pub enum DomainStrategy {
        AsIs => ["AsIs"],
        UseIp => ["UseIP"],
        UseIpv6v4 => ["UseIPv6v4"],
        UseIpv6 => ["UseIPv6"],
        UseIpv4v6 => ["UseIPv4v6"],
        UseIpv4 => ["UseIPv4"],
        ForceIp => ["ForceIP"],
        ForceIpv6v4 => ["ForceIPv6v4"],
        ForceIpv6 => ["ForceIPv6"],
        ForceIpv4v6 => ["ForceIPv4v6"],
        ForceIpv4 => ["ForceIPv4"],
    }
}

wire_enum! {
    pub enum RoutingDomainStrategy {
        AsIs => ["AsIs"],
        IpIfNonMatch => ["IPIfNonMatch"],
        IpOnDemand => ["IPOnDemand"],
    }
}

wire_enum! {
    pub enum DnsQueryStrategy {
        UseIp => ["UseIP"],
        UseIpv4 => ["UseIPv4"],
        UseIpv6 => ["UseIPv6"],
        UseSystem => ["UseSystem"],
    }
}

wire_enum! {
    pub enum TransportProtocol {
        Tcp => ["tcp"],
        Udp => ["udp"],
    }
}

wire_enum! {
    /// Sniffing `destOverride` entries.
    pub enum TrafficType {
        Http => ["http"],
        Tls => ["tls"],
        Quic => ["quic"],
        FakeDns => ["fakedns"],
    }
}

wire_enum! {
    pub enum AllocateStrategy {
        Always => ["always"],
        Random => ["random"],
    }
}

wire_enum! {
    pub enum TProxy {
        Redirect => ["redirect"],
        On => ["tproxy"],
        Off => ["off"],
    }
}

wire_enum! {
    pub enum TcpCongestion {
        Bbr => ["bbr"],
        Cubic => ["cubic"],
        Reno => ["reno"],
    }
}

wire_enum! {
    pub enum CertificateUsage {
        Encipherment => ["encipherment"],
        Verify => ["verify"],
        Issue => ["issue"],
    }
}

wire_enum! {
    pub enum BalancerStrategyType {
        Random => ["random"],
        RoundRobin => ["roundRobin"],
        LeastPing => ["leastPing"],
        LeastLoad => ["leastLoad"],
    }
}

impl Default for BalancerStrategyType {
    fn default() -> Self {
        Self::Random
    }
}

wire_enum! {
    /// DNS outbound handling of non A/AAAA queries.
    pub enum NonIpQueryType {
        Drop => ["drop"],
        Skip => ["skip"],
        Reject => ["reject"],
    }
}

wire_enum! {
    pub enum RoutingRuleType {
        Field => ["field"],
    }
}

impl Default for RoutingRuleType {
    fn default() -> Self {
        Self::Field
    }
}

wire_enum! {
    /// Sniffed protocol names matched by routing rules.
    pub enum NetProtocol {
        Http => ["http"],
        Tls => ["tls"],
        Quic => ["quic"],
        Bittorrent => ["bittorrent"],
    }
}

wire_enum! {
    pub enum AddressPortStrategy {
        None => ["none"],
        SrvPortOnly => ["SrvPortOnly"],
        SrvAddressOnly => ["SrvAddressOnly"],
        SrvPortAndAddress => ["SrvPortAndAddress"],
        TxtPortOnly => ["TxtPortOnly"],
        TxtAddressOnly => ["TxtAddressOnly"],
        TxtPortAndAddress => ["TxtPortAndAddress"],
    }
}

wire_enum! {
    /// Target OS of a custom sockopt.
    pub enum OperatingSystem {
        Linux => ["linux"],
        Windows => ["windows"],
        Darwin => ["darwin"],
    }
}
