//! Link schemes and the inbound protocols that map onto them.

use xr_config::enums::InboundProtocol;
use xr_config::{wire_enum, WireEnum};
use xr_types::{CodecError, CodecResult};

wire_enum! {
    /// URI scheme of a share link.
    pub enum LinkScheme {
        Vless => ["vless"],
        Vmess => ["vmess"],
        Trojan => ["trojan"],
        Shadowsocks => ["ss"],
        Socks => ["socks", "socks5"],
        Http => ["http"],
    }
}

impl LinkScheme {
    /// Scheme used to share an inbound of `protocol`.
    ///
    /// # Errors
    /// `UnsupportedLinkProtocol` for protocols without a link form.
    pub fn for_inbound(protocol: InboundProtocol) -> CodecResult<Self> {
        match protocol {
            InboundProtocol::Vless => Ok(Self::Vless),
            InboundProtocol::Vmess => Ok(Self::Vmess),
            InboundProtocol::Trojan => Ok(Self::Trojan),
            InboundProtocol::Shadowsocks => Ok(Self::Shadowsocks),
            InboundProtocol::Socks => Ok(Self::Socks),
            InboundProtocol::Http => Ok(Self::Http),
            InboundProtocol::DokodemoDoor
            | InboundProtocol::Wireguard
            | InboundProtocol::Tun => Err(CodecError::unsupported_link(protocol.token())),
        }
    }

    /// Split `scheme://rest`.
    ///
    /// # Errors
    /// `MalformedShareLink` without a `://` separator, `UnsupportedLinkProtocol`
    /// for an unknown scheme.
    pub fn split(link: &str) -> CodecResult<(Self, &str)> {
        let (scheme, rest) = link
            .split_once("://")
            .ok_or_else(|| CodecError::malformed_link(link, "missing scheme separator"))?;
        let scheme = Self::decode(scheme).map_err(|_| CodecError::unsupported_link(scheme))?;
        Ok((scheme, rest))
    }

    /// `scheme://` prefix.
    pub fn prefix(self) -> String {
        format!("{}://", self.token())
    }
}
