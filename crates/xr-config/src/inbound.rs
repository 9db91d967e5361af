//! Inbound endpoints: a closed union over protocol settings.
//! 入站配置模型。
//!
//! Decoding reads `protocol` first, then decodes `settings` as the record
//! registered for that protocol. An unknown protocol is `UnsupportedProtocol`;
//! no placeholder endpoint is produced.

use once_cell::sync::Lazy;
use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use xr_types::{CodecError, CodecResult};

use crate::alias::{comma_list, WireEnum};
use crate::de::{decode_node, is_false, is_zero, object_or_empty, ScalarValue};
use crate::defaults::default_tun_mtu;
use crate::enums::{
    AllocateStrategy, EncryptionMethod, Flow, InboundProtocol, SocksAuth, TrafficType,
    TransportProtocol, VlessDecryption,
};
use crate::port::Port;
use crate::stream::StreamSettings;

/// Account whose key identifies it inside its endpoint.
pub trait ClientKey {
    /// Email, or username for socks/http accounts.
    fn key(&self) -> &str;
}

/// Find exactly one client with `key`.
///
/// # Errors
/// `ClientNotFound` when absent, `DuplicateClient` when the key is ambiguous.
pub fn find_unique<'a, C: ClientKey>(clients: &'a [C], key: &str, endpoint: &str) -> CodecResult<&'a C> {
    let mut hits = clients.iter().filter(|c| c.key() == key);
    let first = hits
        .next()
        .ok_or_else(|| CodecError::client_not_found(key, endpoint))?;
    if hits.next().is_some() {
        return Err(CodecError::duplicate_client(key, endpoint));
    }
    Ok(first)
}

macro_rules! client_key {
    ($($ty:ty => $field:ident),+ $(,)?) => {
        $(
            impl ClientKey for $ty {
                fn key(&self) -> &str {
                    &self.$field
                }
            }
        )+
    };
}

client_key! {
    VlessClient => email,
    VmessClient => email,
    TrojanClient => email,
    ShadowsocksClient => email,
    SocksAccount => user,
    HttpAccount => user,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DokodemoDoorSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port_map: Option<BTreeMap<String, String>>,
    #[serde(default, with = "comma_list", skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<TransportProtocol>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub follow_redirect: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpAccount {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInboundSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<HttpAccount>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_transparent: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowsocksClient {
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EncryptionMethod>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Shadowsocks server. `method`/`password` at this level are the server key
/// for 2022 ciphers, or the single-user credentials otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowsocksInboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EncryptionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub clients: Vec<ShadowsocksClient>,
    #[serde(default, with = "comma_list", skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<TransportProtocol>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocksAccount {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocksInboundSettings {
    #[serde(default)]
    pub auth: SocksAuth,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<SocksAccount>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub udp: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlessClient {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Flow::is_none")]
    pub flow: Flow,
}

/// Fallback target for VLESS/Trojan over TLS.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Port number, `addr:port` or a unix socket path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xver: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VlessInboundSettings {
    #[serde(default)]
    pub clients: Vec<VlessClient>,
    #[serde(default)]
    pub decryption: VlessDecryption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<Vec<Fallback>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessClient {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessDefault {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmessInboundSettings {
    #[serde(default)]
    pub clients: Vec<VmessClient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<VmessDefault>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrojanClient {
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrojanInboundSettings {
    #[serde(default)]
    pub clients: Vec<TrojanClient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<Vec<Fallback>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardPeer {
    pub public_key: String,
    #[serde(rename = "allowedIPs", default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_ips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardInboundSettings {
    pub secret_key: String,
    #[serde(default)]
    pub peers: Vec<WireguardPeer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunInboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "MTU", default = "default_tun_mtu")]
    pub mtu: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_level: u32,
}

impl Default for TunInboundSettings {
    fn default() -> Self {
        Self {
            name: None,
            mtu: default_tun_mtu(),
            user_level: 0,
        }
    }
}

/// Protocol-specific inbound settings; the variant is the protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundSettings {
    DokodemoDoor(DokodemoDoorSettings),
    Http(HttpInboundSettings),
    Shadowsocks(ShadowsocksInboundSettings),
    Socks(SocksInboundSettings),
    Vless(VlessInboundSettings),
    Vmess(VmessInboundSettings),
    Trojan(TrojanInboundSettings),
    Wireguard(WireguardInboundSettings),
    Tun(TunInboundSettings),
}

impl InboundSettings {
    pub fn protocol(&self) -> InboundProtocol {
        match self {
            Self::DokodemoDoor(_) => InboundProtocol::DokodemoDoor,
            Self::Http(_) => InboundProtocol::Http,
            Self::Shadowsocks(_) => InboundProtocol::Shadowsocks,
            Self::Socks(_) => InboundProtocol::Socks,
            Self::Vless(_) => InboundProtocol::Vless,
            Self::Vmess(_) => InboundProtocol::Vmess,
            Self::Trojan(_) => InboundProtocol::Trojan,
            Self::Wireguard(_) => InboundProtocol::Wireguard,
            Self::Tun(_) => InboundProtocol::Tun,
        }
    }

    /// Decode a `settings` node as the record registered for `protocol`.
    ///
    /// # Errors
    /// `MalformedDocument` when the node does not match that record.
    pub fn from_value(protocol: InboundProtocol, value: Value) -> CodecResult<Self> {
        const PATH: &str = "$";
        Ok(match protocol {
            InboundProtocol::DokodemoDoor => Self::DokodemoDoor(decode_node(value, PATH)?),
            InboundProtocol::Http => Self::Http(decode_node(value, PATH)?),
            InboundProtocol::Shadowsocks => Self::Shadowsocks(decode_node(value, PATH)?),
            InboundProtocol::Socks => Self::Socks(decode_node(value, PATH)?),
            InboundProtocol::Vless => Self::Vless(decode_node(value, PATH)?),
            InboundProtocol::Vmess => Self::Vmess(decode_node(value, PATH)?),
            InboundProtocol::Trojan => Self::Trojan(decode_node(value, PATH)?),
            InboundProtocol::Wireguard => Self::Wireguard(decode_node(value, PATH)?),
            InboundProtocol::Tun => Self::Tun(decode_node(value, PATH)?),
        })
    }

    /// Keys of every client/account, in declaration order.
    pub fn client_keys(&self) -> Vec<&str> {
        fn keys<C: ClientKey>(clients: &[C]) -> Vec<&str> {
            clients.iter().map(ClientKey::key).collect()
        }
        match self {
            Self::Http(s) => keys(&s.accounts),
            Self::Shadowsocks(s) => keys(&s.clients),
            Self::Socks(s) => keys(&s.accounts),
            Self::Vless(s) => keys(&s.clients),
            Self::Vmess(s) => keys(&s.clients),
            Self::Trojan(s) => keys(&s.clients),
            Self::DokodemoDoor(_) | Self::Wireguard(_) | Self::Tun(_) => Vec::new(),
        }
    }
}

impl Serialize for InboundSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::DokodemoDoor(s) => s.serialize(serializer),
            Self::Http(s) => s.serialize(serializer),
            Self::Shadowsocks(s) => s.serialize(serializer),
            Self::Socks(s) => s.serialize(serializer),
            Self::Vless(s) => s.serialize(serializer),
            Self::Vmess(s) => s.serialize(serializer),
            Self::Trojan(s) => s.serialize(serializer),
            Self::Wireguard(s) => s.serialize(serializer),
            Self::Tun(s) => s.serialize(serializer),
        }
    }
}

/// Borrowed client of an inbound, tagged by protocol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientRef<'a> {
    Vless(&'a VlessClient),
    Vmess(&'a VmessClient),
    Trojan(&'a TrojanClient),
    Shadowsocks(&'a ShadowsocksClient),
    Socks(&'a SocksAccount),
    Http(&'a HttpAccount),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sniffing {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_override: Option<Vec<TrafficType>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub metadata_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains_excluded: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub route_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<AllocateStrategy>,
    /// Minutes between port refreshes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<u32>,
}

static DEFAULT_STREAM: Lazy<StreamSettings> = Lazy::new(StreamSettings::default);

/// One inbound endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    pub tag: String,
    pub listen: Option<String>,
    pub port: Port,
    pub settings: InboundSettings,
    pub stream_settings: Option<StreamSettings>,
    pub sniffing: Option<Sniffing>,
    pub allocate: Option<Allocate>,
}

#[derive(Deserialize)]
struct InboundCommon {
    #[serde(default)]
    listen: Option<String>,
    #[serde(default)]
    sniffing: Option<Sniffing>,
    #[serde(default)]
    allocate: Option<Allocate>,
}

impl Inbound {
    pub fn new(tag: impl Into<String>, port: impl Into<Port>, settings: InboundSettings) -> Self {
        Self {
            tag: tag.into(),
            listen: None,
            port: port.into(),
            settings,
            stream_settings: None,
            sniffing: None,
            allocate: None,
        }
    }

    #[must_use]
    pub fn with_stream(mut self, stream: StreamSettings) -> Self {
        self.stream_settings = Some(stream);
        self
    }

    pub fn protocol(&self) -> InboundProtocol {
        self.settings.protocol()
    }

    /// Stream settings, or the raw/none default when the block is absent.
    pub fn stream(&self) -> &StreamSettings {
        self.stream_settings.as_ref().unwrap_or(&DEFAULT_STREAM)
    }

    pub fn client_keys(&self) -> Vec<&str> {
        self.settings.client_keys()
    }

    /// Look up the client identified by `key`.
    ///
    /// # Errors
    /// `ClientNotFound` if no client matches or the protocol has no clients,
    /// `DuplicateClient` if several do.
    pub fn find_client(&self, key: &str) -> CodecResult<ClientRef<'_>> {
        let tag = self.tag.as_str();
        match &self.settings {
            InboundSettings::Vless(s) => find_unique(&s.clients, key, tag).map(ClientRef::Vless),
            InboundSettings::Vmess(s) => find_unique(&s.clients, key, tag).map(ClientRef::Vmess),
            InboundSettings::Trojan(s) => find_unique(&s.clients, key, tag).map(ClientRef::Trojan),
            InboundSettings::Shadowsocks(s) => {
                find_unique(&s.clients, key, tag).map(ClientRef::Shadowsocks)
            }
            InboundSettings::Socks(s) => find_unique(&s.accounts, key, tag).map(ClientRef::Socks),
            InboundSettings::Http(s) => find_unique(&s.accounts, key, tag).map(ClientRef::Http),
            InboundSettings::DokodemoDoor(_)
            | InboundSettings::Wireguard(_)
            | InboundSettings::Tun(_) => Err(CodecError::client_not_found(key, tag)),
        }
    }

    /// Decode one endpoint node.
    ///
    /// # Errors
    /// `UnsupportedProtocol` for an unregistered protocol tag, `InvalidPortFormat`
    /// for a bad port, `MalformedDocument` for any other structural problem.
    pub fn from_value(value: Value) -> CodecResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(CodecError::malformed_document("$", "endpoint must be an object"));
        };
        let protocol = read_protocol(&map)?;
        let protocol = InboundProtocol::decode(&protocol)
            .map_err(|_| CodecError::unsupported_protocol(protocol))?;

        let settings = InboundSettings::from_value(protocol, object_or_empty(map.remove("settings")))
            .map_err(|e| e.at("settings"))?;
        let tag = match map.remove("tag") {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(CodecError::malformed_document(
                    "tag",
                    format!("expected a string, found {other}"),
                ))
            }
            None => return Err(CodecError::malformed_document("tag", "missing field `tag`")),
        };
        let port = match map.remove("port") {
            Some(v) => Port::from_json(&v)?,
            None => return Err(CodecError::malformed_document("port", "missing field `port`")),
        };
        let stream_settings = match map.remove("streamSettings") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                StreamSettings::from_value(v).map_err(|e| e.at("streamSettings"))?,
            ),
        };
        map.remove("protocol");
        let common: InboundCommon = decode_node(Value::Object(map), "$")?;

        Ok(Self {
            tag,
            listen: common.listen,
            port,
            settings,
            stream_settings,
            sniffing: common.sniffing,
            allocate: common.allocate,
        })
    }
}

/// Read the `protocol` discriminator without touching the rest of the node.
pub(crate) fn read_protocol(map: &Map<String, Value>) -> CodecResult<String> {
    match map.get("protocol") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(CodecError::malformed_document(
            "protocol",
            format!("expected a string, found {other}"),
        )),
        None => Err(CodecError::malformed_document("protocol", "missing field `protocol`")),
    }
}

impl Serialize for Inbound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(listen) = &self.listen {
            map.serialize_entry("listen", listen)?;
        }
        map.serialize_entry("port", &self.port)?;
        map.serialize_entry("protocol", &self.protocol())?;
        map.serialize_entry("settings", &self.settings)?;
        if let Some(stream) = &self.stream_settings {
            map.serialize_entry("streamSettings", stream)?;
        }
        map.serialize_entry("tag", &self.tag)?;
        if let Some(sniffing) = &self.sniffing {
            map.serialize_entry("sniffing", sniffing)?;
        }
        if let Some(allocate) = &self.allocate {
            map.serialize_entry("allocate", allocate)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Inbound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Inbound::from_value(value).map_err(D::Error::custom)
    }
}
