//! Outbound endpoints.
//! 出站配置模型。

use serde::de::Error as DeError;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use xr_types::{CodecError, CodecResult};

use crate::alias::WireEnum;
use crate::de::{decode_node, is_zero, object_or_empty, ScalarValue};
use crate::enums::{
    DomainStrategy, EncryptionMethod, Flow, HeadersType, NonIpQueryType, OutboundProtocol,
    TransportProtocol, VMessSecurity,
};
use crate::inbound::read_protocol;
use crate::stream::StreamSettings;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackholeResponse {
    #[serde(default)]
    pub r#type: HeadersType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlackholeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<BlackholeResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<TransportProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(rename = "nonIPQuery", default, skip_serializing_if = "Option::is_none")]
    pub non_ip_query: Option<NonIpQueryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_types: Option<Vec<ScalarValue>>,
}

/// TLS ClientHello fragmentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packets: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// UDP noise packet sent before the first payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Noise {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<ScalarValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreedomSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_strategy: Option<DomainStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noises: Option<Vec<Noise>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_protocol: Option<u32>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub user_level: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopbackSettings {
    pub inbound_tag: String,
}

/// Upstream HTTP proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOutboundSettings {
    pub address: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

/// Upstream SOCKS5 proxy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocksOutboundSettings {
    pub address: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Entry of the legacy `servers` list (Shadowsocks/Trojan).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordServer {
    pub address: String,
    pub port: u16,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EncryptionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowsocksOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<EncryptionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uot: Option<bool>,
    #[serde(rename = "UoTVersion", default, skip_serializing_if = "Option::is_none")]
    pub uot_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<PasswordServer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrojanOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<PasswordServer>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlessReverse {
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlessUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Flow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<VMessSecurity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

/// Legacy `vnext` server entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VNext<U> {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub users: Vec<U>,
}

/// VLESS client. Either the flat form (`address`/`port`/`id`) or `vnext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlessOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Flow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<VlessReverse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnext: Option<Vec<VNext<VlessUser>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<VMessSecurity>,
    /// `|`-joined experiment flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnext: Option<Vec<VNext<VmessUser>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardOutboundPeer {
    pub endpoint: String,
    pub public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_shared_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u32>,
    #[serde(rename = "allowedIPs", default, skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireguardOutboundSettings {
    pub secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<WireguardOutboundPeer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_kernel_tun: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_strategy: Option<DomainStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HysteriaOutboundSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub address: String,
    pub port: u16,
}

/// Protocol-specific outbound settings; the variant is the protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundSettings {
    Blackhole(BlackholeSettings),
    Dns(DnsOutboundSettings),
    Freedom(FreedomSettings),
    Loopback(LoopbackSettings),
    Http(HttpOutboundSettings),
    Shadowsocks(ShadowsocksOutboundSettings),
    Socks(SocksOutboundSettings),
    Vless(VlessOutboundSettings),
    Vmess(VmessOutboundSettings),
    Trojan(TrojanOutboundSettings),
    Wireguard(WireguardOutboundSettings),
    Hysteria(HysteriaOutboundSettings),
}

impl OutboundSettings {
    pub fn protocol(&self) -> OutboundProtocol {
        match self {
            Self::Blackhole(_) => OutboundProtocol::Blackhole,
            Self::Dns(_) => OutboundProtocol::Dns,
            Self::Freedom(_) => OutboundProtocol::Freedom,
            Self::Loopback(_) => OutboundProtocol::Loopback,
            Self::Http(_) => OutboundProtocol::Http,
            Self::Shadowsocks(_) => OutboundProtocol::Shadowsocks,
            Self::Socks(_) => OutboundProtocol::Socks,
            Self::Vless(_) => OutboundProtocol::Vless,
            Self::Vmess(_) => OutboundProtocol::Vmess,
            Self::Trojan(_) => OutboundProtocol::Trojan,
            Self::Wireguard(_) => OutboundProtocol::Wireguard,
            Self::Hysteria(_) => OutboundProtocol::Hysteria,
        }
    }

    /// Decode a `settings` node as the record registered for `protocol`.
    ///
    /// # Errors
    /// `MalformedDocument` when the node does not match that record.
    pub fn from_value(protocol: OutboundProtocol, value: Value) -> CodecResult<Self> {
        const PATH: &str = "$";
        Ok(match protocol {
            OutboundProtocol::Blackhole => Self::Blackhole(decode_node(value, PATH)?),
            OutboundProtocol::Dns => Self::Dns(decode_node(value, PATH)?),
            OutboundProtocol::Freedom => Self::Freedom(decode_node(value, PATH)?),
            OutboundProtocol::Loopback => Self::Loopback(decode_node(value, PATH)?),
            OutboundProtocol::Http => Self::Http(decode_node(value, PATH)?),
            OutboundProtocol::Shadowsocks => Self::Shadowsocks(decode_node(value, PATH)?),
            OutboundProtocol::Socks => Self::Socks(decode_node(value, PATH)?),
            OutboundProtocol::Vless => Self::Vless(decode_node(value, PATH)?),
            OutboundProtocol::Vmess => Self::Vmess(decode_node(value, PATH)?),
            OutboundProtocol::Trojan => Self::Trojan(decode_node(value, PATH)?),
            OutboundProtocol::Wireguard => Self::Wireguard(decode_node(value, PATH)?),
            OutboundProtocol::Hysteria => Self::Hysteria(decode_node(value, PATH)?),
        })
    }
}

impl Serialize for OutboundSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Blackhole(s) => s.serialize(serializer),
            Self::Dns(s) => s.serialize(serializer),
            Self::Freedom(s) => s.serialize(serializer),
            Self::Loopback(s) => s.serialize(serializer),
            Self::Http(s) => s.serialize(serializer),
            Self::Shadowsocks(s) => s.serialize(serializer),
            Self::Socks(s) => s.serialize(serializer),
            Self::Vless(s) => s.serialize(serializer),
            Self::Vmess(s) => s.serialize(serializer),
            Self::Trojan(s) => s.serialize(serializer),
            Self::Wireguard(s) => s.serialize(serializer),
            Self::Hysteria(s) => s.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "crate::de::is_false")]
    pub transport_layer: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mux {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xudp_concurrency: Option<i32>,
    /// `reject`, `allow` or `skip`.
    #[serde(rename = "xudpProxyUDP443", default, skip_serializing_if = "Option::is_none")]
    pub xudp_proxy_udp443: Option<String>,
}

/// One outbound endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub tag: Option<String>,
    pub send_through: Option<String>,
    pub settings: OutboundSettings,
    pub stream_settings: Option<StreamSettings>,
    pub proxy_settings: Option<ProxySettings>,
    pub mux: Option<Mux>,
    pub target_strategy: Option<DomainStrategy>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutboundCommon {
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    send_through: Option<String>,
    #[serde(default)]
    proxy_settings: Option<ProxySettings>,
    #[serde(default)]
    mux: Option<Mux>,
    #[serde(default)]
    target_strategy: Option<DomainStrategy>,
}

impl Outbound {
    pub fn new(tag: impl Into<String>, settings: OutboundSettings) -> Self {
        Self {
            tag: Some(tag.into()),
            send_through: None,
            settings,
            stream_settings: None,
            proxy_settings: None,
            mux: None,
            target_strategy: None,
        }
    }

    #[must_use]
    pub fn with_stream(mut self, stream: StreamSettings) -> Self {
        self.stream_settings = Some(stream);
        self
    }

    pub fn protocol(&self) -> OutboundProtocol {
        self.settings.protocol()
    }

    /// Decode one endpoint node.
    ///
    /// # Errors
    /// `UnsupportedProtocol` for an unregistered protocol tag,
    /// `MalformedDocument` for any other structural problem.
    pub fn from_value(value: Value) -> CodecResult<Self> {
        let Value::Object(mut map) = value else {
            return Err(CodecError::malformed_document("$", "endpoint must be an object"));
        };
        let protocol = read_protocol(&map)?;
        let protocol = OutboundProtocol::decode(&protocol)
            .map_err(|_| CodecError::unsupported_protocol(protocol))?;

        let settings = OutboundSettings::from_value(protocol, object_or_empty(map.remove("settings")))
            .map_err(|e| e.at("settings"))?;
        let stream_settings = match map.remove("streamSettings") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                StreamSettings::from_value(v).map_err(|e| e.at("streamSettings"))?,
            ),
        };
        map.remove("protocol");
        let common: OutboundCommon = decode_node(Value::Object(map), "$")?;

        Ok(Self {
            tag: common.tag,
            send_through: common.send_through,
            settings,
            stream_settings,
            proxy_settings: common.proxy_settings,
            mux: common.mux,
            target_strategy: common.target_strategy,
        })
    }
}

impl Serialize for Outbound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(send_through) = &self.send_through {
            map.serialize_entry("sendThrough", send_through)?;
        }
        map.serialize_entry("protocol", &self.protocol())?;
        map.serialize_entry("settings", &self.settings)?;
        if let Some(tag) = &self.tag {
            map.serialize_entry("tag", tag)?;
        }
        if let Some(stream) = &self.stream_settings {
            map.serialize_entry("streamSettings", stream)?;
        }
        if let Some(proxy) = &self.proxy_settings {
            map.serialize_entry("proxySettings", proxy)?;
        }
        if let Some(mux) = &self.mux {
            map.serialize_entry("mux", mux)?;
        }
        if let Some(strategy) = &self.target_strategy {
            map.serialize_entry("targetStrategy", strategy)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Outbound {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Outbound::from_value(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn freedom_without_settings() {
        let out = Outbound::from_value(json!({"protocol": "freedom", "tag": "direct"})).unwrap();
        assert_eq!(out.protocol(), OutboundProtocol::Freedom);
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"protocol":"freedom","settings":{},"tag":"direct"}"#
        );
    }

    #[test]
    fn direct_alias_maps_to_freedom() {
        let out = Outbound::from_value(json!({"protocol": "direct"})).unwrap();
        assert!(matches!(out.settings, OutboundSettings::Freedom(_)));
        assert!(out.tag.is_none());
    }

    #[test]
    fn vless_vnext_form() {
        let out = Outbound::from_value(json!({
            "protocol": "vless",
            "settings": {
                "vnext": [{
                    "address": "example.com",
                    "port": 443,
                    "users": [{"id": "uuid", "encryption": "none", "flow": "xtls-rprx-vision"}]
                }]
            },
            "streamSettings": {"network": "tcp", "security": "reality",
                "realitySettings": {"publicKey": "pk", "serverName": "example.com"}}
        }))
        .unwrap();
        let OutboundSettings::Vless(v) = &out.settings else {
            panic!("expected vless");
        };
        let vnext = v.vnext.as_ref().unwrap();
        assert_eq!(vnext[0].users[0].flow, Some(Flow::XtlsRprxVision));
        let stream = out.stream_settings.as_ref().unwrap();
        assert_eq!(stream.security.reality().unwrap().password.as_deref(), Some("pk"));
    }

    #[test]
    fn loopback_requires_inbound_tag() {
        let err = Outbound::from_value(json!({"protocol": "loopback", "settings": {}})).unwrap_err();
        assert!(matches!(err, CodecError::MalformedDocument { ref path, .. } if path == "settings"));
    }

    #[test]
    fn unknown_protocol() {
        let err = Outbound::from_value(json!({"protocol": "hysteria2"})).unwrap_err();
        assert_eq!(err, CodecError::unsupported_protocol("hysteria2"));
    }

    #[test]
    fn field_order_is_fixed() {
        let out = Outbound::from_value(json!({
            "targetStrategy": "UseIPv4",
            "mux": {"enabled": true, "concurrency": 8},
            "tag": "proxy",
            "settings": {"address": "1.2.3.4", "port": 1080},
            "protocol": "socks",
            "sendThrough": "0.0.0.0"
        }))
        .unwrap();
        assert_eq!(
            serde_json::to_string(&out).unwrap(),
            r#"{"sendThrough":"0.0.0.0","protocol":"socks","settings":{"address":"1.2.3.4","port":1080},"tag":"proxy","mux":{"enabled":true,"concurrency":8},"targetStrategy":"UseIPv4"}"#
        );
    }
}
