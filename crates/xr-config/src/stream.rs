//! `streamSettings`: one active transport, one active security layer.
//! 传输与安全层组合配置。
//!
//! On the wire the block is flat: a `network` discriminator, a `security`
//! discriminator and one settings key per variant. In memory exactly one
//! transport and one security record exist, so an inactive `wsSettings` next to
//! `"network": "grpc"` is dropped on decode.

use serde::de::{DeserializeOwned, Error as DeError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;
use xr_types::{CodecError, CodecResult};

use crate::alias::WireEnum;
use crate::de::{decode_node, is_false, ScalarValue};
use crate::enums::{
    AddressPortStrategy, DomainStrategy, OperatingSystem, StreamNetwork, StreamSecurity,
    TProxy, TcpCongestion,
};
use crate::security::{RealitySettings, Security, TlsSettings};
use crate::transport::{
    GrpcSettings, HttpUpgradeSettings, KcpSettings, RawSettings, WsSettings, XHttpSettings,
};

/// Active transport, selected by `streamSettings.network`.
#[derive(Debug, Clone, PartialEq)]
pub enum Transport {
    Raw(RawSettings),
    Kcp(KcpSettings),
    Ws(WsSettings),
    Grpc(GrpcSettings),
    HttpUpgrade(HttpUpgradeSettings),
    XHttp(XHttpSettings),
}

impl Default for Transport {
    fn default() -> Self {
        Self::Raw(RawSettings::default())
    }
}

impl Transport {
    pub fn network(&self) -> StreamNetwork {
        match self {
            Self::Raw(_) => StreamNetwork::Raw,
            Self::Kcp(_) => StreamNetwork::Kcp,
            Self::Ws(_) => StreamNetwork::Ws,
            Self::Grpc(_) => StreamNetwork::Grpc,
            Self::HttpUpgrade(_) => StreamNetwork::HttpUpgrade,
            Self::XHttp(_) => StreamNetwork::XHttp,
        }
    }

    /// Document key holding this variant's settings.
    pub fn settings_key(&self) -> &'static str {
        match self {
            Self::Raw(_) => "rawSettings",
            Self::Kcp(_) => "kcpSettings",
            Self::Ws(_) => "wsSettings",
            Self::Grpc(_) => "grpcSettings",
            Self::HttpUpgrade(_) => "httpupgradeSettings",
            Self::XHttp(_) => "xhttpSettings",
        }
    }

    fn is_default_settings(&self) -> bool {
        match self {
            Self::Raw(s) => *s == RawSettings::default(),
            Self::Kcp(s) => *s == KcpSettings::default(),
            Self::Ws(s) => *s == WsSettings::default(),
            Self::Grpc(s) => *s == GrpcSettings::default(),
            Self::HttpUpgrade(s) => *s == HttpUpgradeSettings::default(),
            Self::XHttp(s) => *s == XHttpSettings::default(),
        }
    }

    fn serialize_settings<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        let key = self.settings_key();
        match self {
            Self::Raw(s) => map.serialize_entry(key, s),
            Self::Kcp(s) => map.serialize_entry(key, s),
            Self::Ws(s) => map.serialize_entry(key, s),
            Self::Grpc(s) => map.serialize_entry(key, s),
            Self::HttpUpgrade(s) => map.serialize_entry(key, s),
            Self::XHttp(s) => map.serialize_entry(key, s),
        }
    }
}

/// Socket options applied to the connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sockopt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_max_seg: Option<ScalarValue>,
    /// `true`/`false` or a queue length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_fast_open: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_strategy: Option<DomainStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tproxy: Option<TProxy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub happy_eyeballs: Option<HappyEyeballs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialer_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub accept_proxy_protocol: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_keep_alive_idle: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_keep_alive_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_user_timeout: Option<i64>,
    #[serde(rename = "tcpcongestion", default, skip_serializing_if = "Option::is_none")]
    pub tcp_congestion: Option<TcpCongestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tcp_mptcp: bool,
    #[serde(rename = "V6Only", default, skip_serializing_if = "Option::is_none")]
    pub v6_only: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tcp_no_delay: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp_window_clamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_port_strategy: Option<AddressPortStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_sockopt: Option<Vec<CustomSockopt>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HappyEyeballs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub try_delay_ms: Option<u64>,
    #[serde(rename = "prioritizeIPv6", default, skip_serializing_if = "Option::is_none")]
    pub prioritize_ipv6: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interleave: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_try: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomSockopt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<OperatingSystem>,
    /// `int` or `str`.
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// `streamSettings` of an endpoint, also the top-level `transport` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamSettings {
    pub transport: Transport,
    pub security: Security,
    pub sockopt: Option<Sockopt>,
}

impl StreamSettings {
    pub fn new(transport: Transport, security: Security) -> Self {
        Self {
            transport,
            security,
            sockopt: None,
        }
    }

    pub fn network(&self) -> StreamNetwork {
        self.transport.network()
    }

    pub fn security_kind(&self) -> StreamSecurity {
        self.security.kind()
    }

    /// Decode a `streamSettings` node.
    ///
    /// # Errors
    /// `UnknownEnumToken` for a bad `network` or `security` token,
    /// `MalformedDocument` naming the offending block otherwise.
    pub fn from_value(value: Value) -> CodecResult<Self> {
        let Value::Object(map) = value else {
            return Err(CodecError::malformed_document("$", "stream settings must be an object"));
        };
        StreamWire::from_map(map).map(StreamWire::into_settings)
    }
}

impl Serialize for StreamSettings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("network", &self.network())?;
        map.serialize_entry("security", &self.security_kind())?;
        match &self.security {
            Security::None => {}
            Security::Tls(tls) => map.serialize_entry("tlsSettings", tls)?,
            Security::Reality(reality) => map.serialize_entry("realitySettings", reality)?,
        }
        if !self.transport.is_default_settings() {
            self.transport.serialize_settings(&mut map)?;
        }
        if let Some(sockopt) = &self.sockopt {
            map.serialize_entry("sockopt", sockopt)?;
        }
        map.end()
    }
}

/// Blocks of a `streamSettings` node, each decoded on its own.
struct StreamWire {
    network: StreamNetwork,
    security: StreamSecurity,
    tls_settings: Option<TlsSettings>,
    reality_settings: Option<RealitySettings>,
    raw_settings: Option<RawSettings>,
    kcp_settings: Option<KcpSettings>,
    ws_settings: Option<WsSettings>,
    grpc_settings: Option<GrpcSettings>,
    http_upgrade_settings: Option<HttpUpgradeSettings>,
    xhttp_settings: Option<XHttpSettings>,
    sockopt: Option<Sockopt>,
}

/// Read a discriminator through the alias codec so a bad token keeps its type.
fn discriminator<T: WireEnum>(map: &mut Map<String, Value>, key: &str) -> CodecResult<Option<T>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(token)) => T::decode(&token).map(Some),
        Some(other) => Err(CodecError::malformed_document(
            key,
            format!("expected a string, found {other}"),
        )),
    }
}

/// First present key wins; later names are legacy aliases.
fn block<T: DeserializeOwned>(map: &mut Map<String, Value>, keys: &[&str]) -> CodecResult<Option<T>> {
    for key in keys {
        match map.remove(*key) {
            None | Some(Value::Null) => {}
            Some(v) => return decode_node(v, key).map(Some),
        }
    }
    Ok(None)
}

impl StreamWire {
    fn from_map(mut map: Map<String, Value>) -> CodecResult<Self> {
        Ok(Self {
            network: discriminator(&mut map, "network")?.unwrap_or(StreamNetwork::Raw),
            security: discriminator(&mut map, "security")?.unwrap_or(StreamSecurity::None),
            tls_settings: block(&mut map, &["tlsSettings"])?,
            reality_settings: block(&mut map, &["realitySettings"])?,
            raw_settings: block(&mut map, &["rawSettings", "tcpSettings"])?,
            kcp_settings: block(&mut map, &["kcpSettings"])?,
            ws_settings: block(&mut map, &["wsSettings"])?,
            grpc_settings: block(&mut map, &["grpcSettings"])?,
            http_upgrade_settings: block(&mut map, &["httpupgradeSettings"])?,
            xhttp_settings: block(&mut map, &["xhttpSettings", "splithttpSettings"])?,
            sockopt: block(&mut map, &["sockopt"])?,
        })
    }

    fn into_settings(self) -> StreamSettings {
        let network = self.network;
        let inactive = [
            (self.raw_settings.is_some(), StreamNetwork::Raw),
            (self.kcp_settings.is_some(), StreamNetwork::Kcp),
            (self.ws_settings.is_some(), StreamNetwork::Ws),
            (self.grpc_settings.is_some(), StreamNetwork::Grpc),
            (self.http_upgrade_settings.is_some(), StreamNetwork::HttpUpgrade),
            (self.xhttp_settings.is_some(), StreamNetwork::XHttp),
        ];
        for (present, other) in inactive {
            if present && other != network {
                trace!(network = %network, ignored = %other, "inactive transport settings dropped");
            }
        }

        let transport = match network {
            StreamNetwork::Raw => Transport::Raw(self.raw_settings.unwrap_or_default()),
            StreamNetwork::Kcp => Transport::Kcp(self.kcp_settings.unwrap_or_default()),
            StreamNetwork::Ws => Transport::Ws(self.ws_settings.unwrap_or_default()),
            StreamNetwork::Grpc => Transport::Grpc(self.grpc_settings.unwrap_or_default()),
            StreamNetwork::HttpUpgrade => {
                Transport::HttpUpgrade(self.http_upgrade_settings.unwrap_or_default())
            }
            StreamNetwork::XHttp => Transport::XHttp(self.xhttp_settings.unwrap_or_default()),
        };
        let security = match self.security {
            StreamSecurity::None => Security::None,
            StreamSecurity::Tls => Security::Tls(self.tls_settings.unwrap_or_default()),
            StreamSecurity::Reality => Security::Reality(self.reality_settings.unwrap_or_default()),
        };
        StreamSettings {
            transport,
            security,
            sockopt: self.sockopt,
        }
    }
}

impl<'de> Deserialize<'de> for StreamSettings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_value(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}
