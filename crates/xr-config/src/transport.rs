//! Transport settings records, one per `streamSettings.network` variant.
//! 传输层配置：raw / mKCP / WebSocket / gRPC / HTTPUpgrade / XHTTP。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::de::{is_false, OneOrMany, ScalarValue};
use crate::enums::{HeadersType, KcpHeaderType, XHttpMode};

/// Header map whose values are a single string or a list of strings.
///
/// Keys are kept sorted; lookups by name are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HttpHeaders(pub BTreeMap<String, OneOrMany<String>>);

impl HttpHeaders {
    pub fn get(&self, name: &str) -> Option<&OneOrMany<String>> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First `Host` value, in any casing.
    pub fn host(&self) -> Option<&str> {
        self.get("host").and_then(OneOrMany::first).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OneOrMany<String>>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<OneOrMany<String>>> FromIterator<(K, V)> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `rawSettings` (historically `tcpSettings`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSettings {
    #[serde(default, skip_serializing_if = "is_false")]
    pub accept_proxy_protocol: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<RawHeader>,
}

impl RawSettings {
    /// Header block when it selects HTTP obfuscation.
    pub fn http_header(&self) -> Option<&RawHeader> {
        self.header.as_ref().filter(|h| h.r#type == HeadersType::Http)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHeader {
    #[serde(default)]
    pub r#type: HeadersType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<HttpRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
}

impl RawHeader {
    /// First request path, if any.
    pub fn request_path(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.path.as_ref())
            .and_then(|p| p.first())
            .map(String::as_str)
    }

    pub fn request_host(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.headers.as_ref())
            .and_then(HttpHeaders::host)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HttpHeaders>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HttpHeaders>,
}

/// `kcpSettings`. Unset numeric fields fall back to engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KcpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tti: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downlink_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub congestion: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_buffer_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_buffer_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<KcpHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

impl KcpSettings {
    pub fn header_type(&self) -> KcpHeaderType {
        self.header.as_ref().map(|h| h.r#type).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KcpHeader {
    #[serde(default)]
    pub r#type: KcpHeaderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

/// `wsSettings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_proxy_protocol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HttpHeaders>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_period: Option<u32>,
}

impl WsSettings {
    /// `host`, falling back to the `Host` header.
    pub fn effective_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.headers.as_ref().and_then(HttpHeaders::host))
    }
}

/// `grpcSettings`. Several keys are snake_case on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrpcSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(rename = "serviceName", default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(rename = "multiMode", default, skip_serializing_if = "is_false")]
    pub multi_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub permit_without_stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_windows_size: Option<i32>,
}

/// `httpupgradeSettings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpUpgradeSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_proxy_protocol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HttpHeaders>,
}

impl HttpUpgradeSettings {
    pub fn effective_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.headers.as_ref().and_then(HttpHeaders::host))
    }
}

/// `xhttpSettings` (historically `splithttpSettings`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XHttpSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default)]
    pub mode: XHttpMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<XHttpExtra>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HttpHeaders>,
}

impl XHttpSettings {
    pub fn effective_host(&self) -> Option<&str> {
        self.host
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.headers.as_ref().and_then(HttpHeaders::host))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XHttpExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_padding_bytes: Option<ScalarValue>,
    #[serde(rename = "noGRPCHeader", default, skip_serializing_if = "Option::is_none")]
    pub no_grpc_header: Option<bool>,
    #[serde(rename = "noSSEHeader", default, skip_serializing_if = "Option::is_none")]
    pub no_sse_header: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc_max_each_post_bytes: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc_min_posts_interval_ms: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc_max_buffered_posts: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sc_stream_up_server_secs: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xmux: Option<XMux>,
    /// Separate downlink stream block; kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XMux {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_max_reuse_times: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_max_request_times: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_max_reusable_secs: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h_keep_alive_period: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn header_host_is_case_insensitive() {
        let h: HttpHeaders = serde_json::from_value(json!({
            "HOST": ["a.example", "b.example"],
            "User-Agent": "curl"
        }))
        .unwrap();
        assert_eq!(h.host(), Some("a.example"));
        assert!(h.get("user-agent").is_some());
    }

    #[test]
    fn raw_http_header_accessors() {
        let raw: RawSettings = serde_json::from_value(json!({
            "header": {
                "type": "http",
                "request": { "path": ["/test", "/other"], "headers": { "Host": "x.com" } }
            }
        }))
        .unwrap();
        let header = raw.http_header().unwrap();
        assert_eq!(header.request_path(), Some("/test"));
        assert_eq!(header.request_host(), Some("x.com"));

        let plain = RawSettings::default();
        assert!(plain.http_header().is_none());
    }

    #[test]
    fn grpc_keeps_snake_case_keys() {
        let g = GrpcSettings {
            service_name: Some("svc".into()),
            multi_mode: true,
            idle_timeout: Some(60),
            ..GrpcSettings::default()
        };
        let v = serde_json::to_value(&g).unwrap();
        assert_eq!(v, json!({"serviceName": "svc", "multiMode": true, "idle_timeout": 60}));
    }

    #[test]
    fn ws_host_falls_back_to_header() {
        let ws = WsSettings {
            headers: Some([("Host", "cdn.example".to_string())].into_iter().collect()),
            ..WsSettings::default()
        };
        assert_eq!(ws.effective_host(), Some("cdn.example"));
    }

    #[test]
    fn xhttp_mode_defaults_to_auto() {
        let x: XHttpSettings = serde_json::from_value(json!({"path": "/x"})).unwrap();
        assert_eq!(x.mode, XHttpMode::Auto);
        let x: XHttpSettings = serde_json::from_value(json!({"mode": "packet-up"})).unwrap();
        assert_eq!(serde_json::to_value(&x).unwrap(), json!({"mode": "packet-up"}));
    }
}
