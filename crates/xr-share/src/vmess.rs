//! `vmess://` links: a base64-encoded JSON object with a fixed legacy field set.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use xr_config::enums::HeadersType;
use xr_config::{StreamSettings, Transport, WireEnum};
use xr_types::{CodecError, CodecResult};

use crate::defaults::{
    default_vmess_aid, default_vmess_none, default_vmess_version, GRPC_MULTI_MODE, VMESS_NONE,
};
use crate::query::LinkParams;
use crate::scheme::LinkScheme;
use crate::uri::decode_base64;

/// VMess link payload. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmessLink {
    pub add: String,
    #[serde(deserialize_with = "port_number")]
    pub port: u16,
    #[serde(default = "default_vmess_version", deserialize_with = "text")]
    pub v: String,
    #[serde(rename = "allowInsecure", default, deserialize_with = "flag")]
    pub allow_insecure: bool,
    #[serde(default)]
    pub fp: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    /// Client cipher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scy: Option<String>,
    /// Display name.
    #[serde(default)]
    pub ps: String,
    #[serde(default)]
    pub path: String,
    #[serde(default = "default_vmess_none")]
    pub tls: String,
    #[serde(default)]
    pub net: String,
    /// Header type; `multi` for gRPC multi mode.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_vmess_aid", deserialize_with = "text")]
    pub aid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

impl VmessLink {
    /// Project an endpoint's stream onto the payload.
    pub fn new(
        address: impl Into<String>,
        port: u16,
        id: impl Into<String>,
        remark: impl Into<String>,
        stream: &StreamSettings,
    ) -> Self {
        let mut link = Self {
            add: address.into(),
            port,
            v: default_vmess_version(),
            allow_insecure: false,
            fp: String::new(),
            id: id.into(),
            alpn: None,
            sni: None,
            scy: None,
            ps: remark.into(),
            path: String::new(),
            tls: stream.security_kind().token().to_string(),
            net: stream.network().token().to_string(),
            kind: VMESS_NONE.to_string(),
            host: String::new(),
            aid: default_vmess_aid(),
            authority: None,
            mode: None,
        };

        match &stream.transport {
            Transport::Raw(raw) => {
                if let Some(header) = &raw.header {
                    link.kind = header.r#type.token().to_string();
                    if header.r#type == HeadersType::Http {
                        link.path = header.request_path().unwrap_or_default().to_string();
                        link.host = header.request_host().unwrap_or_default().to_string();
                    }
                }
            }
            Transport::Kcp(kcp) => {
                link.path = kcp.seed.clone().unwrap_or_default();
                link.kind = kcp.header_type().token().to_string();
            }
            Transport::Ws(ws) => {
                link.path = ws.path.clone().unwrap_or_default();
                link.host = ws.effective_host().unwrap_or_default().to_string();
            }
            Transport::Grpc(grpc) => {
                link.path = grpc.service_name.clone().unwrap_or_default();
                link.authority = Some(grpc.authority.clone().unwrap_or_default());
                if grpc.multi_mode {
                    link.kind = GRPC_MULTI_MODE.to_string();
                }
            }
            Transport::HttpUpgrade(upgrade) => {
                link.path = upgrade.path.clone().unwrap_or_default();
                link.host = upgrade.effective_host().unwrap_or_default().to_string();
            }
            Transport::XHttp(xhttp) => {
                link.path = xhttp.path.clone().unwrap_or_default();
                link.host = xhttp.effective_host().unwrap_or_default().to_string();
                link.mode = Some(xhttp.mode.token().to_string());
            }
        }

        if let Some(tls) = stream.security.tls() {
            if !tls.alpn().is_empty() {
                link.alpn = Some(tls.alpn().join(","));
            }
            link.sni = tls.server_name().map(String::from);
            if let Some(fp) = tls.fingerprint() {
                link.fp = fp.token().to_string();
            }
            link.allow_insecure = tls.allow_insecure;
        }
        link
    }

    /// `vmess://` + base64 of the compact JSON.
    ///
    /// # Errors
    /// `MalformedShareLink` if the payload cannot be serialized.
    pub fn to_link(&self) -> CodecResult<String> {
        let json = serde_json::to_string(self)
            .map_err(|e| CodecError::malformed_link("payload", e.to_string()))?;
        Ok(format!("{}{}", LinkScheme::Vmess.prefix(), STANDARD.encode(json)))
    }

    /// Parse the part after `vmess://`.
    ///
    /// # Errors
    /// `MalformedShareLink` when the payload is not base64 or not the expected JSON.
    pub fn parse(payload: &str) -> CodecResult<Self> {
        let bytes = decode_base64(payload)
            .ok_or_else(|| CodecError::malformed_link(payload, "payload is not base64"))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CodecError::malformed_link("payload", e.to_string()))
    }

    /// Same information in URI-parameter form, so stream decoding is shared.
    pub(crate) fn to_params(&self) -> LinkParams {
        let non_empty = |s: &str| Some(s.to_string()).filter(|s| !s.is_empty());
        let mut params = LinkParams {
            r#type: non_empty(&self.net),
            security: non_empty(&self.tls),
            host: non_empty(&self.host),
            authority: self.authority.clone(),
            sni: self.sni.clone(),
            alpn: self.alpn.clone(),
            fp: non_empty(&self.fp),
            allow_insecure: self.allow_insecure.then(|| "1".to_string()),
            ..LinkParams::default()
        };
        match self.net.to_ascii_lowercase().as_str() {
            "grpc" => {
                params.service_name = non_empty(&self.path);
                params.mode = non_empty(&self.kind);
            }
            "kcp" | "mkcp" => {
                params.seed = non_empty(&self.path);
                params.header_type = non_empty(&self.kind);
            }
            _ => {
                params.path = non_empty(&self.path);
                params.header_type = non_empty(&self.kind);
                params.mode = self.mode.clone();
            }
        }
        params
    }
}

fn port_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => u16::try_from(n).map_err(de::Error::custom),
        NumberOrText::Text(s) => s.trim().parse().map_err(de::Error::custom),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s,
    })
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Number(u64),
        Text(String),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Number(n) => n != 0,
        Raw::Text(s) => matches!(s.as_str(), "1" | "true"),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;
    use serde_json::json;

    #[test]
    fn field_order_is_fixed() {
        let link = VmessLink::new("1.2.3.4", 443, "id", "node", &StreamSettings::default());
        assert_eq!(
            serde_json::to_string(&link).unwrap(),
            r#"{"add":"1.2.3.4","port":443,"v":"2","allowInsecure":false,"fp":"","id":"id","ps":"node","path":"","tls":"none","net":"raw","type":"none","host":"","aid":"0"}"#
        );
    }

    #[test]
    fn loose_payloads_are_accepted() {
        let payload = json!({
            "add": "a.example", "port": "8443", "v": 2, "id": "u",
            "aid": 0, "net": "ws", "path": "/v", "allowInsecure": "1", "ps": "n"
        });
        let encoded = URL_SAFE_NO_PAD.encode(payload.to_string());
        let link = VmessLink::parse(&encoded).unwrap();
        assert_eq!(link.port, 8443);
        assert_eq!(link.v, "2");
        assert_eq!(link.aid, "0");
        assert!(link.allow_insecure);
        assert_eq!(link.tls, "none");
    }

    #[test]
    fn garbage_payload_is_malformed() {
        assert!(matches!(
            VmessLink::parse("!!!"),
            Err(CodecError::MalformedShareLink { .. })
        ));
        let not_json = STANDARD.encode("not json");
        assert!(matches!(
            VmessLink::parse(&not_json),
            Err(CodecError::MalformedShareLink { ref segment, .. }) if segment == "payload"
        ));
    }
}
