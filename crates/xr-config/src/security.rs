//! Security layer records: TLS and REALITY.
//! 安全层配置：TLS 与 REALITY。

use serde::{Deserialize, Serialize};

use crate::de::is_false;
use crate::defaults::default_reality_fingerprint;
use crate::enums::{CertificateUsage, Fingerprint};

/// `tlsSettings`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reject_unknown_sni: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_peer_cert_in_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_insecure: bool,
    /// Colon-separated cipher suite list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher_suites: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub certificates: Vec<TlsCertificate>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_system_root: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_session_resumption: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_peer_cert_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve_preferences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_key_log: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ech_config_list: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ech_server_keys: Option<String>,
    /// `none`, `half` or `full`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ech_force_query: Option<String>,
}

impl TlsSettings {
    /// ALPN list, empty when unset.
    pub fn alpn(&self) -> &[String] {
        self.alpn.as_deref().unwrap_or_default()
    }

    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Configured fingerprint, ignoring the empty token.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.fingerprint.filter(|fp| !fp.is_none())
    }
}

/// One certificate entry, given either as files or inline PEM lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsCertificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocsp_stapling: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CertificateUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_chain: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<String>>,
}

/// REALITY `target`: `"host:port"`, a unix socket path, or a bare port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RealityTarget {
    Port(u16),
    Address(String),
}

/// `realitySettings`. Server-side and client-side keys share one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    #[serde(default, alias = "dest", skip_serializing_if = "Option::is_none")]
    pub target: Option<RealityTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xver: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub server_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_client_ver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_client_ver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time_diff: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub short_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mldsa65_seed: Option<String>,

    // client side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    #[serde(default = "default_reality_fingerprint")]
    pub fingerprint: Fingerprint,
    /// X25519 public key of the server.
    #[serde(default, alias = "publicKey", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mldsa65_verify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spider_x: Option<String>,
}

impl Default for RealitySettings {
    fn default() -> Self {
        Self {
            show: None,
            target: None,
            xver: None,
            server_names: Vec::new(),
            private_key: None,
            min_client_ver: None,
            max_client_ver: None,
            max_time_diff: None,
            short_ids: Vec::new(),
            mldsa65_seed: None,
            server_name: None,
            fingerprint: default_reality_fingerprint(),
            password: None,
            mldsa65_verify: None,
            short_id: None,
            spider_x: None,
        }
    }
}

/// Active security layer, selected by `streamSettings.security`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Security {
    #[default]
    None,
    Tls(TlsSettings),
    Reality(RealitySettings),
}

impl Security {
    pub fn kind(&self) -> crate::enums::StreamSecurity {
        use crate::enums::StreamSecurity;
        match self {
            Self::None => StreamSecurity::None,
            Self::Tls(_) => StreamSecurity::Tls,
            Self::Reality(_) => StreamSecurity::Reality,
        }
    }

    pub fn tls(&self) -> Option<&TlsSettings> {
        match self {
            Self::Tls(t) => Some(t),
            _ => None,
        }
    }

    pub fn reality(&self) -> Option<&RealitySettings> {
        match self {
            Self::Reality(r) => Some(r),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reality_accepts_legacy_keys() {
        let r: RealitySettings = serde_json::from_value(json!({
            "dest": "example.com:443",
            "publicKey": "pk",
            "serverNames": ["example.com"],
            "shortIds": ["", "0123abcd"]
        }))
        .unwrap();
        assert_eq!(r.target, Some(RealityTarget::Address("example.com:443".into())));
        assert_eq!(r.password.as_deref(), Some("pk"));
        assert_eq!(r.fingerprint, Fingerprint::Chrome);

        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["target"], "example.com:443");
        assert_eq!(v["password"], "pk");
        assert!(v.get("dest").is_none());
    }

    #[test]
    fn reality_target_may_be_a_port() {
        let r: RealitySettings = serde_json::from_value(json!({"target": 8443})).unwrap();
        assert_eq!(r.target, Some(RealityTarget::Port(8443)));
    }

    #[test]
    fn tls_accessors_skip_empty_values() {
        let t: TlsSettings = serde_json::from_value(json!({
            "serverName": "",
            "fingerprint": "",
            "allowInsecure": true
        }))
        .unwrap();
        assert!(t.server_name().is_none());
        assert!(t.fingerprint().is_none());
        assert!(t.alpn().is_empty());
        assert!(t.allow_insecure);
    }

    #[test]
    fn security_kind() {
        assert_eq!(Security::default().kind(), crate::enums::StreamSecurity::None);
        let s = Security::Tls(TlsSettings::default());
        assert!(s.tls().is_some());
        assert!(s.reality().is_none());
    }
}
