//! `dns` section.
//! 内置 DNS 配置。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::de::{is_false, OneOrMany};
use crate::enums::DnsQueryStrategy;

/// Server entry: a bare address string or a full object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DnsServer {
    Address(String),
    Detailed(DnsServerConfig),
}

impl DnsServer {
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::Address(a) => Some(a),
            Self::Detailed(d) => d.address.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsServerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    #[serde(rename = "expectedIPs", default, skip_serializing_if = "Option::is_none")]
    pub expected_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub skip_fallback: bool,
    #[serde(rename = "clientIP", default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_strategy: Option<DnsQueryStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_cache: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub final_query: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsConfig {
    /// Static records; a value is one address or a list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<BTreeMap<String, OneOrMany<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<DnsServer>>,
    #[serde(rename = "clientIp", alias = "clientIP", default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_strategy: Option<DnsQueryStrategy>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_cache: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_fallback: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disable_fallback_if_match: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub use_system_hosts: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn servers_mix_strings_and_objects() {
        let dns: DnsConfig = serde_json::from_value(json!({
            "hosts": {"dns.google": ["8.8.8.8", "8.8.4.4"], "local": "127.0.0.1"},
            "servers": [
                "1.1.1.1",
                {"address": "223.5.5.5", "port": 53, "domains": ["geosite:cn"], "expectedIPs": ["geoip:cn"]}
            ],
            "queryStrategy": "UseIPv4"
        }))
        .unwrap();
        let servers = dns.servers.as_ref().unwrap();
        assert_eq!(servers[0].address(), Some("1.1.1.1"));
        assert_eq!(servers[1].address(), Some("223.5.5.5"));
        assert_eq!(dns.query_strategy, Some(DnsQueryStrategy::UseIpv4));

        let v = serde_json::to_value(&dns).unwrap();
        assert_eq!(v["hosts"]["local"], "127.0.0.1");
        assert_eq!(v["servers"][0], "1.1.1.1");
        assert_eq!(v["servers"][1]["expectedIPs"][0], "geoip:cn");
    }
}
