//! Ancillary top-level sections: log, api, policy, stats, observatories.
//! 其余顶层配置段。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::de::is_false;
use crate::enums::LogLevel;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loglevel: Option<LogLevel>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dns_log: bool,
    /// `quarter`, `half`, `full` or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask_address: Option<String>,
}

/// Engine version bounds this document accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    /// e.g. `HandlerService`, `StatsService`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseEndpoint {
    pub tag: String,
    pub domain: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReverseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridges: Option<Vec<ReverseEndpoint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portals: Option<Vec<ReverseEndpoint>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FakeDnsPool {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_pool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservatoryConfig {
    #[serde(default)]
    pub subject_selector: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_url: Option<String>,
    /// Duration string such as `10s`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_interval: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub enable_concurrency: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingConfig {
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurstObservatoryConfig {
    #[serde(default)]
    pub subject_selector: Vec<String>,
    pub ping_config: PingConfig,
}

/// Per user level limits. Durations are seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handshake: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conn_idle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink_only: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downlink_only: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_user_uplink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_user_downlink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_user_online: Option<bool>,
    /// KiB; `-1` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_inbound_uplink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_inbound_downlink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_outbound_uplink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_outbound_downlink: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Keyed by the level number as a string (`"0"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<BTreeMap<String, LevelPolicy>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemPolicy>,
}

impl PolicyConfig {
    pub fn level(&self, level: u32) -> Option<&LevelPolicy> {
        self.levels.as_ref()?.get(&level.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn policy_levels_by_number() {
        let p: PolicyConfig = serde_json::from_value(json!({
            "levels": {"0": {"handshake": 4, "statsUserUplink": true}},
            "system": {"statsInboundDownlink": true}
        }))
        .unwrap();
        assert_eq!(p.level(0).and_then(|l| l.handshake), Some(4));
        assert!(p.level(1).is_none());
    }

    #[test]
    fn log_level_uses_alias_codec() {
        let l: LogConfig = serde_json::from_value(json!({"loglevel": "Warning", "dnsLog": true})).unwrap();
        assert_eq!(l.loglevel, Some(LogLevel::Warning));
        assert_eq!(
            serde_json::to_value(&l).unwrap(),
            json!({"loglevel": "warning", "dnsLog": true})
        );
    }

    #[test]
    fn burst_observatory_requires_destination() {
        assert!(serde_json::from_value::<BurstObservatoryConfig>(json!({
            "subjectSelector": ["a"],
            "pingConfig": {}
        }))
        .is_err());
    }
}
