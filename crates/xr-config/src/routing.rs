//! `routing` section: rules and balancers.
//! 路由规则与负载均衡配置。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::alias::comma_list;
use crate::de::ScalarValue;
use crate::enums::{
    BalancerStrategyType, NetProtocol, RoutingDomainStrategy, RoutingRuleType, TransportProtocol,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_strategy: Option<RoutingDomainStrategy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RoutingRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub balancers: Vec<Balancer>,
}

impl RoutingConfig {
    pub fn balancer(&self, tag: &str) -> Option<&Balancer> {
        self.balancers.iter().find(|b| b.tag == tag)
    }
}

/// One routing rule. All present conditions must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    #[serde(default)]
    pub r#type: RoutingRuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<Vec<String>>,
    /// `"53,443,1000-2000"` or a bare number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<ScalarValue>,
    #[serde(default, with = "comma_list", skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<TransportProtocol>>,
    #[serde(rename = "sourceIP", alias = "source", default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<Vec<String>>,
    #[serde(rename = "localIP", default, skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vless_route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbound_tag: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Vec<NetProtocol>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbound_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balancer_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balancer {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<BalancerStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerStrategy {
    #[serde(default)]
    pub r#type: BalancerStrategyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<BalancerStrategySettings>,
}

/// `leastLoad` tuning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancerStrategySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<u32>,
    #[serde(rename = "maxRTT", default, skip_serializing_if = "Option::is_none")]
    pub max_rtt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baselines: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costs: Option<Vec<BalancerCost>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerCost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regexp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#match: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_conditions() {
        let r: RoutingConfig = serde_json::from_value(json!({
            "domainStrategy": "IPIfNonMatch",
            "rules": [
                {"domain": ["geosite:cn"], "outboundTag": "direct"},
                {"type": "field", "port": 53, "network": "udp", "protocol": ["bittorrent"], "outboundTag": "block"}
            ],
            "balancers": [{"tag": "b", "selector": ["proxy-"], "strategy": {"type": "leastPing"}}]
        }))
        .unwrap();
        assert_eq!(r.domain_strategy, Some(RoutingDomainStrategy::IpIfNonMatch));
        assert_eq!(r.rules[0].r#type, RoutingRuleType::Field);
        assert_eq!(r.rules[1].port, Some(ScalarValue::Number(53)));
        assert_eq!(r.rules[1].network, Some(vec![TransportProtocol::Udp]));
        assert_eq!(
            r.balancer("b").and_then(|b| b.strategy.as_ref()).map(|s| s.r#type),
            Some(BalancerStrategyType::LeastPing)
        );

        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["rules"][0], json!({"type": "field", "domain": ["geosite:cn"], "outboundTag": "direct"}));
        assert_eq!(v["rules"][1]["network"], "udp");
    }
}
