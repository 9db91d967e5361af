//! Typed Xray configuration model and document codec.
//! Xray 配置模型与文档编解码。
//!
//! # Layout / 结构
//! - [`alias`], [`enums`]: wire tokens ⟷ enum values, with historical aliases.
//!   枚举别名表。
//! - [`port`]: literal, range or `env:NAME` ports. 端口取值。
//! - [`transport`], [`security`], [`stream`]: `streamSettings` records.
//!   传输与安全层配置。
//! - [`inbound`], [`outbound`]: endpoints as closed unions keyed by protocol.
//!   入站/出站协议分派。
//! - [`Config`]: the whole document, encoded in a fixed field order.
//!   顶层文档，固定字段顺序输出。
//!
//! Decoding and encoding are pure; the only I/O entry point is [`load_path`].

use anyhow::Context;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use xr_types::{CodecError, CodecResult};

pub mod alias;
pub mod de;
pub mod defaults;
pub mod dns;
pub mod enums;
pub mod inbound;
pub mod json_norm;
pub mod outbound;
pub mod port;
pub mod routing;
pub mod sections;
pub mod security;
pub mod stream;
pub mod transport;

pub use alias::WireEnum;
pub use inbound::{ClientRef, Inbound, InboundSettings};
pub use outbound::{Outbound, OutboundSettings};
pub use port::Port;
pub use security::Security;
pub use stream::{StreamSettings, Transport};

use de::{decode_node, OneOrMany};
use dns::DnsConfig;
use routing::RoutingConfig;
use sections::{
    ApiConfig, BurstObservatoryConfig, FakeDnsPool, LogConfig, MetricsConfig, ObservatoryConfig,
    PolicyConfig, ReverseConfig, StatsConfig, VersionConfig,
};

/// Top-level configuration document.
///
/// Serialization order is fixed: `log, version, api, dns, routing, policy,
/// inbounds, outbounds, transport, stats, reverse, fakedns, metrics,
/// observatory, burstObservatory`. Absent sections are omitted; the two
/// endpoint lists are always written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<DnsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
    /// Global stream defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<StreamSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse: Option<ReverseConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fakedns: Option<OneOrMany<FakeDnsPool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observatory: Option<ObservatoryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub burst_observatory: Option<BurstObservatoryConfig>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Lenient,
}

impl Config {
    /// Decode a document. The first failing endpoint aborts decoding.
    ///
    /// # Errors
    /// The endpoint's `UnsupportedProtocol`/`InvalidPortFormat`, or
    /// `MalformedDocument` with the field path (`inbounds[2].settings`).
    pub fn from_value(value: Value) -> CodecResult<Self> {
        Self::decode(value, Mode::Strict).map(|(cfg, _)| cfg)
    }

    /// Decode a document, skipping endpoints that fail. Skipped errors are
    /// returned alongside the config. Broken ancillary sections still fail.
    ///
    /// # Errors
    /// `MalformedDocument` when the document or a non-endpoint section is malformed.
    pub fn from_value_lenient(value: Value) -> CodecResult<(Self, Vec<CodecError>)> {
        Self::decode(value, Mode::Lenient)
    }

    /// # Errors
    /// See [`Config::from_value`]; invalid JSON is `MalformedDocument` at `$`.
    pub fn from_json_str(text: &str) -> CodecResult<Self> {
        Self::from_value(parse_json(text)?)
    }

    /// # Errors
    /// See [`Config::from_value_lenient`].
    pub fn from_json_str_lenient(text: &str) -> CodecResult<(Self, Vec<CodecError>)> {
        Self::from_value_lenient(parse_json(text)?)
    }

    /// # Errors
    /// See [`Config::from_value`]; invalid YAML is `MalformedDocument` at `$`.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(text: &str) -> CodecResult<Self> {
        let value: Value = serde_yaml::from_str(text)
            .map_err(|e| CodecError::malformed_document("$", e.to_string()))?;
        Self::from_value(value)
    }

    /// # Errors
    /// Serialization failure; not expected for documents built by this crate.
    pub fn to_json_string(&self) -> CodecResult<String> {
        serde_json::to_string(self).map_err(|e| CodecError::malformed_document("$", e.to_string()))
    }

    /// # Errors
    /// See [`Config::to_json_string`].
    pub fn to_json_string_pretty(&self) -> CodecResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CodecError::malformed_document("$", e.to_string()))
    }

    pub fn inbound(&self, tag: &str) -> Option<&Inbound> {
        self.inbounds.iter().find(|i| i.tag == tag)
    }

    pub fn outbound(&self, tag: &str) -> Option<&Outbound> {
        self.outbounds.iter().find(|o| o.tag.as_deref() == Some(tag))
    }

    fn decode(value: Value, mode: Mode) -> CodecResult<(Self, Vec<CodecError>)> {
        let Value::Object(mut map) = value else {
            return Err(CodecError::malformed_document("$", "document must be an object"));
        };
        let mut skipped = Vec::new();
        let inbounds = decode_endpoints(
            map.remove("inbounds"),
            "inbounds",
            Inbound::from_value,
            mode,
            &mut skipped,
        )?;
        let outbounds = decode_endpoints(
            map.remove("outbounds"),
            "outbounds",
            Outbound::from_value,
            mode,
            &mut skipped,
        )?;

        let cfg = Self {
            log: section(&mut map, "log")?,
            version: section(&mut map, "version")?,
            api: section(&mut map, "api")?,
            dns: section(&mut map, "dns")?,
            routing: section(&mut map, "routing")?,
            policy: section(&mut map, "policy")?,
            inbounds,
            outbounds,
            transport: map
                .remove("transport")
                .filter(|v| !v.is_null())
                .map(|v| StreamSettings::from_value(v).map_err(|e| e.at("transport")))
                .transpose()?,
            stats: section(&mut map, "stats")?,
            reverse: section(&mut map, "reverse")?,
            fakedns: section(&mut map, "fakedns")?,
            metrics: section(&mut map, "metrics")?,
            observatory: section(&mut map, "observatory")?,
            burst_observatory: section(&mut map, "burstObservatory")?,
        };
        if !map.is_empty() {
            debug!(keys = ?map.keys().collect::<Vec<_>>(), "ignoring unknown top-level fields");
        }
        Ok((cfg, skipped))
    }
}

fn parse_json(text: &str) -> CodecResult<Value> {
    serde_json::from_str(text).map_err(|e| CodecError::malformed_document("$", e.to_string()))
}

fn section<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> CodecResult<Option<T>> {
    match map.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => decode_node(v, key).map(Some),
    }
}

fn decode_endpoints<T>(
    node: Option<Value>,
    key: &str,
    decode: fn(Value) -> CodecResult<T>,
    mode: Mode,
    skipped: &mut Vec<CodecError>,
) -> CodecResult<Vec<T>> {
    let items = match node {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(CodecError::malformed_document(key, "expected an array")),
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match decode(item) {
            Ok(endpoint) => out.push(endpoint),
            Err(err) => {
                let err = err.at(&format!("{key}[{idx}]"));
                if mode == Mode::Strict {
                    return Err(err);
                }
                warn!(section = key, index = idx, error = %err, "skipping endpoint");
                skipped.push(err);
            }
        }
    }
    Ok(out)
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Config::from_value(value).map_err(D::Error::custom)
    }
}

/// Load a `.json`, `.yaml` or `.yml` document from disk.
///
/// # Errors
/// The file cannot be read, has an unknown extension, or fails to decode.
pub fn load_path(path: impl AsRef<Path>) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let cfg = match ext.as_str() {
        "json" | "" => Config::from_json_str(&text),
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => Config::from_yaml_str(&text),
        other => anyhow::bail!("unsupported config extension '{other}': {}", path.display()),
    }
    .with_context(|| format!("failed to decode config: {}", path.display()))?;
    debug!(
        path = %path.display(),
        inbounds = cfg.inbounds.len(),
        outbounds = cfg.outbounds.len(),
        "config loaded"
    );
    Ok(cfg)
}
