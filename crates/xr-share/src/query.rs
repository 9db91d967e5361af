//! Query-string parameters of URI share links.
//!
//! Parameters are written in one fixed order, whatever the protocol; a
//! protocol that does not use a key simply leaves it unset.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::borrow::Cow;
use tracing::trace;
use xr_types::{CodecError, CodecResult};

/// Escaped in query values. `/`, `,` and `:` stay readable.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// Every query parameter understood by the URI link forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkParams {
    pub encryption: Option<String>,
    pub flow: Option<String>,
    pub pbk: Option<String>,
    pub pqv: Option<String>,
    pub sid: Option<String>,
    pub spx: Option<String>,
    pub r#type: Option<String>,
    pub path: Option<String>,
    pub host: Option<String>,
    pub header_type: Option<String>,
    pub seed: Option<String>,
    pub service_name: Option<String>,
    pub authority: Option<String>,
    pub mode: Option<String>,
    pub security: Option<String>,
    pub alpn: Option<String>,
    pub sni: Option<String>,
    pub ech: Option<String>,
    pub fp: Option<String>,
    pub allow_insecure: Option<String>,
}

impl LinkParams {
    /// `(key, value)` in wire order.
    fn entries(&self) -> [(&'static str, &Option<String>); 20] {
        [
            ("encryption", &self.encryption),
            ("flow", &self.flow),
            ("pbk", &self.pbk),
            ("pqv", &self.pqv),
            ("sid", &self.sid),
            ("spx", &self.spx),
            ("type", &self.r#type),
            ("path", &self.path),
            ("host", &self.host),
            ("headerType", &self.header_type),
            ("seed", &self.seed),
            ("serviceName", &self.service_name),
            ("authority", &self.authority),
            ("mode", &self.mode),
            ("security", &self.security),
            ("alpn", &self.alpn),
            ("sni", &self.sni),
            ("ech", &self.ech),
            ("fp", &self.fp),
            ("allowInsecure", &self.allow_insecure),
        ]
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        let slot = match key.to_ascii_lowercase().as_str() {
            "encryption" => &mut self.encryption,
            "flow" => &mut self.flow,
            "pbk" => &mut self.pbk,
            "pqv" => &mut self.pqv,
            "sid" => &mut self.sid,
            "spx" => &mut self.spx,
            "type" => &mut self.r#type,
            "path" => &mut self.path,
            "host" => &mut self.host,
            "headertype" => &mut self.header_type,
            "seed" => &mut self.seed,
            "servicename" => &mut self.service_name,
            "authority" => &mut self.authority,
            "mode" => &mut self.mode,
            "security" => &mut self.security,
            "alpn" => &mut self.alpn,
            "sni" => &mut self.sni,
            "ech" => &mut self.ech,
            "fp" => &mut self.fp,
            "allowinsecure" => &mut self.allow_insecure,
            _ => return None,
        };
        Some(slot)
    }

    /// Render as `k=v&k=v`, without the leading `?`. Unset keys are skipped;
    /// empty values are kept (`host=`).
    pub fn to_query(&self) -> String {
        self.entries()
            .iter()
            .filter_map(|(key, value)| {
                value
                    .as_deref()
                    .map(|v| format!("{key}={}", utf8_percent_encode(v, QUERY_VALUE)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Parse a query string. Keys match case-insensitively, the last
    /// occurrence wins and unknown keys are ignored. `+` in a value is a space.
    ///
    /// # Errors
    /// `MalformedShareLink` when a key or value is not valid percent-encoded UTF-8.
    pub fn from_query(query: &str) -> CodecResult<Self> {
        let mut params = Self::default();
        let query = query.trim().trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(key)
                .map_err(|e| CodecError::malformed_link(pair, e.to_string()))?;
            // form encoding writes spaces as `+`; a literal plus arrives as `%2B`
            let value = urlencoding::decode(&value.replace('+', " "))
                .map(Cow::into_owned)
                .map_err(|e| CodecError::malformed_link(pair, e.to_string()))?;
            match params.slot_mut(&key) {
                Some(slot) => *slot = Some(value),
                None => trace!(key = %key, "ignoring unknown link parameter"),
            }
        }
        Ok(params)
    }
}

/// Parameter value, treating an empty value as absent.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
