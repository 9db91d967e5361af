//! Port value: a literal, a `from-to` range, or an `env:NAME` reference.
//! 端口取值：单个端口、端口范围或环境变量引用。

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use xr_types::{CodecError, CodecResult};

const ENV_PREFIX: &str = "env:";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Port {
    Single(u16),
    /// Inclusive range, `1 <= from <= to`.
    Range { from: u16, to: u16 },
    /// Name of the environment variable that holds the real port.
    Env(String),
}

impl Port {
    /// Parse the textual form.
    ///
    /// # Errors
    /// `InvalidPortFormat` for anything other than `N`, `from-to` or `env:NAME`.
    pub fn parse(raw: &str) -> CodecResult<Self> {
        let s = raw.trim();
        if let Some(name) = s
            .get(..ENV_PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(ENV_PREFIX))
            .and_then(|_| s.get(ENV_PREFIX.len()..))
        {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(CodecError::invalid_port(raw, "empty or invalid variable name"));
            }
            return Ok(Self::Env(name.to_string()));
        }
        if let Some((from, to)) = s.split_once('-') {
            let from = parse_number(from)
                .ok_or_else(|| CodecError::invalid_port(raw, "range start is not a port number"))?;
            let to = parse_number(to)
                .ok_or_else(|| CodecError::invalid_port(raw, "range end is not a port number"))?;
            if from == 0 || to == 0 {
                return Err(CodecError::invalid_port(raw, "range bounds must be positive"));
            }
            if from > to {
                return Err(CodecError::invalid_port(raw, "range start exceeds range end"));
            }
            return Ok(Self::Range { from, to });
        }
        parse_number(s)
            .map(Self::Single)
            .ok_or_else(|| CodecError::invalid_port(raw, "not a port number"))
    }

    /// Decode a document node: a JSON number or one of the textual forms.
    ///
    /// # Errors
    /// `InvalidPortFormat` for any other node or value.
    pub fn from_json(value: &serde_json::Value) -> CodecResult<Self> {
        match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .map(Self::Single)
                .ok_or_else(|| CodecError::invalid_port(n.to_string(), "not a port number")),
            serde_json::Value::String(s) => Self::parse(s),
            other => Err(CodecError::invalid_port(
                other.to_string(),
                "expected a number or a string",
            )),
        }
    }

    /// The literal port, if this is one.
    pub fn single(&self) -> Option<u16> {
        match self {
            Self::Single(p) => Some(*p),
            _ => None,
        }
    }

    /// Resolve an `env:NAME` port from the process environment.
    ///
    /// # Errors
    /// `InvalidPortFormat` when the variable is unset or does not hold a
    /// literal port or range.
    pub fn resolve(&self) -> CodecResult<Self> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Resolve with a custom variable lookup. Non-env ports are returned as-is.
    ///
    /// # Errors
    /// See [`Port::resolve`].
    pub fn resolve_with<F>(&self, lookup: F) -> CodecResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Self::Env(name) = self else {
            return Ok(self.clone());
        };
        let value = lookup(name).ok_or_else(|| {
            CodecError::invalid_port(self.to_string(), format!("environment variable {name} is not set"))
        })?;
        match Self::parse(&value)? {
            Self::Env(_) => Err(CodecError::invalid_port(
                value,
                "environment variable points at another env reference",
            )),
            resolved => Ok(resolved),
        }
    }
}

fn parse_number(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl From<u16> for Port {
    fn from(p: u16) -> Self {
        Self::Single(p)
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(p) => write!(f, "{p}"),
            Self::Range { from, to } => write!(f, "{from}-{to}"),
            Self::Env(name) => write!(f, "{ENV_PREFIX}{name}"),
        }
    }
}

impl FromStr for Port {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Port {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Single(p) => serializer.serialize_u16(*p),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Port {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Num(n) => u16::try_from(n)
                .map(Port::Single)
                .map_err(|_| D::Error::custom(CodecError::invalid_port(n.to_string(), "out of range"))),
            Raw::Str(s) => Port::parse(&s).map_err(D::Error::custom),
        }
    }
}
