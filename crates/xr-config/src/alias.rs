//! Enum alias codec.
//! 枚举别名编解码。
//!
//! Wire tokens in Xray documents are a mix of historical names (`tcp` for the
//! raw transport, `splithttp` for xhttp) and casing conventions (`AsIs`,
//! `wechat-video`). Each enumerated wire field is declared through
//! [`wire_enum!`](crate::wire_enum), which registers a static table
//! `value -> [aliases]` built once on first use.
//!
//! - Decode is case-insensitive over every alias of every value. If no alias
//!   matches, the declared Rust variant name is tried (also case-insensitive).
//! - Encode always emits the first declared alias, or the variant name when the
//!   value declares none.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, Deserializer, Visitor};
use tracing::trace;
use xr_types::{CodecError, CodecResult};

#[doc(hidden)]
pub use once_cell::sync::Lazy as __Lazy;

/// One registered value with its declared name and aliases.
#[derive(Debug, Clone, Copy)]
pub struct AliasEntry<T: 'static> {
    pub value: T,
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl<T: Copy> AliasEntry<T> {
    pub const fn new(value: T, name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            value,
            name,
            aliases,
        }
    }

    /// Token written on encode.
    pub fn canonical(&self) -> &'static str {
        first_or(self.aliases, self.name)
    }
}

/// Lookup table for one enum type.
#[derive(Debug)]
pub struct AliasTable<T: 'static> {
    enum_name: &'static str,
    entries: Vec<AliasEntry<T>>,
    by_alias: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl<T: Copy + PartialEq + 'static> AliasTable<T> {
    /// Build the table. When two values claim the same alias the first
    /// declaration keeps it.
    pub fn new(enum_name: &'static str, entries: Vec<AliasEntry<T>>) -> Self {
        let mut by_alias = HashMap::new();
        let mut by_name = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            for alias in entry.aliases {
                by_alias.entry(alias.to_ascii_lowercase()).or_insert(idx);
            }
            by_name.entry(entry.name.to_ascii_lowercase()).or_insert(idx);
        }
        Self {
            enum_name,
            entries,
            by_alias,
            by_name,
        }
    }

    pub fn enum_name(&self) -> &'static str {
        self.enum_name
    }

    pub fn entries(&self) -> &[AliasEntry<T>] {
        &self.entries
    }

    /// Resolve a wire token.
    ///
    /// # Errors
    /// `UnknownEnumToken` when neither an alias nor a declared name matches.
    pub fn decode(&self, token: &str) -> CodecResult<T> {
        let key = token.to_ascii_lowercase();
        if let Some(&idx) = self.by_alias.get(&key) {
            return Ok(self.entries[idx].value);
        }
        if let Some(&idx) = self.by_name.get(&key) {
            trace!(enum_name = self.enum_name, token, "alias resolved by declared name");
            return Ok(self.entries[idx].value);
        }
        Err(CodecError::unknown_enum_token(self.enum_name, token))
    }

    /// Canonical token for `value`.
    pub fn encode(&self, value: T) -> &'static str {
        self.entries
            .iter()
            .find(|e| e.value == value)
            .map(AliasEntry::canonical)
            .unwrap_or(self.enum_name)
    }
}

/// First alias, or `fallback` when the list is empty.
#[doc(hidden)]
pub fn first_or(aliases: &'static [&'static str], fallback: &'static str) -> &'static str {
    aliases.first().copied().unwrap_or(fallback)
}

/// Enumerated wire value backed by an [`AliasTable`].
pub trait WireEnum: Sized + Copy + PartialEq + fmt::Debug + 'static {
    /// Type name used in error messages.
    const ENUM_NAME: &'static str;

    fn table() -> &'static AliasTable<Self>;

    /// Canonical token; total by construction.
    fn token(self) -> &'static str;

    /// # Errors
    /// `UnknownEnumToken` when `token` is not registered.
    fn decode(token: &str) -> CodecResult<Self> {
        Self::table().decode(token)
    }

    /// Every declared value in declaration order.
    fn values() -> Vec<Self> {
        Self::table().entries().iter().map(|e| e.value).collect()
    }
}

/// Decode `token` as `T`.
///
/// # Errors
/// `UnknownEnumToken` when `token` is not registered for `T`.
pub fn decode<T: WireEnum>(token: &str) -> CodecResult<T> {
    T::decode(token)
}

/// Canonical wire token of `value`.
pub fn encode<T: WireEnum>(value: T) -> &'static str {
    value.token()
}

#[doc(hidden)]
pub fn deserialize_token<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: WireEnum,
{
    struct TokenVisitor<T>(PhantomData<T>);

    impl<'de, T: WireEnum> Visitor<'de> for TokenVisitor<T> {
        type Value = T;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a {} token", T::ENUM_NAME)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
            T::decode(v).map_err(E::custom)
        }
    }

    deserializer.deserialize_str(TokenVisitor(PhantomData))
}

/// Declare an enum whose wire form goes through the alias codec.
///
/// ```ignore
/// wire_enum! {
///     /// Transport discriminator.
///     pub enum StreamNetwork {
///         Raw => ["raw", "tcp"],
///         Grpc => ["grpc"],
///     }
/// }
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => [$($alias:literal),* $(,)?]
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::alias::WireEnum for $name {
            const ENUM_NAME: &'static str = stringify!($name);

            fn table() -> &'static $crate::alias::AliasTable<Self> {
                static TABLE: $crate::alias::__Lazy<$crate::alias::AliasTable<$name>> =
                    $crate::alias::__Lazy::new(|| {
                        $crate::alias::AliasTable::new(
                            stringify!($name),
                            vec![
                                $(
                                    $crate::alias::AliasEntry::new(
                                        $name::$variant,
                                        stringify!($variant),
                                        &[$($alias),*],
                                    ),
                                )+
                            ],
                        )
                    });
                &TABLE
            }

            fn token(self) -> &'static str {
                match self {
                    $(
                        $name::$variant => $crate::alias::first_or(&[$($alias),*], stringify!($variant)),
                    )+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::alias::WireEnum::token(*self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::xr_types::CodecError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                <$name as $crate::alias::WireEnum>::decode(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::alias::WireEnum::token(*self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                $crate::alias::deserialize_token(deserializer)
            }
        }
    };
}

/// Serde helper for list-valued enum fields written as `"tcp,udp"`.
///
/// Accepts either the comma-joined string or a JSON array on decode; always
/// writes the comma-joined string.
pub mod comma_list {
    use super::WireEnum;
    use serde::{de::Error as DeError, Deserialize, Deserializer, Serializer};

    pub fn serialize<S, T>(value: &Option<Vec<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: WireEnum,
    {
        match value {
            Some(items) => {
                let joined = items.iter().map(|v| v.token()).collect::<Vec<_>>().join(",");
                serializer.serialize_str(&joined)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: WireEnum,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Str(String),
            List(Vec<String>),
        }

        let tokens: Vec<String> = match Option::<Raw>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(Raw::Str(s)) => s.split(',').map(|t| t.trim().to_string()).collect(),
            Some(Raw::List(list)) => list,
        };
        tokens
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| T::decode(t).map_err(D::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::wire_enum! {
        enum Sample {
            Raw => ["raw", "tcp"],
            Empty => [""],
            Bare => [],
        }
    }

    #[test]
    fn decode_is_case_insensitive_over_all_aliases() {
        assert_eq!(decode::<Sample>("raw").unwrap(), Sample::Raw);
        assert_eq!(decode::<Sample>("TCP").unwrap(), Sample::Raw);
        assert_eq!(decode::<Sample>("").unwrap(), Sample::Empty);
    }

    #[test]
    fn declared_name_is_a_fallback() {
        assert_eq!(decode::<Sample>("bare").unwrap(), Sample::Bare);
        assert_eq!(decode::<Sample>("EMPTY").unwrap(), Sample::Empty);
    }

    #[test]
    fn encode_uses_first_alias_or_name() {
        assert_eq!(encode(Sample::Raw), "raw");
        assert_eq!(encode(Sample::Empty), "");
        assert_eq!(encode(Sample::Bare), "Bare");
        assert_eq!(Sample::table().encode(Sample::Raw), "raw");
    }

    #[test]
    fn unknown_token_names_the_enum() {
        match decode::<Sample>("quic") {
            Err(CodecError::UnknownEnumToken { enum_name, token }) => {
                assert_eq!(enum_name, "Sample");
                assert_eq!(token, "quic");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn serde_goes_through_the_table() {
        let v: Sample = serde_json::from_str("\"Tcp\"").unwrap();
        assert_eq!(v, Sample::Raw);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"raw\"");
        assert!(serde_json::from_str::<Sample>("\"udp\"").is_err());
    }
}
