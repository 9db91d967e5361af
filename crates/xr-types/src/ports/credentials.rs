//! Credential generator port.
//!
//! Generated values are opaque strings to the codecs: a UUID becomes a VLESS
//! `id`, a short id lands in REALITY `shortIds`, and nothing downstream parses
//! them again.

use rand::Rng;
use uuid::Uuid;

/// Longest REALITY short id, in hex characters.
pub const MAX_SHORT_ID_LEN: usize = 16;

/// Producer of secrets used in endpoint settings.
pub trait CredentialGenerator: Send + Sync {
    /// Random UUID (v4), hyphenated lowercase.
    fn uuid_v4(&self) -> String;

    /// Name-based UUID (v5) derived from `input`.
    fn uuid_v5(&self, input: &str) -> String;

    /// Random lowercase hex short id of `len` characters, capped at
    /// [`MAX_SHORT_ID_LEN`].
    fn short_id(&self, len: usize) -> String;
}

/// Default generator backed by the `uuid` and `rand` crates.
///
/// v5 UUIDs use the nil namespace, which matches what the engine's own
/// `uuid -i <input>` command produces.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidCredentialGenerator;

impl CredentialGenerator for UuidCredentialGenerator {
    fn uuid_v4(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn uuid_v5(&self, input: &str) -> String {
        Uuid::new_v5(&Uuid::nil(), input.as_bytes()).to_string()
    }

    fn short_id(&self, len: usize) -> String {
        let len = len.min(MAX_SHORT_ID_LEN);
        let mut rng = rand::thread_rng();
        let mut out = String::with_capacity(len + 1);
        while out.len() < len {
            let byte: u8 = rng.gen();
            out.push_str(&format!("{byte:02x}"));
        }
        out.truncate(len);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_v5_is_stable() {
        let gen = UuidCredentialGenerator;
        let a = gen.uuid_v5("example@test.com");
        let b = gen.uuid_v5("example@test.com");
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(&a[14..15], "5");
        assert_ne!(a, gen.uuid_v5("other@test.com"));
    }

    #[test]
    fn uuid_v4_parses() {
        let id = UuidCredentialGenerator.uuid_v4();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn short_id_length_and_alphabet() {
        let gen = UuidCredentialGenerator;
        for len in [0, 1, 2, 7, 8, 16, 40] {
            let sid = gen.short_id(len);
            assert_eq!(sid.len(), len.min(MAX_SHORT_ID_LEN));
            assert!(sid.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }
}
