//! Default values for endpoint records.
//!
//! Used with `#[serde(default = "...")]` attributes and by the share-link codec
//! when a field is absent.

use crate::enums::Fingerprint;

/// Listen address substituted when an inbound has none.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0";

/// VLESS clients must announce `encryption=none`.
pub const DEFAULT_VLESS_ENCRYPTION: &str = "none";

/// TUN device MTU.
pub const DEFAULT_TUN_MTU: u32 = 1500;

#[must_use]
pub fn default_vless_encryption() -> String {
    DEFAULT_VLESS_ENCRYPTION.to_owned()
}

#[must_use]
pub fn default_tun_mtu() -> u32 {
    DEFAULT_TUN_MTU
}

/// REALITY client fingerprint when none is configured.
#[must_use]
pub fn default_reality_fingerprint() -> Fingerprint {
    Fingerprint::Chrome
}
