//! Fixed values of the share-link formats.

/// Length of the random REALITY `spx` token, excluding the leading `/`.
pub const SPIDER_X_LEN: usize = 15;

/// `v` field of the VMess JSON payload.
pub const VMESS_VERSION: &str = "2";

/// `aid` field of the VMess JSON payload. AEAD-only clients expect `0`.
pub const VMESS_AID: &str = "0";

/// `type`/`tls` placeholder of the VMess payload.
pub const VMESS_NONE: &str = "none";

/// gRPC multi mode marker carried in `mode` (URI) or `type` (VMess).
pub const GRPC_MULTI_MODE: &str = "multi";

#[must_use]
pub fn default_vmess_version() -> String {
    VMESS_VERSION.to_owned()
}

#[must_use]
pub fn default_vmess_aid() -> String {
    VMESS_AID.to_owned()
}

#[must_use]
pub fn default_vmess_none() -> String {
    VMESS_NONE.to_owned()
}
