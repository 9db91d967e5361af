//! Statistics and user-management port.

use super::PortError;
use serde::{Deserialize, Serialize};

/// Traffic counters for one client, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTraffic {
    pub email: String,
    pub uplink: i64,
    pub downlink: i64,
}

/// Credential payload for adding a user to a running inbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UserCredential {
    Vless { id: String, flow: String },
    Vmess { id: String },
    Trojan { password: String },
    Shadowsocks { password: String, method: String },
    Shadowsocks2022 { key: String },
    Socks { username: String, password: String },
    Http { username: String, password: String },
}

/// A user to be added to the inbound identified by `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub tag: String,
    pub email: String,
    pub level: u32,
    pub credential: UserCredential,
}

/// Stats/user-management API of a running engine.
pub trait StatsCollaborator: Send + Sync {
    /// Counters for one client. `reset` zeroes them after reading.
    ///
    /// # Errors
    /// Returns an error if the API call fails or the user is unknown.
    fn user_stats(&self, email: &str, reset: bool) -> Result<UserTraffic, PortError>;

    /// Counters for every known client.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    fn all_user_stats(&self, reset: bool) -> Result<Vec<UserTraffic>, PortError>;

    /// # Errors
    /// Returns an error if the API call fails.
    fn is_user_online(&self, email: &str) -> Result<bool, PortError>;

    /// Emails of all clients with at least one live connection.
    ///
    /// # Errors
    /// Returns an error if the API call fails.
    fn online_users(&self) -> Result<Vec<String>, PortError>;

    /// # Errors
    /// Returns an error if the inbound does not exist or rejects the credential.
    fn add_user(&self, user: NewUser) -> Result<(), PortError>;

    /// # Errors
    /// Returns an error if the inbound or the user does not exist.
    fn remove_user(&self, tag: &str, email: &str) -> Result<(), PortError>;
}
