//! Engine process port.

use super::PortError;

/// Consumer of a fully encoded configuration document.
///
/// Typical implementations launch the proxy process (or a native library)
/// with the JSON produced by `Config::to_json_string` and report its status.
pub trait ConfigConsumer: Send + Sync {
    /// Start the engine with the given JSON document.
    ///
    /// # Errors
    /// Returns an error if the engine rejects the document or fails to launch.
    fn start(&self, document: &str) -> Result<(), PortError>;

    /// Stop the engine. Stopping an engine that is not running is a no-op.
    ///
    /// # Errors
    /// Returns an error if shutdown fails.
    fn stop(&self) -> Result<(), PortError>;

    /// Whether the engine is currently running.
    fn is_started(&self) -> bool;

    /// Engine version string, e.g. `"25.3.6"`.
    fn version(&self) -> String;
}
