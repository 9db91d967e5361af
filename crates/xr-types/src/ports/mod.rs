//! Ports (traits) for the collaborators around the config toolkit.
//!
//! The codecs never talk to these directly: they produce documents and links,
//! and callers hand the results to whichever implementation they run.
//! 编解码器不直接调用这些协作者；调用方负责把产物交给具体实现。

pub mod credentials;
pub mod engine;
pub mod stats;

pub use credentials::*;
pub use engine::*;
pub use stats::*;

/// Error type returned by collaborator implementations.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;
