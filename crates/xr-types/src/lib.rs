//! xr-types: cross-crate stable contracts for the Xray config toolkit.
//! xr-types：Xray 配置工具集的跨 crate 稳定契约。
//!
//! - [`errors`]: the typed error taxonomy shared by the document codec and the
//!   share-link codec. 文档编解码器与分享链接编解码器共享的类型化错误。
//! - [`ports`]: collaborator traits (engine process, stats/user API, credential
//!   generator). Implementations live outside this workspace except for the
//!   default credential generator.
//!   协作者 trait（引擎进程、统计/用户 API、凭据生成器）。

pub mod errors;
pub mod ports;

pub use errors::{CodecError, CodecResult, ErrorClass};
