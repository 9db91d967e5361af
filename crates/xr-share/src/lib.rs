//! Share links for Xray endpoints.
//! Xray 节点分享链接的编码与解码。
//!
//! Encoding projects one client of an inbound onto a link a client can import;
//! decoding turns such a link back into an outbound.
//! 编码：入站 + 客户端 → 链接；解码：链接 → 出站。
//!
//! | scheme | userinfo | payload |
//! |---|---|---|
//! | `vless://` | user id | query |
//! | `trojan://` | password | query |
//! | `ss://` | base64 `method:password` | query (transport + TLS) |
//! | `socks://`, `http://` | `user:pass` | none |
//! | `vmess://` | n/a | base64 JSON, see [`VmessLink`] |
//!
//! REALITY links pick a server name and short id at random and generate a
//! fresh `spx`; use [`encode_with_rng`] for reproducible output.

mod decode;
pub mod defaults;
mod encode;
mod params;
pub mod query;
mod random;
pub mod scheme;
mod uri;
pub mod vmess;

pub use decode::decode;
pub use encode::{encode, encode_all, encode_with_rng};
pub use query::LinkParams;
pub use scheme::LinkScheme;
pub use vmess::VmessLink;
