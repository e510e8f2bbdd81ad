//! Sitebot core: a directory of named sites with typed attributes, driven
//! by prefixed chat commands whose replies are chunked to fit a size-limited
//! encrypted transport.
//!
//! Data flow: inbound line → `transport::decode_inbound` → `parse` →
//! `Dispatcher` → `DirectoryStore` → `Backend`, then reply lines →
//! `transport::Outbox` (chunk, encrypt, send).

pub mod chunk;
pub mod command;
pub mod dispatch;
pub mod errors;
pub mod format;
pub mod help;
pub mod parse;
pub mod response;
pub mod schema;
pub mod settings;
pub mod store;
pub mod transport;
pub mod types;

pub use dispatch::Dispatcher;
pub use response::Response;
