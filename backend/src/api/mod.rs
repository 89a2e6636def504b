//! HTTP API module.
//!
//! The axum server, its JSON types and the log stream shared with the CLI.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server};
pub use types::*;
pub use logs::*;
