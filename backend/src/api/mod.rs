//! HTTP API module.
//!
//! Route handlers, request/response types and the built-in mock data.

pub mod mock;
pub mod server;
pub mod types;

pub use server::{app_router, start_server, AppState};
pub use types::*;
