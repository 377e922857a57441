//! HTTP API.
//!
//! Exposes the screening forms, submission, history and the IP-gated admin
//! view as JSON endpoints under `/api/`. `api_router()` returns a plain
//! `Router` so it can be served directly or mounted elsewhere.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ServerError};
pub use types::ApiContext;
