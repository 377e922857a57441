//! Shared types for the HTTP layer.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;

use crate::api::error::ApiError;
use crate::core_state::CoreState;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Run store-touching work on the blocking pool.
    pub async fn blocking<F, T>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&CoreState) -> T + Send + 'static,
        T: Send + 'static,
    {
        let core = Arc::clone(&self.core);
        tokio::task::spawn_blocking(move || work(&core))
            .await
            .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))
    }
}

/// TCP peer IP, when the server was started with connect info.
pub fn peer_ip(info: Option<ConnectInfo<SocketAddr>>) -> Option<IpAddr> {
    info.map(|ConnectInfo(addr)| addr.ip())
}
