//! Shared application state.
//!
//! Built once at startup, wrapped in `Arc` and handed to every request.
//! Everything in here is immutable after construction; the store and the
//! access gate do their own synchronisation.

use std::sync::Arc;

use thiserror::Error;

use crate::access::{
    AccessGate, IdentitySource, IpLookupService, PeerAddress, StoredRolePolicy,
};
use crate::clock::LocalClock;
use crate::config::{self, AppConfig, IdentityMode};
use crate::inference::{InferenceEngine, InferenceError};
use crate::store::{DocumentStore, MemoryStore, RecordGateway, RemoteStore};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Model loading failed: {0}")]
    Models(#[from] InferenceError),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid timezone {name} ({offset_minutes} min)")]
    InvalidTimezone { name: String, offset_minutes: i32 },
}

pub struct CoreState {
    pub engine: InferenceEngine,
    pub gateway: RecordGateway,
    pub gate: AccessGate,
    pub clock: LocalClock,
    store_kind: &'static str,
}

impl CoreState {
    /// Assemble state from already-built parts.
    pub fn new(
        engine: InferenceEngine,
        store: Arc<dyn DocumentStore>,
        identity: Box<dyn IdentitySource>,
        clock: LocalClock,
    ) -> Self {
        let gateway = RecordGateway::new(store);
        let gate = AccessGate::new(identity, Box::new(StoredRolePolicy), gateway.clone());
        Self {
            engine,
            gateway,
            gate,
            clock,
            store_kind: "custom",
        }
    }

    /// Load models and connect backends as configured.
    ///
    /// Builds blocking HTTP clients, so call this outside the async runtime.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let engine = InferenceEngine::load(&config.models_dir)?;

        let clock = LocalClock::new(config.tz_name.clone(), config.tz_offset_minutes).ok_or_else(
            || CoreError::InvalidTimezone {
                name: config.tz_name.clone(),
                offset_minutes: config.tz_offset_minutes,
            },
        )?;

        let (store, store_kind): (Arc<dyn DocumentStore>, &'static str) = match &config.store_url {
            Some(url) => {
                let client = config::http_client(config.http_timeout)?;
                tracing::info!(url = %url, "Using remote record store");
                (
                    Arc::new(RemoteStore::new(url, config.store_auth.clone(), client)),
                    "remote",
                )
            }
            None => {
                tracing::warn!("No store URL configured, records are kept in memory only");
                (Arc::new(MemoryStore::new()), "memory")
            }
        };

        let identity: Box<dyn IdentitySource> = match config.identity {
            IdentityMode::Lookup => {
                let client = config::http_client(config.http_timeout)?;
                Box::new(IpLookupService::new(&config.ip_lookup_url, client))
            }
            IdentityMode::Peer => Box::new(PeerAddress),
        };

        let mut state = Self::new(engine, store, identity, clock);
        state.store_kind = store_kind;
        Ok(state)
    }

    /// `remote`, `memory` or `custom`; reported by the health endpoint.
    pub fn store_kind(&self) -> &'static str {
        self.store_kind
    }
}
