//! Remote JSON-tree store access.
//!
//! The store is addressed by slash-separated paths and speaks four verbs:
//! GET a value, POST a child under a generated key, PATCH (merge) an
//! object, DELETE a path. There are no transactions and no version checks;
//! concurrent writers race and the last one wins.

pub mod diagnoses;
pub mod gateway;
pub mod memory;
pub mod remote;

pub use gateway::*;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unreachable at {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Store returned error (status {status}) for {path}: {body}")]
    Status { path: String, status: u16, body: String },

    #[error("Malformed store response: {0}")]
    Malformed(String),

    #[error("Invalid store path: {0:?}")]
    InvalidPath(String),

    #[error("Internal lock error")]
    LockPoisoned,
}

/// Raw verbs of the document store.
pub trait DocumentStore: Send + Sync {
    /// Value at `path`, or `Value::Null` if nothing is stored there.
    fn get(&self, path: &str) -> Result<Value, StoreError>;

    /// Append `body` under a new generated key; returns the key.
    fn post(&self, path: &str, body: &Value) -> Result<String, StoreError>;

    /// Merge the children of `body` into the object at `path`.
    fn patch(&self, path: &str, body: &Value) -> Result<(), StoreError>;

    /// Remove whatever is at `path`. Removing nothing is not an error.
    fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Characters the store refuses inside a key.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '#', '$', '[', ']'];

/// Check a single key segment (no slashes).
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty()
        || key.contains('/')
        || key.chars().any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control())
    {
        return Err(StoreError::InvalidPath(key.to_string()));
    }
    Ok(())
}

/// Split a path into validated segments. Leading/trailing slashes are ignored.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    trimmed
        .split('/')
        .map(|segment| validate_key(segment).map(|()| segment))
        .collect()
}
