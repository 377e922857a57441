//! Record Store Gateway.
//!
//! Wraps a [`DocumentStore`] so that every failure is logged, turned into
//! a user-visible warning, and otherwise ignored. Callers never see a
//! `StoreError`: a failed write simply did not happen, a failed read looks
//! like missing data. No retries.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::DocumentStore;

/// Warnings gathered while serving one request, returned to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Notices(Vec<String>);

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Outcome of a read when the caller must tell "absent" from "failed".
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Value),
    Absent,
    Failed,
}

#[derive(Clone)]
pub struct RecordGateway {
    store: Arc<dyn DocumentStore>,
}

impl RecordGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// POST `obj` under `path`. Returns the generated key.
    pub fn create(&self, path: &str, obj: &Value, notices: &mut Notices) -> Option<String> {
        match self.store.post(path, obj) {
            Ok(key) => {
                tracing::debug!(path, key = %key, "Record created");
                Some(key)
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Store write failed");
                notices.warn(format!("Could not save data to the store: {e}"));
                None
            }
        }
    }

    /// GET `path`. Absent data and failures both yield `None`.
    pub fn read(&self, path: &str, notices: &mut Notices) -> Option<Value> {
        match self.lookup(path, notices) {
            Lookup::Found(value) => Some(value),
            Lookup::Absent | Lookup::Failed => None,
        }
    }

    /// GET `path`, keeping "absent" and "failed" apart.
    pub fn lookup(&self, path: &str, notices: &mut Notices) -> Lookup {
        match self.store.get(path) {
            Ok(Value::Null) => Lookup::Absent,
            Ok(value) => Lookup::Found(value),
            Err(e) => {
                tracing::warn!(path, error = %e, "Store read failed");
                notices.warn(format!("Could not read data from the store: {e}"));
                Lookup::Failed
            }
        }
    }

    /// PATCH a subset of fields into the object at `path`.
    pub fn merge_fields(&self, path: &str, partial: &Value, notices: &mut Notices) -> bool {
        self.patch(path, partial, notices)
    }

    /// Overwrite every field of the record at `path`.
    ///
    /// Sent as a PATCH carrying the complete record: each top-level field
    /// (nested objects included) is replaced wholesale.
    pub fn replace_record(&self, path: &str, full: &Value, notices: &mut Notices) -> bool {
        self.patch(path, full, notices)
    }

    /// DELETE `path`. Deleting something that is not there succeeds.
    pub fn delete(&self, path: &str, notices: &mut Notices) -> bool {
        match self.store.delete(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path, error = %e, "Store delete failed");
                notices.warn(format!("Could not delete data from the store: {e}"));
                false
            }
        }
    }

    fn patch(&self, path: &str, body: &Value, notices: &mut Notices) -> bool {
        match self.store.patch(path, body) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path, error = %e, "Store update failed");
                notices.warn(format!("Could not update data in the store: {e}"));
                false
            }
        }
    }
}
