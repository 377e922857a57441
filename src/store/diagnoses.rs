//! Typed access to `diagnoses/{id}` records.

use serde_json::Value;

use super::{validate_key, Notices, RecordGateway, StoreError};
use crate::diagnosis::{DiagnosisRecord, HistoryEntry};

pub const DIAGNOSES_PATH: &str = "diagnoses";

/// Path of a single record. `id` must be exactly one store key.
pub fn record_path(id: &str) -> Result<String, StoreError> {
    validate_key(id)?;
    Ok(format!("{DIAGNOSES_PATH}/{id}"))
}

fn checked_path(id: &str, notices: &mut Notices) -> Option<String> {
    match record_path(id) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::warn!(id, error = %e, "Rejected diagnosis id");
            notices.warn(format!("Invalid record id: {e}"));
            None
        }
    }
}

fn to_value(record: &DiagnosisRecord, notices: &mut Notices) -> Option<Value> {
    match serde_json::to_value(record) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(error = %e, "Record serialization failed");
            notices.warn(format!("Could not encode the record: {e}"));
            None
        }
    }
}

/// Persist a new record. Returns the generated id.
pub fn save(gateway: &RecordGateway, record: &DiagnosisRecord, notices: &mut Notices) -> Option<String> {
    let value = to_value(record, notices)?;
    gateway.create(DIAGNOSES_PATH, &value, notices)
}

/// Load one record. Malformed data is reported and treated as absent.
pub fn fetch(gateway: &RecordGateway, id: &str, notices: &mut Notices) -> Option<DiagnosisRecord> {
    let path = checked_path(id, notices)?;
    let value = gateway.read(&path, notices)?;
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(id, error = %e, "Stored diagnosis is malformed");
            notices.warn(format!("Record {id} is malformed: {e}"));
            None
        }
    }
}

/// All well-formed records, in store key order.
pub fn list(gateway: &RecordGateway, notices: &mut Notices) -> Vec<(String, DiagnosisRecord)> {
    let Some(Value::Object(all)) = gateway.read(DIAGNOSES_PATH, notices) else {
        return Vec::new();
    };

    let mut records = Vec::with_capacity(all.len());
    for (id, value) in all {
        match serde_json::from_value::<DiagnosisRecord>(value) {
            Ok(record) => records.push((id, record)),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Skipping malformed diagnosis");
                notices.warn(format!("Record {id} is malformed and was skipped: {e}"));
            }
        }
    }
    records
}

/// History rows for every stored record, tolerant of missing fields.
pub fn history(gateway: &RecordGateway, notices: &mut Notices) -> Vec<HistoryEntry> {
    match gateway.read(DIAGNOSES_PATH, notices) {
        Some(Value::Object(all)) => all
            .iter()
            .map(|(id, value)| HistoryEntry::from_value(id, value))
            .collect(),
        _ => Vec::new(),
    }
}

/// Overwrite the record at `id` with `record`.
pub fn replace(gateway: &RecordGateway, id: &str, record: &DiagnosisRecord, notices: &mut Notices) -> bool {
    let Some(path) = checked_path(id, notices) else {
        return false;
    };
    match to_value(record, notices) {
        Some(value) => gateway.replace_record(&path, &value, notices),
        None => false,
    }
}

pub fn remove(gateway: &RecordGateway, id: &str, notices: &mut Notices) -> bool {
    match checked_path(id, notices) {
        Some(path) => gateway.delete(&path, notices),
        None => false,
    }
}
