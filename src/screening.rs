//! Screening workflows: submit a form, prefill and apply admin edits.
//!
//! All functions are synchronous (the store client blocks) and are run on
//! the blocking pool by the HTTP layer.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core_state::CoreState;
use crate::diagnosis::{decode_stored, encode, DiagnosisKind, DiagnosisRecord, EncodeError};
use crate::inference::{InferenceError, Prediction};
use crate::store::{diagnoses, Notices};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Diagnosis not found: {0}")]
    NotFound(String),
}

/// Outcome of a submit or edit.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Store id; `None` when the write failed (see `warnings`).
    pub id: Option<String>,
    pub display: String,
    pub class_id: i64,
    pub record: DiagnosisRecord,
    pub warnings: Notices,
}

/// Stored record plus its inputs in submit shape, for the edit form.
#[derive(Debug, Clone, Serialize)]
pub struct EditForm {
    pub id: String,
    pub record: DiagnosisRecord,
    pub values: Map<String, Value>,
    pub warnings: Notices,
}

fn classify(
    core: &CoreState,
    kind: DiagnosisKind,
    raw: &Map<String, Value>,
) -> Result<(Map<String, Value>, Prediction), ServiceError> {
    let encoded = encode(kind, raw)?;
    let prediction = core.engine.predict(kind, &encoded.features)?;
    Ok((encoded.inputs, prediction))
}

/// Validate, predict and persist a new screening.
///
/// Nothing is written unless every field validates. A failed write is
/// reported in `warnings` and the prediction is still returned.
pub fn submit(
    core: &CoreState,
    kind: DiagnosisKind,
    user_name: &str,
    raw: &Map<String, Value>,
) -> Result<Outcome, ServiceError> {
    let (inputs, prediction) = classify(core, kind, raw)?;

    let record = DiagnosisRecord {
        user_name: user_name.to_string(),
        kind,
        inputs,
        result: prediction.message.to_string(),
        timestamp: core.clock.stamp(),
    };

    let mut warnings = Notices::new();
    let id = diagnoses::save(&core.gateway, &record, &mut warnings);
    tracing::info!(%kind, class_id = prediction.class_id, stored = id.is_some(), "Screening submitted");

    Ok(Outcome {
        id,
        display: record.display_line(),
        class_id: prediction.class_id,
        record,
        warnings,
    })
}

/// Load a record and decode its inputs back into form values.
pub fn edit_form(core: &CoreState, id: &str) -> Result<EditForm, ServiceError> {
    let mut warnings = Notices::new();
    let record = diagnoses::fetch(&core.gateway, id, &mut warnings)
        .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
    let values = decode_stored(record.kind, &record.inputs)?;
    Ok(EditForm {
        id: id.to_string(),
        record,
        values,
        warnings,
    })
}

/// Replace a record's inputs, recompute its result, keep its timestamp.
///
/// The record's type never changes. `user_name` of `None` keeps the
/// stored name.
pub fn edit(
    core: &CoreState,
    id: &str,
    user_name: Option<&str>,
    raw: &Map<String, Value>,
) -> Result<Outcome, ServiceError> {
    let mut warnings = Notices::new();
    let existing = diagnoses::fetch(&core.gateway, id, &mut warnings)
        .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

    let (inputs, prediction) = classify(core, existing.kind, raw)?;

    let record = DiagnosisRecord {
        user_name: user_name.map_or(existing.user_name, str::to_string),
        kind: existing.kind,
        inputs,
        result: prediction.message.to_string(),
        timestamp: existing.timestamp,
    };

    let saved = diagnoses::replace(&core.gateway, id, &record, &mut warnings);
    tracing::info!(id, kind = %record.kind, class_id = prediction.class_id, saved, "Screening edited");

    Ok(Outcome {
        id: saved.then(|| id.to_string()),
        display: record.display_line(),
        class_id: prediction.class_id,
        record,
        warnings,
    })
}
