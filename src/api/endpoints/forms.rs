//! Form schema endpoints.
//!
//! - `GET /api/forms`: the three diagnosis types
//! - `GET /api/forms/:kind`: ordered fields with bounds and options

use axum::extract::Path;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::diagnosis::{DiagnosisKind, FieldSpec};

#[derive(Serialize)]
pub struct FormSummary {
    pub kind: DiagnosisKind,
    pub title: &'static str,
    pub field_count: usize,
}

#[derive(Serialize)]
pub struct FormSchema {
    pub kind: DiagnosisKind,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

pub(crate) fn parse_kind(raw: &str) -> Result<DiagnosisKind, ApiError> {
    raw.parse()
        .map_err(|e: crate::diagnosis::UnknownKind| ApiError::NotFound(e.to_string()))
}

/// `GET /api/forms`
pub async fn list() -> Json<Vec<FormSummary>> {
    Json(
        DiagnosisKind::ALL
            .iter()
            .map(|&kind| FormSummary {
                kind,
                title: kind.title(),
                field_count: kind.feature_len(),
            })
            .collect(),
    )
}

/// `GET /api/forms/:kind`
pub async fn schema(Path(kind): Path<String>) -> Result<Json<FormSchema>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(FormSchema {
        kind,
        title: kind.title(),
        fields: kind.schema(),
    }))
}
