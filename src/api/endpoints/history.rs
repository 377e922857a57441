//! `GET /api/history`: every stored screening, newest last.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::HistoryEntry;
use crate::store::{diagnoses, Notices};

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub warnings: Notices,
}

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<HistoryResponse>, ApiError> {
    let response = ctx
        .blocking(|core| {
            let mut warnings = Notices::new();
            let entries = diagnoses::history(&core.gateway, &mut warnings);
            HistoryResponse { entries, warnings }
        })
        .await?;
    Ok(Json(response))
}
