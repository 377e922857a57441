//! `POST /api/diagnoses/:kind`: run a screening and store it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::endpoints::forms::parse_kind;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::screening::{self, Outcome};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub user_name: String,
    /// Field name → number; choice fields carry the option code.
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// Responds 201 when the record was stored, 200 when only the
/// prediction could be made (the store warning is in the body).
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(kind): Path<String>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Outcome>), ApiError> {
    let kind = parse_kind(&kind)?;
    let Json(request) = body?;
    let outcome = ctx
        .blocking(move |core| screening::submit(core, kind, &request.user_name, &request.values))
        .await??;

    let status = if outcome.id.is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}
