//! Admin endpoints, gated by the stored role of the client IP.
//!
//! - `GET /api/admin`: records a visit; viewers get history, admins get full records
//! - `GET /api/admin/diagnoses/:id/form`: stored inputs decoded for editing
//! - `PUT /api/admin/diagnoses/:id`: replace inputs, recompute result
//! - `DELETE /api/admin/diagnoses/:id`: idempotent delete

use std::net::{IpAddr, SocketAddr};

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::access::{ClientIdentity, Role};
use crate::api::error::ApiError;
use crate::api::types::{peer_ip, ApiContext};
use crate::core_state::CoreState;
use crate::diagnosis::{DiagnosisRecord, HistoryEntry};
use crate::screening::{self, EditForm, Outcome};
use crate::store::{diagnoses, validate_key, Notices};

#[derive(Debug, Serialize)]
pub struct AdminRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: DiagnosisRecord,
}

#[derive(Debug, Serialize)]
pub struct AdminPage {
    pub identity: ClientIdentity,
    pub role: Role,
    pub visits: usize,
    /// Viewer view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryEntry>>,
    /// Admin view.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<AdminRecord>>,
    pub warnings: Notices,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// `None` keeps the stored name.
    pub user_name: Option<String>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub id: String,
    pub deleted: bool,
    pub warnings: Notices,
}

/// Role check for mutations. Warnings from the check are kept.
fn require_admin(core: &CoreState, peer: Option<IpAddr>, warnings: &mut Notices) -> Result<(), ApiError> {
    let visit = core.gate.authorize(peer, warnings);
    if visit.is_admin() {
        Ok(())
    } else {
        tracing::warn!(key = %visit.identity.key, "Admin action refused");
        Err(ApiError::Forbidden)
    }
}

/// Ids from the URL are percent-decoded, so `%2F` arrives as `/`.
fn check_record_id(id: &str) -> Result<(), ApiError> {
    validate_key(id).map_err(|e| {
        tracing::warn!(id, error = %e, "Rejected diagnosis id");
        ApiError::NotFound(format!("Diagnosis {id} not found"))
    })
}

/// `GET /api/admin`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    info: Option<ConnectInfo<SocketAddr>>,
) -> Result<Json<AdminPage>, ApiError> {
    let peer = peer_ip(info);
    let page = ctx
        .blocking(move |core| {
            let mut warnings = Notices::new();
            let now = core.clock.stamp();
            let visit = core.gate.visit(peer, &now, &mut warnings);

            let (history, records) = if visit.is_admin() {
                let records: Vec<AdminRecord> = diagnoses::list(&core.gateway, &mut warnings)
                    .into_iter()
                    .map(|(id, record)| AdminRecord { id, record })
                    .collect();
                (None, Some(records))
            } else {
                (Some(diagnoses::history(&core.gateway, &mut warnings)), None)
            };

            AdminPage {
                identity: visit.identity,
                role: visit.role,
                visits: visit.access_times.len(),
                history,
                records,
                warnings,
            }
        })
        .await?;
    Ok(Json(page))
}

/// `GET /api/admin/diagnoses/:id/form`
pub async fn edit_form(
    State(ctx): State<ApiContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Path(id): Path<String>,
) -> Result<Json<EditForm>, ApiError> {
    let peer = peer_ip(info);
    let form = ctx
        .blocking(move |core| -> Result<EditForm, ApiError> {
            let mut warnings = Notices::new();
            require_admin(core, peer, &mut warnings)?;
            check_record_id(&id)?;
            let mut form = screening::edit_form(core, &id)?;
            for warning in warnings.as_slice() {
                form.warnings.warn(warning.clone());
            }
            Ok(form)
        })
        .await??;
    Ok(Json(form))
}

/// `PUT /api/admin/diagnoses/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Path(id): Path<String>,
    body: Result<Json<EditRequest>, JsonRejection>,
) -> Result<Json<Outcome>, ApiError> {
    let Json(request) = body?;
    let peer = peer_ip(info);
    let outcome = ctx
        .blocking(move |core| -> Result<Outcome, ApiError> {
            let mut warnings = Notices::new();
            require_admin(core, peer, &mut warnings)?;
            check_record_id(&id)?;
            let mut outcome =
                screening::edit(core, &id, request.user_name.as_deref(), &request.values)?;
            for warning in warnings.as_slice() {
                outcome.warnings.warn(warning.clone());
            }
            Ok(outcome)
        })
        .await??;
    Ok(Json(outcome))
}

/// `DELETE /api/admin/diagnoses/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    info: Option<ConnectInfo<SocketAddr>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let peer = peer_ip(info);
    let response = ctx
        .blocking(move |core| -> Result<DeleteResponse, ApiError> {
            let mut warnings = Notices::new();
            require_admin(core, peer, &mut warnings)?;
            check_record_id(&id)?;
            let deleted = diagnoses::remove(&core.gateway, &id, &mut warnings);
            tracing::info!(id = %id, deleted, "Diagnosis deleted");
            Ok(DeleteResponse {
                id,
                deleted,
                warnings,
            })
        })
        .await??;
    Ok(Json(response))
}
