//! Work paper routes: lifecycle, signers and digital signatures.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use auditflow_core::workflow::{NewWorkPaper, Party, WorkPaperStatus};

use crate::{
    AppState,
    error::ApiError,
    extractors::ActingUser,
    routes::{parse_action, required},
};

/// Creates the work paper routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/work-papers", post(create_work_paper))
        .route("/work-papers/{paper_id}", get(get_work_paper))
        .route("/work-papers/{paper_id}/status", patch(update_status))
        .route("/work-papers/{paper_id}/document-link", put(set_document_link))
        .route("/work-papers/{paper_id}/signatures", post(add_signer))
        .route(
            "/work-papers/{paper_id}/signatures/{signature_id}",
            delete(remove_signer),
        )
        .route(
            "/work-papers/{paper_id}/signatures/{signature_id}/decision",
            post(decide_signature),
        )
        .route(
            "/work-papers/{paper_id}/signatures/{signature_id}/reset",
            post(reset_signature),
        )
        .route(
            "/work-papers/{paper_id}/signatures/{signature_id}/sign",
            post(sign_digitally),
        )
        .route(
            "/work-papers/{paper_id}/signatures/{signature_id}/verify",
            post(verify_digitally),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a work paper.
#[derive(Debug, Deserialize)]
pub struct CreateWorkPaperRequest {
    /// Title.
    pub title: String,
    /// Optional document link.
    #[serde(default)]
    pub document_link: Option<String>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status, e.g. `ready_to_sign`.
    pub status: String,
}

/// Request body for replacing the document link.
#[derive(Debug, Deserialize)]
pub struct DocumentLinkRequest {
    /// New link; `null` clears it.
    pub document_link: Option<String>,
}

/// Request body for a signer decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// `sign` or `reject`.
    pub action: String,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/work-papers` - Create a draft work paper.
async fn create_work_paper(
    State(state): State<AppState>,
    Json(payload): Json<CreateWorkPaperRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required(&payload.title, "title")?;
    let paper = state
        .orchestrator
        .create_work_paper(NewWorkPaper {
            title,
            document_link: payload.document_link,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "data": paper }))))
}

/// GET `/work-papers/{paper_id}` - Work paper with its signatures.
async fn get_work_paper(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = state.orchestrator.work_paper_progress(paper_id).await?;
    Ok(Json(json!({ "data": progress })))
}

/// PATCH `/work-papers/{paper_id}/status` - Operator status change.
async fn update_status(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = WorkPaperStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::bad_request(
            "invalid_status",
            format!("Unknown work paper status '{}'", payload.status),
        )
    })?;

    let update = state
        .orchestrator
        .update_work_paper_status(paper_id, target)
        .await?;

    info!(work_paper_id = %paper_id, status = %target, "Work paper status updated via API");
    Ok(Json(json!({ "data": update })))
}

/// PUT `/work-papers/{paper_id}/document-link` - Replace the document link.
async fn set_document_link(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
    Json(payload): Json<DocumentLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let paper = state
        .orchestrator
        .set_document_link(paper_id, payload.document_link)
        .await?;
    Ok(Json(json!({ "data": paper })))
}

/// POST `/work-papers/{paper_id}/signatures` - Assign a signer.
async fn add_signer(
    State(state): State<AppState>,
    Path(paper_id): Path<Uuid>,
    Json(payload): Json<Party>,
) -> Result<impl IntoResponse, ApiError> {
    let party = Party {
        user_id: payload.user_id,
        user_name: required(&payload.user_name, "user_name")?,
        position: payload.position.trim().to_string(),
    };
    let signer = state.orchestrator.add_signer(paper_id, party).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": signer }))))
}

/// DELETE `/work-papers/{paper_id}/signatures/{signature_id}` - Remove a signer.
async fn remove_signer(
    State(state): State<AppState>,
    Path((paper_id, signature_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .orchestrator
        .remove_signer(paper_id, signature_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/work-papers/{paper_id}/signatures/{signature_id}/decision` - Sign or reject.
async fn decide_signature(
    State(state): State<AppState>,
    Path((paper_id, signature_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action = parse_action(&payload.action)?;
    let outcome = state
        .orchestrator
        .decide_signature(paper_id, signature_id, action, payload.notes)
        .await?;
    Ok(Json(json!({ "data": outcome })))
}

/// POST `/work-papers/{paper_id}/signatures/{signature_id}/reset` - Back to pending.
async fn reset_signature(
    State(state): State<AppState>,
    Path((paper_id, signature_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let signer = state
        .orchestrator
        .reset_signature(paper_id, signature_id)
        .await?;
    Ok(Json(json!({ "data": signer })))
}

/// POST `/work-papers/{paper_id}/signatures/{signature_id}/sign` - Sign digitally.
async fn sign_digitally(
    State(state): State<AppState>,
    user: ActingUser,
    Path((paper_id, signature_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .orchestrator
        .sign_digitally(paper_id, signature_id, user.user_id())
        .await?;
    Ok(Json(json!({ "data": outcome })))
}

/// POST `/work-papers/{paper_id}/signatures/{signature_id}/verify` - Verify a signature.
///
/// An invalid signature is still a 200 with `is_valid: false`.
async fn verify_digitally(
    State(state): State<AppState>,
    Path((paper_id, signature_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state
        .orchestrator
        .verify_digitally(paper_id, signature_id)
        .await?;
    Ok(Json(json!({ "data": report })))
}
