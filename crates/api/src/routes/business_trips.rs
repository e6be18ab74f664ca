//! Business trip routes: lifecycle and verificator decisions.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use auditflow_core::workflow::{BusinessTripStatus, NewBusinessTrip, Party};

use crate::{
    AppState,
    error::ApiError,
    routes::{parse_action, required},
};

/// Creates the business trip routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/business-trips", post(create_business_trip))
        .route("/business-trips/{trip_id}", get(get_business_trip))
        .route("/business-trips/{trip_id}/status", patch(update_status))
        .route(
            "/business-trips/{trip_id}/verificators/{verificator_id}/decision",
            post(decide_verification),
        )
        .route(
            "/business-trips/{trip_id}/verificators/{verificator_id}/reset",
            post(reset_verification),
        )
}

/// Request body for creating a business trip.
#[derive(Debug, Deserialize)]
pub struct CreateBusinessTripRequest {
    /// Purpose of the trip.
    pub purpose: String,
    /// Destination.
    pub destination: String,
    /// Parties who must verify the trip.
    #[serde(default)]
    pub verificators: Vec<Party>,
}

/// Request body for a status change.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Target status, e.g. `ready_to_verify`.
    pub status: String,
}

/// Request body for a verificator decision.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// `approve` or `reject`.
    pub action: String,
    /// Optional notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST `/business-trips` - Create a draft trip with its verificators.
async fn create_business_trip(
    State(state): State<AppState>,
    Json(payload): Json<CreateBusinessTripRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let purpose = required(&payload.purpose, "purpose")?;
    let destination = required(&payload.destination, "destination")?;
    let verificators = payload
        .verificators
        .into_iter()
        .map(|p| {
            Ok(Party {
                user_id: p.user_id,
                user_name: required(&p.user_name, "user_name")?,
                position: p.position.trim().to_string(),
            })
        })
        .collect::<Result<Vec<_>, ApiError>>()?;

    let progress = state
        .orchestrator
        .create_business_trip(NewBusinessTrip {
            purpose,
            destination,
            verificators,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "data": progress }))))
}

/// GET `/business-trips/{trip_id}` - Trip with its verificators.
async fn get_business_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = state.orchestrator.business_trip_progress(trip_id).await?;
    Ok(Json(json!({ "data": progress })))
}

/// PATCH `/business-trips/{trip_id}/status` - Operator status change.
///
/// Moving back to `ready_to_verify` reopens every verificator.
async fn update_status(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = BusinessTripStatus::parse(&payload.status).ok_or_else(|| {
        ApiError::bad_request(
            "invalid_status",
            format!("Unknown business trip status '{}'", payload.status),
        )
    })?;

    let update = state
        .orchestrator
        .update_business_trip_status(trip_id, target)
        .await?;

    info!(
        business_trip_id = %trip_id,
        status = %target,
        reopened = update.reopened,
        "Business trip status updated via API"
    );
    Ok(Json(json!({ "data": update })))
}

/// POST `/business-trips/{trip_id}/verificators/{verificator_id}/decision`
async fn decide_verification(
    State(state): State<AppState>,
    Path((trip_id, verificator_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<DecisionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let action = parse_action(&payload.action)?;
    let outcome = state
        .orchestrator
        .decide_verification(trip_id, verificator_id, action, payload.notes)
        .await?;
    Ok(Json(json!({ "data": outcome })))
}

/// POST `/business-trips/{trip_id}/verificators/{verificator_id}/reset`
///
/// Verificators decide once, so this reports `RESET_NOT_SUPPORTED` for any
/// existing verificator.
async fn reset_verification(
    State(state): State<AppState>,
    Path((trip_id, verificator_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let verificator = state
        .orchestrator
        .reset_verification(trip_id, verificator_id)
        .await?;
    Ok(Json(json!({ "data": verificator })))
}
