//! Location verification endpoint.
//!
//! Authenticated but not gated. Callers use it to acquire
//! the location state the gate later checks.

use crate::auth::middleware::{AppState, AuthSession};
use crate::error::AppError;
use crate::ledger::neighborhood_hash_for;
use crate::models::{VerifyLocationRequest, VerifyLocationResponse};
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};

/// Longest accepted neighborhood identifier.
const MAX_NEIGHBORHOOD_ID_LEN: usize = 128;

/// POST /location/verify: Record the caller's neighborhood on the ledger
pub async fn verify_location(
    AuthSession(session): AuthSession,
    State(state): State<AppState>,
    payload: Result<Json<VerifyLocationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let neighborhood_id = req
        .neighborhood_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("Neighborhood ID is required.".to_string()))?;

    if neighborhood_id.len() > MAX_NEIGHBORHOOD_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "Neighborhood ID exceeds {} bytes.",
            MAX_NEIGHBORHOOD_ID_LEN
        )));
    }

    let location = neighborhood_hash_for(&neighborhood_id);
    let transaction_hash = state
        .ledger
        .verify_location(&session.address, &location)
        .await?;

    tracing::info!(
        action = "location_verified",
        address = %session.address,
        neighborhood = %location,
        tx = %transaction_hash,
        "Location verification submitted"
    );

    Ok(Json(VerifyLocationResponse {
        message: "Location verified successfully.".to_string(),
        transaction_hash,
    }))
}
