//! Auth API endpoints.

use crate::auth::middleware::AppState;
use crate::auth::verify;
use crate::error::AppError;
use crate::models::{Address, VerifySignatureRequest, VerifySignatureResponse};
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};

/// POST /auth/verify-signature: Exchange a signed challenge for a session token
pub async fn verify_signature(
    State(state): State<AppState>,
    payload: Result<Json<VerifySignatureRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let (address, signature) = match (req.address, req.signature) {
        (Some(address), Some(signature)) if !address.is_empty() && !signature.is_empty() => {
            (address, signature)
        }
        _ => {
            return Err(AppError::BadRequest(
                "Address and signature are required.".to_string(),
            ))
        }
    };

    let address = address
        .parse::<Address>()
        .map_err(|e| AppError::BadRequest(format!("Invalid address: {}", e)))?;

    if !verify::verify_signature(&address, &state.config.challenge_message, &signature) {
        tracing::warn!(action = "auth_failed", address = %address, "Invalid signature");
        return Err(AppError::Unauthorized("Invalid signature.".to_string()));
    }

    let token = state.sessions.issue(&address)?;

    tracing::info!(action = "auth_success", address = %address, "Wallet authenticated");

    Ok(Json(VerifySignatureResponse { token }))
}
