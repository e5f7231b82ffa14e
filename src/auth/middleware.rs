//! Axum extractors forming the request pipeline.
//!
//! Order per request: bearer token → session validation → membership gate
//! → handler. Each stage is terminal on failure, and handlers only see the
//! neighborhood resolved by the gate.

use crate::auth::session::{Session, SessionIssuer};
use crate::config::Config;
use crate::error::AppError;
use crate::gate::{Membership, MembershipGate};
use crate::ledger::Ledger;
use crate::storage::PostStore;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Clients are built once at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionIssuer>,
    pub gate: MembershipGate,
    pub ledger: Arc<dyn Ledger>,
    pub posts: Arc<dyn PostStore>,
}

impl AppState {
    pub fn new(config: Config, ledger: Arc<dyn Ledger>, posts: Arc<dyn PostStore>) -> Self {
        let sessions = SessionIssuer::new(config.session_secret.as_bytes(), config.session_ttl_secs);
        let gate = MembershipGate::new(ledger.clone(), config.ledger_timeout());
        Self {
            config: Arc::new(config),
            sessions: Arc::new(sessions),
            gate,
            ledger,
            posts,
        }
    }
}

/// Identity and membership established for a gated request.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub session: Session,
    pub membership: Membership,
}

/// Parse `Authorization: Bearer {token}`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized: No token provided".to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Unauthorized: No token provided".to_string()))
}

/// Stage 1: who is calling.
pub fn authenticate(sessions: &SessionIssuer, headers: &HeaderMap) -> Result<Session, AppError> {
    let token = bearer_token(headers)?;
    sessions
        .validate(token)
        .map_err(|_| AppError::Unauthorized("Unauthorized: Invalid token".to_string()))
}

/// Stage 2: may they see their neighborhood.
pub async fn authorize(gate: &MembershipGate, session: Session) -> Result<RequestContext, AppError> {
    let membership = gate.check(&session.address).await?;
    Ok(RequestContext {
        session,
        membership,
    })
}

/// Authenticated session extractor.
///
/// Extracts session from `Authorization: Bearer {token}` header.
/// Returns 401 Unauthorized if missing or invalid.
#[derive(Debug, Clone, Copy)]
pub struct AuthSession(pub Session);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(&state.sessions, &parts.headers).map(AuthSession)
    }
}

/// Authenticated and membership-gated extractor.
///
/// Runs [`AuthSession`] first, then the gate.
/// Returns 403 Forbidden on denial, 500 if the ledger cannot answer.
#[derive(Debug, Clone, Copy)]
pub struct GatedSession(pub RequestContext);

impl FromRequestParts<AppState> for GatedSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthSession(session) = AuthSession::from_request_parts(parts, state).await?;
        authorize(&state.gate, session).await.map(GatedSession)
    }
}
