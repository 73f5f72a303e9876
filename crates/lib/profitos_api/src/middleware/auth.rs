//! Bearer authentication middleware.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use profitos_core::models::auth::AccessIdentity;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Identity of the caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub AccessIdentity);

/// Extracts `Authorization: Bearer <token>`, verifies it and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let sessions = state.sessions()?;

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let identity = sessions.authenticate(token).inspect_err(|e| {
        debug!(error = %e, "bearer token rejected");
    })?;

    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}
