//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AuthResponse, CredentialsRequest, RefreshRequest, UserResponse};
use crate::validation;

/// `POST /v1/auth/register`
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    validation::validate_register(&body)?;
    let session = state
        .sessions()?
        .register(&body.email, &body.password)
        .await?;
    Ok(Json(session.into()))
}

/// `POST /v1/auth/login`
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<AuthResponse>> {
    validation::validate_login(&body)?;
    let session = state.sessions()?.login(&body.email, &body.password).await?;
    Ok(Json(session.into()))
}

/// `POST /v1/auth/refresh`: rotate a refresh token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token = validation::refresh_token_of(&body)?
        .ok_or_else(|| AppError::Validation("Refresh token required".into()))?;
    let session = state.sessions()?.refresh(token).await?;
    Ok(Json(session.into()))
}

/// `POST /v1/auth/logout`: revoke the refresh token if one is given.
/// Always 204.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    if let Some(token) = validation::refresh_token_of(&body)? {
        state.sessions()?.revoke(token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /v1/auth/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.sessions()?.current_user(identity.user_id).await?;
    Ok(Json(user.into()))
}
