use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{
    auth::guard::AuthSubject,
    dto::auth::{
        LoginRequest, LoginResponse, LogoutResponse, RefreshRequest, RefreshResponse,
        RegisterRequest, RegisterResponse, SessionResponse,
    },
    errors::AppError,
    models::user::UserPublic,
    services::{auth_service, session_service},
    state::AppState,
};

fn require_refresh_token(req: &RefreshRequest) -> Result<&str, AppError> {
    let token = req.refresh_token.trim();
    if token.is_empty() {
        return Err(AppError::Validation("refresh_token required".into()));
    }
    Ok(token)
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let out = auth_service::register(&state, req).await?;

    Ok(Json(RegisterResponse {
        user: out.user,
        access_token: out.tokens.access_token,
        refresh_token: out.tokens.refresh_token,
        token_type: out.tokens.token_type,
        expires_in: out.tokens.expires_in,
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let tokens = auth_service::login(&state, req).await?;

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: tokens.token_type,
        expires_in: tokens.expires_in,
    }))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    let token = require_refresh_token(&req)?;
    let renewed = session_service::renew(&state, token).await?;

    Ok(Json(RefreshResponse {
        access_token: renewed.access_token,
        token_type: renewed.token_type,
        expires_in: renewed.expires_in,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<LogoutResponse>, AppError> {
    let token = require_refresh_token(&req)?;
    session_service::terminate(&state, token).await?;

    Ok(Json(LogoutResponse { status: "ok" }))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthSubject(identity): AuthSubject,
) -> Result<Json<UserPublic>, AppError> {
    Ok(Json(auth_service::me(&state, &identity.id).await?))
}

pub async fn session(AuthSubject(identity): AuthSubject) -> Json<SessionResponse> {
    Json(identity.into())
}
