use crate::{
    dto::auth::{LoginRequest, RegisterRequest},
    errors::AppError,
    models::user::{NewAccount, UserPublic},
    password::{hash_password, verify_password},
    services::session_service::{issue_session, IssuedTokens},
    state::AppState,
};

pub struct RegisterOutput {
    pub user: UserPublic,
    pub tokens: IssuedTokens,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<RegisterOutput, AppError> {
    let email = normalize_email(&req.email);
    let name = req.name.trim().to_string();

    if email.is_empty() || name.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email/name/password required".into()));
    }

    let password_hash = hash_password(&req.password)?;

    let account = state
        .accounts
        .create(NewAccount {
            email,
            name,
            password_hash,
        })
        .await?;
    tracing::info!(subject = %account.id, "account registered");

    let tokens = issue_session(state, &account.identity()).await?;

    Ok(RegisterOutput {
        user: UserPublic::from(account),
        tokens,
    })
}

/// Unknown email and wrong password fail the same way.
pub async fn login(state: &AppState, req: LoginRequest) -> Result<IssuedTokens, AppError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation("email/password required".into()));
    }

    let account = state
        .accounts
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.password, &account.password_hash)? {
        tracing::debug!(subject = %account.id, "password mismatch");
        return Err(AppError::Unauthorized);
    }

    issue_session(state, &account.identity()).await
}

pub async fn me(state: &AppState, user_id: &str) -> Result<UserPublic, AppError> {
    let account = state
        .accounts
        .find_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(account.into())
}
