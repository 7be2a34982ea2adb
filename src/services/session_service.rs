use crate::{
    auth::jwt::{KeyClass, MintedCredential},
    errors::AppError,
    models::identity::Identity,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
pub struct RenewedAccess {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Mints an access/refresh pair and records the refresh credential.
/// Nothing is handed out unless the record was written.
pub async fn issue_session(state: &AppState, identity: &Identity) -> Result<IssuedTokens, AppError> {
    let access = state.signer.issue_access(identity)?;
    let refresh = state.signer.issue_refresh(identity)?;

    state
        .refresh_tokens
        .insert(&identity.id, &refresh.token, refresh.expires_at)
        .await
        .inspect_err(|e| {
            tracing::error!(subject = %identity.id, error = %e, "refresh token not persisted")
        })?;

    tracing::info!(subject = %identity.id, "session issued");

    Ok(IssuedTokens {
        access_token: access.token,
        refresh_token: refresh.token,
        token_type: "Bearer".to_string(),
        expires_in: state.signer.access_ttl().num_seconds(),
    })
}

/// New access credential for a live refresh credential. The refresh credential is not rotated.
pub async fn renew(state: &AppState, refresh_token: &str) -> Result<RenewedAccess, AppError> {
    let identity = state
        .signer
        .verify(refresh_token, KeyClass::Refresh)
        .map_err(|e| {
            tracing::debug!(reason = %e, "refresh token rejected");
            AppError::InvalidRefresh
        })?;

    // signature alone is not enough, the record must still be there
    if !state
        .refresh_tokens
        .exists(refresh_token, &identity.id)
        .await?
    {
        tracing::debug!(subject = %identity.id, "refresh token revoked or unknown");
        return Err(AppError::InvalidRefresh);
    }

    let MintedCredential { token, .. } = state.signer.issue_access(&identity)?;
    tracing::debug!(subject = %identity.id, "access token renewed");

    Ok(RenewedAccess {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.signer.access_ttl().num_seconds(),
    })
}

/// Revokes a refresh credential. Unknown or malformed values match nothing.
pub async fn terminate(state: &AppState, refresh_token: &str) -> Result<(), AppError> {
    state.refresh_tokens.revoke(refresh_token).await?;
    tracing::info!("refresh token revoked");
    Ok(())
}
