use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use thiserror::Error;

use crate::{
    auth::jwt::{CredentialSigner, KeyClass, VerifyError},
    errors::AppError,
    models::identity::Identity,
    state::AppState,
};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    #[error("missing credential")]
    MissingCredential,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("credential expired")]
    CredentialExpired,
    #[error("credential invalid")]
    CredentialInvalid,
}

impl GuardRejection {
    pub fn code(self) -> &'static str {
        match self {
            GuardRejection::MissingCredential => "missing_credential",
            GuardRejection::MalformedCredential => "malformed_credential",
            GuardRejection::CredentialExpired => "credential_expired",
            GuardRejection::CredentialInvalid => "credential_invalid",
        }
    }
}

/// Checks an access credential. Stateless: the refresh store is never consulted.
pub fn guard(
    signer: &CredentialSigner,
    credential: Option<&str>,
) -> Result<Identity, GuardRejection> {
    let token = credential.ok_or(GuardRejection::MissingCredential)?;
    if token.trim().is_empty() {
        return Err(GuardRejection::MalformedCredential);
    }

    signer
        .verify(token, KeyClass::Access)
        .map_err(|e| match e {
            VerifyError::Malformed => GuardRejection::MalformedCredential,
            VerifyError::Expired => GuardRejection::CredentialExpired,
            VerifyError::SignatureInvalid => GuardRejection::CredentialInvalid,
        })
}

/// Subject of a request that carried a valid bearer access token.
#[derive(Debug, Clone)]
pub struct AuthSubject(pub Identity);

impl FromRequestParts<Arc<AppState>> for AuthSubject {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
            Ok(TypedHeader(Authorization(bearer))) => Some(bearer),
            Err(rejection) if rejection.is_missing() => None,
            Err(_) => return Err(GuardRejection::MalformedCredential.into()),
        };

        let identity = guard(&state.signer, bearer.as_ref().map(|b| b.token()))?;
        tracing::debug!(subject = %identity.id, "access granted");
        Ok(Self(identity))
    }
}
