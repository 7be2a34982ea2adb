use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::Config,
    errors::AppError,
    models::{identity::Identity, jwt::Claims},
};

/// Which secret a credential is signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Access,
    Refresh,
}

impl KeyClass {
    pub fn typ(self) -> &'static str {
        match self {
            KeyClass::Access => "access",
            KeyClass::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("credential expired")]
    Expired,
    #[error("credential signature invalid")]
    SignatureInvalid,
    #[error("credential malformed")]
    Malformed,
}

/// Misconfigured signing keys. Fatal at startup.
#[derive(Debug, Error)]
#[error("signing fault: {0}")]
pub struct SigningFault(pub String);

#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MintedCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies self-contained credentials, one secret per key class.
#[derive(Clone)]
pub struct CredentialSigner {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
    validation: Validation,
    shape: Validation,
}

impl CredentialSigner {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, SigningFault> {
        if access_secret.is_empty() || refresh_secret.is_empty() {
            return Err(SigningFault("signing secrets must not be empty".into()));
        }
        if access_secret == refresh_secret {
            return Err(SigningFault(
                "access and refresh secrets must differ".into(),
            ));
        }
        if access_ttl <= Duration::zero() || refresh_ttl <= Duration::zero() {
            return Err(SigningFault("token ttl must be positive".into()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        // decodes the payload without trusting it, used to classify before verifying
        let mut shape = Validation::new(Algorithm::HS256);
        shape.insecure_disable_signature_validation();
        shape.validate_exp = false;
        shape.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            access: Keys::from_secret(access_secret.as_bytes()),
            refresh: Keys::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            validation,
            shape,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, SigningFault> {
        Self::new(
            &cfg.jwt_access_secret,
            &cfg.jwt_refresh_secret,
            Duration::seconds(cfg.jwt_access_ttl_seconds),
            Duration::seconds(cfg.jwt_refresh_ttl_seconds),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn issue_access(&self, identity: &Identity) -> Result<MintedCredential, AppError> {
        self.mint(identity, KeyClass::Access, Utc::now())
    }

    pub fn issue_refresh(&self, identity: &Identity) -> Result<MintedCredential, AppError> {
        self.mint(identity, KeyClass::Refresh, Utc::now())
    }

    pub(crate) fn mint(
        &self,
        identity: &Identity,
        class: KeyClass,
        issued_at: DateTime<Utc>,
    ) -> Result<MintedCredential, AppError> {
        let (keys, ttl) = match class {
            KeyClass::Access => (&self.access, self.access_ttl),
            KeyClass::Refresh => (&self.refresh, self.refresh_ttl),
        };
        let expires_at = issued_at + ttl;

        let claims = Claims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            typ: class.typ().into(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| AppError::Signing(format!("jwt encode: {e}")))?;

        Ok(MintedCredential { token, expires_at })
    }

    pub fn verify(&self, token: &str, class: KeyClass) -> Result<Identity, VerifyError> {
        let unverified = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &self.shape)
            .map_err(|_| VerifyError::Malformed)?;

        // expiry wins over the signature check
        if is_expired(unverified.claims.exp, Utc::now().timestamp()) {
            return Err(VerifyError::Expired);
        }

        let keys = match class {
            KeyClass::Access => &self.access,
            KeyClass::Refresh => &self.refresh,
        };
        let data = decode::<Claims>(token, &keys.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                _ => VerifyError::SignatureInvalid,
            }
        })?;

        if data.claims.typ != class.typ() {
            return Err(VerifyError::SignatureInvalid);
        }

        Ok(data.claims.identity())
    }
}

/// Valid up to and including the `exp` second.
fn is_expired(exp: i64, now: i64) -> bool {
    now > exp
}
