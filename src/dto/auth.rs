use serde::{Deserialize, Serialize};

use crate::models::{identity::Identity, user::UserPublic};

// Missing fields deserialize as empty and are rejected by the services, so
// they surface as 400 rather than axum's 422.

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserPublic,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize, Debug)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize, Debug)]
pub struct LogoutResponse {
    pub status: &'static str,
}

#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub id: String,
    pub email: String,
}

impl From<Identity> for SessionResponse {
    fn from(i: Identity) -> Self {
        Self {
            id: i.id,
            email: i.email,
        }
    }
}
