use serde::{Deserialize, Serialize};

use crate::models::identity::Identity;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub typ: String, // "access" | "refresh"
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.email.clone())
    }
}
