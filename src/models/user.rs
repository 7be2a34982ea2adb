use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

use crate::models::identity::Identity;

/// Account record as the account store hands it out.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.email.clone())
    }
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub email: String,
    pub name: String,

    pub password_hash: String,
    pub created_at: BsonDateTime,
}

impl From<UserDoc> for Account {
    fn from(u: UserDoc) -> Self {
        Self {
            id: u.id.to_hex(),
            email: u.email,
            name: u.name,
            password_hash: u.password_hash,
            created_at: bson_to_chrono(u.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: String,
}

impl From<Account> for UserPublic {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            name: a.name,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

fn bson_to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    let ms = dt.timestamp_millis();
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}
