use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stored form of a refresh credential. Only the fingerprint is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRecord {
    pub subject_id: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenDoc {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: String,
    pub token_hash: String,

    pub created_at: BsonDateTime,
    pub expires_at: BsonDateTime,
}

impl From<RefreshRecord> for RefreshTokenDoc {
    fn from(r: RefreshRecord) -> Self {
        Self {
            id: ObjectId::new(),
            user_id: r.subject_id,
            token_hash: r.token_hash,
            created_at: BsonDateTime::from_millis(r.created_at.timestamp_millis()),
            expires_at: BsonDateTime::from_millis(r.expires_at.timestamp_millis()),
        }
    }
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}
