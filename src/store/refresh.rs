use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tokio::sync::RwLock;

use crate::{
    errors::AppError,
    models::refresh_token::{sha256_hex, RefreshRecord, RefreshTokenDoc},
};

/// Durable set of usable refresh credentials.
///
/// A refresh credential is only honoured while a record for it exists, so
/// removing the record is what revokes it. Implementations must make every
/// write visible to calls issued after it returns.
#[async_trait]
pub trait RefreshStore: Send + Sync {
    async fn insert(
        &self,
        subject_id: &str,
        credential: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Matches on both the credential and its owner.
    async fn exists(&self, credential: &str, subject_id: &str) -> Result<bool, AppError>;

    /// Absent credentials are not an error.
    async fn revoke(&self, credential: &str) -> Result<(), AppError>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

fn record(subject_id: &str, credential: &str, expires_at: DateTime<Utc>) -> RefreshRecord {
    RefreshRecord {
        subject_id: subject_id.to_string(),
        token_hash: sha256_hex(credential),
        created_at: Utc::now(),
        expires_at,
    }
}

// keyed by (token_hash, subject_id): equal values held by different subjects are separate records
type RecordKey = (String, String);

fn owner_filter(credential: &str, subject_id: &str) -> Document {
    doc! { "token_hash": sha256_hex(credential), "user_id": subject_id }
}

fn value_filter(credential: &str) -> Document {
    doc! { "token_hash": sha256_hex(credential) }
}

#[derive(Default)]
pub struct MemoryRefreshStore {
    records: RwLock<HashMap<RecordKey, RefreshRecord>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RefreshStore for MemoryRefreshStore {
    async fn insert(
        &self,
        subject_id: &str,
        credential: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let rec = record(subject_id, credential, expires_at);
        let key = (rec.token_hash.clone(), rec.subject_id.clone());
        self.records.write().await.insert(key, rec);
        Ok(())
    }

    async fn exists(&self, credential: &str, subject_id: &str) -> Result<bool, AppError> {
        let key = (sha256_hex(credential), subject_id.to_string());
        Ok(self.records.read().await.contains_key(&key))
    }

    async fn revoke(&self, credential: &str) -> Result<(), AppError> {
        let hash = sha256_hex(credential);
        self.records
            .write()
            .await
            .retain(|(token_hash, _), _| *token_hash != hash);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.expires_at >= now);
        Ok((before - records.len()) as u64)
    }
}

pub struct MongoRefreshStore {
    refresh_tokens: Collection<RefreshTokenDoc>,
}

impl MongoRefreshStore {
    pub async fn init(db: &Database) -> mongodb::error::Result<Self> {
        let refresh_tokens: Collection<RefreshTokenDoc> = db.collection("refresh_tokens");

        let hash_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1, "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        refresh_tokens.create_index(hash_index).await?;

        // server-side sweep of records past expiry
        let ttl_index = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(std::time::Duration::from_secs(0))
                    .build(),
            )
            .build();
        refresh_tokens.create_index(ttl_index).await?;

        Ok(Self { refresh_tokens })
    }
}

#[async_trait]
impl RefreshStore for MongoRefreshStore {
    async fn insert(
        &self,
        subject_id: &str,
        credential: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let doc = RefreshTokenDoc::from(record(subject_id, credential, expires_at));
        self.refresh_tokens.insert_one(doc).await?;
        Ok(())
    }

    async fn exists(&self, credential: &str, subject_id: &str) -> Result<bool, AppError> {
        let found = self
            .refresh_tokens
            .find_one(owner_filter(credential, subject_id))
            .await?;
        Ok(found.is_some())
    }

    async fn revoke(&self, credential: &str) -> Result<(), AppError> {
        self.refresh_tokens
            .delete_many(value_filter(credential))
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let cutoff = BsonDateTime::from_millis(now.timestamp_millis());
        let res = self
            .refresh_tokens
            .delete_many(doc! { "expires_at": { "$lt": cutoff } })
            .await?;
        Ok(res.deleted_count)
    }
}
