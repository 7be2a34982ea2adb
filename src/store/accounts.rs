use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime},
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tokio::sync::RwLock;

use crate::{
    errors::AppError,
    models::user::{Account, NewAccount, UserDoc},
};

/// Account records the session core gets its identities from.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create(&self, new: NewAccount) -> Result<Account, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;
}

fn duplicate() -> AppError {
    AppError::Conflict("user already exists".into())
}

#[derive(Default)]
struct Accounts {
    next_id: u64,
    by_id: HashMap<String, Account>,
}

#[derive(Default)]
pub struct MemoryAccountStore {
    inner: RwLock<Accounts>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, new: NewAccount) -> Result<Account, AppError> {
        let mut inner = self.inner.write().await;
        if inner.by_id.values().any(|a| a.email == new.email) {
            return Err(duplicate());
        }

        inner.next_id += 1;
        let account = Account {
            id: inner.next_id.to_string(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            created_at: Utc::now(),
        };
        inner.by_id.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.by_id.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self.inner.read().await.by_id.get(id).cloned())
    }
}

pub struct MongoAccountStore {
    users: Collection<UserDoc>,
}

impl MongoAccountStore {
    pub async fn init(db: &Database) -> mongodb::error::Result<Self> {
        let users: Collection<UserDoc> = db.collection("users");
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(email_index).await?;
        Ok(Self { users })
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == 11000
    )
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn create(&self, new: NewAccount) -> Result<Account, AppError> {
        if self.find_by_email(&new.email).await?.is_some() {
            return Err(duplicate());
        }

        let user = UserDoc {
            id: ObjectId::new(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            created_at: BsonDateTime::now(),
        };

        match self.users.insert_one(&user).await {
            Ok(_) => Ok(user.into()),
            // lost a race with a concurrent registration
            Err(e) if is_duplicate_key(&e) => Err(duplicate()),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let user = self.users.find_one(doc! { "email": email }).await?;
        Ok(user.map(Account::from))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        let user = self.users.find_one(doc! { "_id": oid }).await?;
        Ok(user.map(Account::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            name: "Alice".into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn created_account_is_found_both_ways() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("a@x.com")).await.unwrap();

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(by_id.email, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryAccountStore::new();
        store.create(new_account("a@x.com")).await.unwrap();
        let err = store.create(new_account("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_lookups_are_none() {
        let store = MemoryAccountStore::new();
        assert!(store.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(store.find_by_id("999").await.unwrap().is_none());
    }
}
