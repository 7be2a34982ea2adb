use std::sync::Arc;

use mongodb::{options::ClientOptions, Client};
use thiserror::Error;

use crate::{
    auth::jwt::{CredentialSigner, SigningFault},
    config::Config,
    store::{
        accounts::{AccountStore, MemoryAccountStore, MongoAccountStore},
        refresh::{MemoryRefreshStore, MongoRefreshStore, RefreshStore},
    },
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Signing(#[from] SigningFault),

    #[error("database: {0}")]
    Db(#[from] mongodb::error::Error),
}

/// Process-wide state, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub signer: Arc<CredentialSigner>,
    pub accounts: Arc<dyn AccountStore>,
    pub refresh_tokens: Arc<dyn RefreshStore>,
}

impl AppState {
    pub async fn new(cfg: &Config) -> Result<Self, StartupError> {
        let signer = CredentialSigner::from_config(cfg)?;

        let Some(uri) = cfg.mongodb_uri.as_deref() else {
            tracing::warn!("MONGODB_URI not set, sessions are kept in memory only");
            return Ok(Self::in_memory(cfg.clone(), signer));
        };

        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("session-tokens".to_string());
        let client = Client::with_options(opts)?;
        let db = client.database(&cfg.db_name);

        let accounts = MongoAccountStore::init(&db).await?;
        let refresh_tokens = MongoRefreshStore::init(&db).await?;
        tracing::info!(db = %cfg.db_name, "connected to mongodb");

        Ok(Self {
            cfg: Arc::new(cfg.clone()),
            signer: Arc::new(signer),
            accounts: Arc::new(accounts),
            refresh_tokens: Arc::new(refresh_tokens),
        })
    }

    pub fn in_memory(cfg: Config, signer: CredentialSigner) -> Self {
        Self {
            cfg: Arc::new(cfg),
            signer: Arc::new(signer),
            accounts: Arc::new(MemoryAccountStore::new()),
            refresh_tokens: Arc::new(MemoryRefreshStore::new()),
        }
    }
}
