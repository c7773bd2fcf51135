//! User directory: where per-user API keys are looked up.

use std::collections::BTreeMap;

use async_trait::async_trait;
use kanau::processor::Processor;

use super::credential::PrincipalId;
use crate::entities::user_meta::{FindUsersByPublicKey, GetUserPrivateKey};
use crate::framework::DatabaseProcessor;

/// Errors a user directory can report.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only access to the per-user key metadata.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Ids of users whose stored public key equals `public_key`, lowest
    /// first, at most `limit` of them.
    async fn find_users_by_public_key(
        &self,
        public_key: &str,
        limit: i64,
    ) -> Result<Vec<PrincipalId>, DirectoryError>;

    /// The private key stored for `user`, if any.
    async fn private_key(&self, user: PrincipalId) -> Result<Option<String>, DirectoryError>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

/// User directory backed by the `user_meta` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    processor: DatabaseProcessor,
}

impl PgUserDirectory {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self {
            processor: DatabaseProcessor { pool },
        }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_users_by_public_key(
        &self,
        public_key: &str,
        limit: i64,
    ) -> Result<Vec<PrincipalId>, DirectoryError> {
        let ids = self
            .processor
            .process(FindUsersByPublicKey {
                public_key: public_key.to_string(),
                limit,
            })
            .await?;
        Ok(ids.into_iter().map(PrincipalId).collect())
    }

    async fn private_key(&self, user: PrincipalId) -> Result<Option<String>, DirectoryError> {
        Ok(self
            .processor
            .process(GetUserPrivateKey { user_id: user.0 })
            .await?)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
struct UserKeys {
    public_key: Option<String>,
    private_key: Option<String>,
}

/// User directory held in memory. Used for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: BTreeMap<PrincipalId, UserKeys>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user holding both keys.
    pub fn with_user(
        mut self,
        user: PrincipalId,
        public_key: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        self.users.insert(
            user,
            UserKeys {
                public_key: Some(public_key.into()),
                private_key: Some(private_key.into()),
            },
        );
        self
    }

    /// Add a user that has a public key but no private key.
    pub fn with_public_key_only(mut self, user: PrincipalId, public_key: impl Into<String>) -> Self {
        self.users.insert(
            user,
            UserKeys {
                public_key: Some(public_key.into()),
                private_key: None,
            },
        );
        self
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_users_by_public_key(
        &self,
        public_key: &str,
        limit: i64,
    ) -> Result<Vec<PrincipalId>, DirectoryError> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .users
            .iter()
            .filter(|(_, keys)| keys.public_key.as_deref() == Some(public_key))
            .map(|(id, _)| *id)
            .take(limit)
            .collect())
    }

    async fn private_key(&self, user: PrincipalId) -> Result<Option<String>, DirectoryError> {
        Ok(self
            .users
            .get(&user)
            .and_then(|keys| keys.private_key.clone()))
    }
}
