//! Per-user API key metadata.
//!
//! Keys are stored as user meta rows:
//!
//! | meta_key         | meta_value          |
//! |------------------|---------------------|
//! | `gf_public_key`  | the user's public key  |
//! | `gf_private_key` | the user's private key |

use kanau::processor::Processor;

use crate::framework::DatabaseProcessor;

/// Meta key holding a user's public API key.
pub const PUBLIC_KEY_META: &str = "gf_public_key";

/// Meta key holding a user's private API key.
pub const PRIVATE_KEY_META: &str = "gf_private_key";

/// Find the ids of users whose public key equals `public_key`.
///
/// At most `limit` ids are returned, lowest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindUsersByPublicKey {
    pub public_key: String,
    pub limit: i64,
}

/// Read the private key stored for `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUserPrivateKey {
    pub user_id: i64,
}

impl Processor<FindUsersByPublicKey> for DatabaseProcessor {
    type Output = Vec<i64>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:FindUsersByPublicKey")]
    async fn process(&self, query: FindUsersByPublicKey) -> Result<Vec<i64>, sqlx::Error> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT user_id
            FROM user_meta
            WHERE meta_key = $1
              AND meta_value = $2
            ORDER BY user_id
            LIMIT $3
            "#,
        )
        .bind(PUBLIC_KEY_META)
        .bind(&query.public_key)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().map(|(id,)| id).collect())
    }
}

impl Processor<GetUserPrivateKey> for DatabaseProcessor {
    type Output = Option<String>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetUserPrivateKey")]
    async fn process(&self, query: GetUserPrivateKey) -> Result<Option<String>, sqlx::Error> {
        let key: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT meta_value
            FROM user_meta
            WHERE user_id = $1
              AND meta_key = $2
            ORDER BY umeta_id
            LIMIT 1
            "#,
        )
        .bind(query.user_id)
        .bind(PRIVATE_KEY_META)
        .fetch_optional(&self.pool)
        .await?;
        Ok(key.map(|(value,)| value))
    }
}
