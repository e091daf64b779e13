/// Refresh Token Revocation
///
/// Every refresh token is single-use. Once exchanged, the raw token string
/// is added to a Redis set; presenting it again is a replay.
///
/// Entries are never removed. A consumed token stops mattering once its own
/// `exp` has passed, so growth is bounded by the refresh TTL times the
/// refresh rate.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::{AppError, WithOp};

#[async_trait]
pub trait RevocationTracker: Send + Sync {
    /// `Ok(false)` for an unknown token; `Err` only when the cache is unreachable.
    async fn is_consumed(&self, token: &str) -> Result<bool, AppError>;

    /// Idempotent insert.
    ///
    /// Returns `true` if this call added the token and `false` if it was
    /// already present. Both are successes.
    async fn mark_consumed(&self, token: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct RedisRevocationTracker {
    connection: ConnectionManager,
    set_key: String,
}

impl RedisRevocationTracker {
    pub fn new(connection: ConnectionManager, set_key: impl Into<String>) -> Self {
        Self {
            connection,
            set_key: set_key.into(),
        }
    }
}

#[async_trait]
impl RevocationTracker for RedisRevocationTracker {
    async fn is_consumed(&self, token: &str) -> Result<bool, AppError> {
        const OP: &str = "cache.redis.is_consumed";

        let mut conn = self.connection.clone();
        let found: bool = conn.sismember(&self.set_key, token).await.with_op(OP)?;

        Ok(found)
    }

    async fn mark_consumed(&self, token: &str) -> Result<bool, AppError> {
        const OP: &str = "cache.redis.mark_consumed";

        let mut conn = self.connection.clone();
        // SADD reports how many members were actually added
        let added: i64 = conn.sadd(&self.set_key, token).await.with_op(OP)?;

        if added == 0 {
            tracing::warn!(set = %self.set_key, "Refresh token was already marked consumed");
        }

        Ok(added > 0)
    }
}
