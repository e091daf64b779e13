use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::{AppError, WithOp};

/// Fire-and-forget channel towards the out-of-process mailer
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Enqueue a password-reset request. Success means the message was
    /// accepted by the channel, not that an email was sent.
    async fn publish_password_reset(&self, email: &str) -> Result<(), AppError>;
}

/// Pushes the raw email string onto a Redis list that mail workers pop from.
#[derive(Clone)]
pub struct RedisQueueChannel {
    connection: ConnectionManager,
    queue_name: String,
}

impl RedisQueueChannel {
    pub fn new(connection: ConnectionManager, queue_name: impl Into<String>) -> Self {
        Self {
            connection,
            queue_name: queue_name.into(),
        }
    }
}

#[async_trait]
impl NotificationChannel for RedisQueueChannel {
    async fn publish_password_reset(&self, email: &str) -> Result<(), AppError> {
        const OP: &str = "broker.redis.publish_password_reset";

        let mut conn = self.connection.clone();
        let depth: i64 = conn
            .rpush(&self.queue_name, email)
            .await
            .map_err(|e| AppError::Broker(e.to_string()))
            .with_op(OP)?;

        tracing::debug!(queue = %self.queue_name, depth, "Password reset enqueued");
        Ok(())
    }
}
