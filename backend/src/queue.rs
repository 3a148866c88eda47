use std::time::Duration;

use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use shared::models::Dependency;
use crate::error::{deadline, ServiceError};

pub const VOTES_KEY: &str = "votes";

/// Append-only list the external worker drains.
#[rocket::async_trait]
pub trait QueueStore: Send + Sync {
    async fn publish(&self, payload: &str) -> Result<(), ServiceError>;
    async fn ping(&self) -> Result<(), ServiceError>;
    async fn close(&self) {}
}

pub struct RedisQueue {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisQueue {
    /// Parses the URL only; the first connection is made on first use so the
    /// service can start while Redis is still down.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::open(url).map_err(ServiceError::from_redis)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, ServiceError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                // One quick retry, so a refused connection fails fast instead
                // of backing off until the deadline.
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(self.timeout)
                    .set_response_timeout(self.timeout);
                let manager = deadline(Dependency::Queue, self.timeout, async {
                    self.client
                        .get_connection_manager_with_config(config)
                        .await
                        .map_err(ServiceError::from_redis)
                })
                .await?;
                info!("🔌 Connected to Redis");
                Ok::<_, ServiceError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[rocket::async_trait]
impl QueueStore for RedisQueue {
    async fn publish(&self, payload: &str) -> Result<(), ServiceError> {
        let mut conn = self.connection().await?;
        let len: i64 = deadline(Dependency::Queue, self.timeout, async {
            conn.rpush(VOTES_KEY, payload).await.map_err(ServiceError::from_redis)
        })
        .await?;
        debug!("Queue length after publish: {}", len);
        Ok(())
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        let mut conn = self.connection().await?;
        let _pong: String = deadline(Dependency::Queue, self.timeout, async {
            redis::cmd("PING").query_async(&mut conn).await.map_err(ServiceError::from_redis)
        })
        .await?;
        Ok(())
    }
}
