use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use shared::models::Dependency;
use crate::{
    config::Config,
    error::{deadline, ServiceError},
    queries::Queries,
};

/// Settled vote rows written by the external worker.
#[rocket::async_trait]
pub trait VoteStore: Send + Sync {
    async fn count_votes_by_option(&self) -> Result<Vec<(String, i64)>, ServiceError>;
    async fn ping(&self) -> Result<(), ServiceError>;
    async fn close(&self) {}
}

pub struct PgVoteStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgVoteStore {
    /// Builds a lazily-connecting pool; nothing is dialed until the first query.
    pub fn connect_lazy(config: &Config) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.database_host)
            .port(config.database_port)
            .username(&config.database_user)
            .password(&config.database_password)
            .database(&config.database_name);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(config.dependency_timeout)
            .connect_lazy_with(options);

        Self { pool, timeout: config.dependency_timeout }
    }
}

#[rocket::async_trait]
impl VoteStore for PgVoteStore {
    async fn count_votes_by_option(&self) -> Result<Vec<(String, i64)>, ServiceError> {
        deadline(Dependency::Store, self.timeout, async {
            Queries::count_votes_by_option(&self.pool)
                .await
                .map_err(ServiceError::from_sqlx)
        })
        .await
    }

    async fn ping(&self) -> Result<(), ServiceError> {
        deadline(Dependency::Store, self.timeout, async {
            Queries::ping(&self.pool)
                .await
                .map_err(|e| ServiceError::unavailable(Dependency::Store, e))
        })
        .await
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("🔒 Database pool closed");
    }
}
