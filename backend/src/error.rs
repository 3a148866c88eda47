use std::future::Future;
use std::time::Duration;

use shared::models::Dependency;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable {
        dependency: Dependency,
        reason: String,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Aggregation failed: {0}")]
    AggregationFailure(String),
    #[error("Session token could not be generated")]
    SessionUnavailable,
}

impl ServiceError {
    pub fn unavailable(dependency: Dependency, reason: impl ToString) -> Self {
        ServiceError::DependencyUnavailable {
            dependency,
            reason: reason.to_string(),
        }
    }

    pub fn timed_out(dependency: Dependency) -> Self {
        Self::unavailable(dependency, "timed out")
    }

    pub fn from_redis(e: redis::RedisError) -> Self {
        Self::unavailable(Dependency::Queue, e)
    }

    pub fn from_sqlx(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => Self::unavailable(Dependency::Store, e),
            other => ServiceError::AggregationFailure(other.to_string()),
        }
    }

    /// Dependency whose status gauge must be lowered for this error, if any.
    pub fn dependency(&self) -> Option<Dependency> {
        match self {
            ServiceError::DependencyUnavailable { dependency, .. } => Some(*dependency),
            ServiceError::AggregationFailure(_) => Some(Dependency::Store),
            ServiceError::InvalidInput(_) | ServiceError::SessionUnavailable => None,
        }
    }
}

/// Bounds a dependency call; running out of time counts as the dependency
/// being unavailable.
pub async fn deadline<T>(
    dependency: Dependency,
    limit: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| ServiceError::timed_out(dependency))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_sqlx_errors() {
        let timeout = ServiceError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(timeout, ServiceError::DependencyUnavailable { dependency: Dependency::Store, .. }));

        let missing = ServiceError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(missing, ServiceError::AggregationFailure(_)));
        assert_eq!(missing.dependency(), Some(Dependency::Store));
    }

    #[test]
    fn input_errors_mark_nothing_down() {
        assert_eq!(ServiceError::InvalidInput("blank".into()).dependency(), None);
        assert_eq!(ServiceError::timed_out(Dependency::Queue).dependency(), Some(Dependency::Queue));
    }

    #[rocket::async_test]
    async fn deadline_turns_a_hang_into_unavailable() {
        let hung = deadline(Dependency::Queue, Duration::from_millis(20), futures::future::pending::<Result<(), ServiceError>>()).await;
        assert!(matches!(hung, Err(ServiceError::DependencyUnavailable { dependency: Dependency::Queue, .. })));

        let quick = deadline(Dependency::Store, Duration::from_millis(20), async { Ok(7) }).await;
        assert_eq!(quick.unwrap(), 7);
    }
}
