use tracing::warn;

use shared::models::{Dependency, DependencyStatus, HealthResponse};
use crate::{error::deadline, routes::AppState};

pub const SERVICE_NAME: &str = "vote-service";

/// Pings one dependency and mirrors the result into its connection gauge.
/// Nothing is cached between probes.
pub async fn probe(state: &AppState, dependency: Dependency) -> DependencyStatus {
    let limit = state.config.dependency_timeout;
    let result = match dependency {
        Dependency::Queue => deadline(dependency, limit, state.queue.ping()).await,
        Dependency::Store => deadline(dependency, limit, state.store.ping()).await,
    };
    if let Err(e) = &result {
        warn!("Health probe failed: {}", e);
    }

    let up = result.is_ok();
    state.metrics.set_dependency_up(dependency, up);
    DependencyStatus { dependency, up }
}

/// Process liveness: the overall status stays `OK` whatever the probes say.
pub async fn health_report(state: &AppState) -> HealthResponse {
    let (queue, store) = futures::join!(
        probe(state, Dependency::Queue),
        probe(state, Dependency::Store)
    );
    HealthResponse::new(SERVICE_NAME, &state.config.hostname, queue, store)
}
