use std::sync::Arc;

use backend::{
    config::Config,
    queue::{QueueStore, RedisQueue},
    routes::AppState,
    store::{PgVoteStore, VoteStore},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚀 Starting vote service");

    let config = Config::load();
    let queue: Arc<dyn QueueStore> = Arc::new(RedisQueue::new(&config.redis_url(), config.dependency_timeout)?);
    let store: Arc<dyn VoteStore> = Arc::new(PgVoteStore::connect_lazy(&config));
    let refresh_interval = config.refresh_interval;

    let state = AppState::new(config, Arc::clone(&queue), Arc::clone(&store))?;
    let aggregator = Arc::clone(&state.aggregator);

    let rocket = backend::build(state).ignite().await?;
    let aggregator_task = tokio::spawn(aggregator.run(refresh_interval, rocket.shutdown()));

    let launched = rocket.launch().await;

    info!("🛑 Shutting down");
    // A failed launch never fires the shutdown signal.
    if launched.is_err() {
        aggregator_task.abort();
    }
    match aggregator_task.await {
        Err(e) if !e.is_cancelled() => error!("Metrics aggregator task failed: {}", e),
        _ => {}
    }
    queue.close().await;
    store.close().await;

    launched?;
    Ok(())
}
