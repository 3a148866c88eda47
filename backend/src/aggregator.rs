use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use shared::models::{AggregateStats, Dependency, VoteOption};
use crate::{
    error::{deadline, ServiceError},
    metrics::VoteMetrics,
    store::VoteStore,
};

struct Published {
    seq: u64,
    stats: Arc<AggregateStats>,
}

/// Keeps an in-memory copy of the vote totals held by the relational store.
///
/// Each cycle rebuilds the whole [`AggregateStats`] and swaps it in with a
/// single assignment, so readers see either the previous or the new snapshot.
/// A failed cycle leaves the previous snapshot in place. Cycles are numbered
/// when they start; a cycle that finishes after a later-started one has
/// already published is dropped, so the snapshot never moves backwards.
pub struct MetricsAggregator {
    store: Arc<dyn VoteStore>,
    metrics: Arc<VoteMetrics>,
    timeout: Duration,
    next_seq: AtomicU64,
    published: RwLock<Published>,
}

impl MetricsAggregator {
    pub fn new(store: Arc<dyn VoteStore>, metrics: Arc<VoteMetrics>, timeout: Duration) -> Self {
        Self {
            store,
            metrics,
            timeout,
            next_seq: AtomicU64::new(0),
            published: RwLock::new(Published {
                seq: 0,
                stats: Arc::new(AggregateStats::empty()),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<AggregateStats> {
        let guard = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.stats)
    }

    /// Swaps `stats` in unless a later cycle got there first. Gauges move
    /// under the same lock so they always describe the published snapshot.
    fn publish(&self, seq: u64, stats: AggregateStats) -> (Arc<AggregateStats>, bool) {
        let mut published = self.published.write().unwrap_or_else(PoisonError::into_inner);
        if seq <= published.seq {
            return (Arc::clone(&published.stats), false);
        }

        let stats = Arc::new(stats);
        *published = Published { seq, stats: Arc::clone(&stats) };
        self.metrics.publish_aggregate(&stats);
        (stats, true)
    }

    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Arc<AggregateStats>, ServiceError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let rows = deadline(Dependency::Store, self.timeout, self.store.count_votes_by_option()).await;

        match rows {
            Ok(rows) => {
                self.metrics.set_dependency_up(Dependency::Store, true);
                let (stats, fresh) = self.publish(seq, AggregateStats::from_rows(rows, OffsetDateTime::now_utc()));
                if !fresh {
                    debug!("Dropped aggregation cycle {} superseded by a later one", seq);
                    return Ok(stats);
                }
                info!(
                    "Metrics updated: {}={}, {}={}, total={}",
                    VoteOption::A,
                    stats.count(VoteOption::A),
                    VoteOption::B,
                    stats.count(VoteOption::B),
                    stats.total_votes
                );
                Ok(stats)
            }
            Err(e) => {
                self.metrics.set_dependency_up(Dependency::Store, false);
                error!("Error updating database metrics: {}", e);
                Err(e)
            }
        }
    }

    /// Refreshes on every tick until `shutdown` resolves. The first tick
    /// fires immediately. Failed cycles are retried on the next tick.
    pub async fn run(self: Arc<Self>, period: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("📊 Metrics aggregator started (every {:?})", period);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let _ = self.refresh().await;
                }
            }
        }

        info!("📊 Metrics aggregator stopped");
    }
}
