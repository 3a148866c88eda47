use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use shared::models::{AggregateStats, Dependency, VoteOption};

pub const APP_VERSION: &str = "1.0.0";
pub const UNKNOWN_VOTE_TYPE: &str = "unknown";

const VOTE_BUCKETS: [f64; 9] = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Prometheus registry owned by one service instance. Every collector is
/// registered on construction so `/metrics` always lists the full family set.
pub struct VoteMetrics {
    registry: Registry,
    pub votes_total: IntCounterVec,
    pub active_sessions: IntGauge,
    pub redis_connection_status: IntGauge,
    pub database_connection_status: IntGauge,
    pub vote_processing_duration: Histogram,
    pub database_votes_by_option: IntGaugeVec,
    pub total_votes_in_database: IntGauge,
    pub http_requests_total: IntCounterVec,
    pub http_request_duration: HistogramVec,
}

impl VoteMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let votes_total = IntCounterVec::new(
            Opts::new("votes_total", "Total number of votes casted"),
            &["vote_type"],
        )?;
        let active_sessions = IntGauge::new("active_voting_sessions", "Number of active voting sessions")?;
        let redis_connection_status = IntGauge::new(
            "redis_connection_status",
            "Redis connection status (1=connected, 0=disconnected)",
        )?;
        let database_connection_status = IntGauge::new(
            "database_connection_status",
            "Database connection status (1=connected, 0=disconnected)",
        )?;
        let vote_processing_duration = Histogram::with_opts(
            HistogramOpts::new("vote_processing_duration_seconds", "Time spent processing a vote")
                .buckets(VOTE_BUCKETS.to_vec()),
        )?;
        let database_votes_by_option = IntGaugeVec::new(
            Opts::new("database_votes_by_option", "Current votes in database by option"),
            &["option"],
        )?;
        let total_votes_in_database = IntGauge::new("total_votes_in_database", "Total number of votes in database")?;
        let app_info = IntGaugeVec::new(Opts::new("app_info", "Vote service info"), &["version"])?;
        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "route", "status"],
        )?;
        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
            &["method", "route", "status"],
        )?;

        registry.register(Box::new(votes_total.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;
        registry.register(Box::new(redis_connection_status.clone()))?;
        registry.register(Box::new(database_connection_status.clone()))?;
        registry.register(Box::new(vote_processing_duration.clone()))?;
        registry.register(Box::new(database_votes_by_option.clone()))?;
        registry.register(Box::new(total_votes_in_database.clone()))?;
        registry.register(Box::new(app_info.clone()))?;
        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;

        app_info.with_label_values(&[APP_VERSION]).set(1);
        for label in [VoteOption::A.key(), VoteOption::B.key(), UNKNOWN_VOTE_TYPE] {
            votes_total.with_label_values(&[label]);
        }

        Ok(Self {
            registry,
            votes_total,
            active_sessions,
            redis_connection_status,
            database_connection_status,
            vote_processing_duration,
            database_votes_by_option,
            total_votes_in_database,
            http_requests_total,
            http_request_duration,
        })
    }

    pub fn set_dependency_up(&self, dependency: Dependency, up: bool) {
        let gauge = match dependency {
            Dependency::Queue => &self.redis_connection_status,
            Dependency::Store => &self.database_connection_status,
        };
        gauge.set(i64::from(up));
    }

    #[cfg(test)]
    pub(crate) fn dependency_up(&self, dependency: Dependency) -> bool {
        match dependency {
            Dependency::Queue => self.redis_connection_status.get() == 1,
            Dependency::Store => self.database_connection_status.get() == 1,
        }
    }

    pub fn record_vote(&self, vote_type: &str) {
        self.votes_total.with_label_values(&[vote_type]).inc();
    }

    #[cfg(test)]
    pub(crate) fn votes_recorded(&self, vote_type: &str) -> u64 {
        self.votes_total.with_label_values(&[vote_type]).get()
    }

    pub fn publish_aggregate(&self, stats: &AggregateStats) {
        for option in VoteOption::ALL {
            self.database_votes_by_option
                .with_label_values(&[option.key()])
                .set(clamp(stats.count(option)));
        }
        self.total_votes_in_database.set(clamp(stats.total_votes));
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

fn clamp(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    #[test]
    fn exposes_every_family() {
        let metrics = VoteMetrics::new().unwrap();
        metrics.vote_processing_duration.observe(0.002);
        metrics.http_requests_total.with_label_values(&["GET", "/", "200"]).inc();
        metrics.http_request_duration.with_label_values(&["GET", "/", "200"]).observe(0.01);
        metrics.publish_aggregate(&AggregateStats::empty());
        let text = metrics.render().unwrap();
        for family in [
            "votes_total",
            "active_voting_sessions",
            "redis_connection_status",
            "database_connection_status",
            "vote_processing_duration_seconds",
            "database_votes_by_option",
            "total_votes_in_database",
            "app_info",
            "http_requests_total",
            "http_request_duration_seconds",
        ] {
            assert!(text.contains(family), "missing {family}");
        }
        assert!(text.contains(r#"app_info{version="1.0.0"} 1"#));
    }

    #[test]
    fn aggregate_gauges_follow_snapshot() {
        let metrics = VoteMetrics::new().unwrap();
        let stats = AggregateStats::from_rows([("a", 4i64), ("b", 1)], OffsetDateTime::now_utc());
        metrics.publish_aggregate(&stats);
        assert_eq!(metrics.database_votes_by_option.with_label_values(&["a"]).get(), 4);
        assert_eq!(metrics.database_votes_by_option.with_label_values(&["b"]).get(), 1);
        assert_eq!(metrics.total_votes_in_database.get(), 5);

        metrics.set_dependency_up(Dependency::Store, true);
        assert!(metrics.dependency_up(Dependency::Store));
        metrics.set_dependency_up(Dependency::Store, false);
        assert!(!metrics.dependency_up(Dependency::Store));
    }
}
