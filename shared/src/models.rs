use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteOption {
    A,
    B,
}

impl VoteOption {
    pub const ALL: [VoteOption; 2] = [VoteOption::A, VoteOption::B];

    /// Key used on the wire, in the queue payload and in stored rows.
    pub fn key(self) -> &'static str {
        match self {
            VoteOption::A => "a",
            VoteOption::B => "b",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "a" => Some(VoteOption::A),
            "b" => Some(VoteOption::B),
            _ => None,
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Payload appended to the queue store. The external worker reads
/// `voter_id` and `vote` from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteEvent {
    pub voter_id: String,
    pub vote: VoteOption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterSession {
    pub voter_id: String,
    pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AggregateStats {
    pub total_votes: u64,
    pub counts_by_option: BTreeMap<VoteOption, u64>,
    pub as_of: OffsetDateTime,
}

impl AggregateStats {
    pub fn empty() -> Self {
        Self {
            total_votes: 0,
            counts_by_option: VoteOption::ALL.iter().map(|opt| (*opt, 0)).collect(),
            as_of: OffsetDateTime::now_utc(),
        }
    }

    /// Reduces grouped `(stored_value, count)` rows into a fresh snapshot.
    /// Rows whose value is not a known key only contribute to the total.
    pub fn from_rows<I, S>(rows: I, as_of: OffsetDateTime) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut stats = Self { as_of, ..Self::empty() };
        for (value, count) in rows {
            let count = u64::try_from(count).unwrap_or(0);
            stats.total_votes += count;
            if let Some(option) = VoteOption::from_key(value.as_ref()) {
                *stats.counts_by_option.entry(option).or_insert(0) += count;
            }
        }
        stats
    }

    pub fn count(&self, option: VoteOption) -> u64 {
        self.counts_by_option.get(&option).copied().unwrap_or(0)
    }

    #[cfg(test)]
    pub(crate) fn attributed_votes(&self) -> u64 {
        self.counts_by_option.values().sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dependency {
    Queue,
    Store,
}

impl Dependency {
    pub fn name(self) -> &'static str {
        match self {
            Dependency::Queue => "redis",
            Dependency::Store => "database",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyStatus {
    pub dependency: Dependency,
    pub up: bool,
}

impl DependencyStatus {
    pub fn label(&self) -> &'static str {
        if self.up { "OK" } else { "FAILED" }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentOptions {
    pub option_a: String,
    pub option_b: String,
}

/// Body of `GET /stats`. Field names are fixed for downstream consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsResponse {
    pub total_votes: u64,
    pub cats_votes: u64,
    pub dogs_votes: u64,
    pub current_options: CurrentOptions,
}

impl StatsResponse {
    pub fn new(stats: &AggregateStats, current_options: CurrentOptions) -> Self {
        Self {
            total_votes: stats.total_votes,
            cats_votes: stats.count(VoteOption::A),
            dogs_votes: stats.count(VoteOption::B),
            current_options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub hostname: String,
    pub redis: String,
    pub database: String,
}

impl HealthResponse {
    pub fn new(service: &str, hostname: &str, queue: DependencyStatus, store: DependencyStatus) -> Self {
        Self {
            status: "OK".into(),
            service: service.into(),
            hostname: hostname.into(),
            redis: queue.label().into(),
            database: store.label().into(),
        }
    }
}
