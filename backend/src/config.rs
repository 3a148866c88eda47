use std::{env, fmt::Display, fs, str::FromStr, time::Duration};

use tracing::{info, warn};

use shared::models::{CurrentOptions, VoteOption};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub database_host: String,
    pub database_port: u16,
    pub database_user: String,
    pub database_password: String,
    pub database_name: String,
    pub option_a: String,
    pub option_b: String,
    pub hostname: String,
    pub refresh_interval: Duration,
    pub dependency_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            redis_host: load(&lookup, "REDIS_HOST", "localhost".to_string()),
            redis_port: load(&lookup, "REDIS_PORT", 6379),
            database_host: load(&lookup, "DATABASE_HOST", "database".to_string()),
            database_port: load(&lookup, "DATABASE_PORT", 5432),
            database_user: load(&lookup, "DATABASE_USER", "postgres".to_string()),
            database_password: secret(&lookup, "DATABASE_PASSWORD", "postgres"),
            database_name: load(&lookup, "DATABASE_NAME", "votes".to_string()),
            option_a: load(&lookup, "OPTION_A", "Cats".to_string()),
            option_b: load(&lookup, "OPTION_B", "Dogs".to_string()),
            hostname: lookup("HOSTNAME").unwrap_or_else(local_hostname),
            refresh_interval: Duration::from_secs(load(&lookup, "METRICS_REFRESH_SECS", 10u64).max(1)),
            dependency_timeout: Duration::from_secs(load(&lookup, "DEPENDENCY_TIMEOUT_SECS", 3u64).max(1)),
        }
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/0", self.redis_host, self.redis_port)
    }

    pub fn label(&self, option: VoteOption) -> &str {
        match option {
            VoteOption::A => &self.option_a,
            VoteOption::B => &self.option_b,
        }
    }

    pub fn current_options(&self) -> CurrentOptions {
        CurrentOptions {
            option_a: self.option_a.clone(),
            option_b: self.option_b.clone(),
        }
    }
}

fn load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}

fn secret(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default");
        default.to_string()
    })
}

fn local_hostname() -> String {
    fs::read_to_string("/etc/hostname")
        .map(|s| s.trim().to_string())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
