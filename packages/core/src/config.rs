/// Runtime configuration for the feed store
use crate::services::DEFAULT_BADGE_QUEUE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the database file location
pub const ENV_DATABASE_PATH: &str = "FEED_DATABASE_PATH";
/// Environment variable enabling badge notifications (`1` or `true`)
pub const ENV_BADGES_ENABLED: &str = "FEED_BADGES_ENABLED";
/// Environment variable sizing the badge notification queue
pub const ENV_BADGE_QUEUE_CAPACITY: &str = "FEED_BADGE_QUEUE_CAPACITY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// SQLite database file; parent directories are created on open
    pub database_path: PathBuf,

    /// Schedule badge notifications after mutations
    pub badges_enabled: bool,

    /// Capacity of the badge notification queue
    pub badge_queue_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            badges_enabled: false,
            badge_queue_capacity: DEFAULT_BADGE_QUEUE_CAPACITY,
        }
    }
}

impl FeedConfig {
    /// Build configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset, empty, or unparseable values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(flag) = get(ENV_BADGES_ENABLED) {
            config.badges_enabled = parse_flag(&flag);
        }

        if let Some(raw) = get(ENV_BADGE_QUEUE_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.badge_queue_capacity = capacity,
                _ => tracing::warn!(
                    "Ignoring invalid {}='{}', using {}",
                    ENV_BADGE_QUEUE_CAPACITY,
                    raw,
                    config.badge_queue_capacity
                ),
            }
        }

        config
    }
}

/// `~/.feed/database/feed.db`, or a relative path when no home directory exists
fn default_database_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".feed").join("database").join("feed.db"))
        .unwrap_or_else(|| PathBuf::from("feed.db"))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FeedConfig::from_lookup(|_| None);
        assert!(!config.badges_enabled);
        assert_eq!(config.badge_queue_capacity, DEFAULT_BADGE_QUEUE_CAPACITY);
        assert!(config.database_path.ends_with("feed.db"));
    }

    #[test]
    fn test_overrides() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_PATH, "/tmp/custom.db"),
            (ENV_BADGES_ENABLED, "TRUE"),
            (ENV_BADGE_QUEUE_CAPACITY, "32"),
        ]));
        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.db"));
        assert!(config.badges_enabled);
        assert_eq!(config.badge_queue_capacity, 32);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE_PATH, ""),
            (ENV_BADGES_ENABLED, "yes"),
            (ENV_BADGE_QUEUE_CAPACITY, "0"),
        ]));
        assert!(config.database_path.ends_with("feed.db"));
        assert!(!config.badges_enabled);
        assert_eq!(config.badge_queue_capacity, DEFAULT_BADGE_QUEUE_CAPACITY);
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag(" true "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("on"));
    }
}
