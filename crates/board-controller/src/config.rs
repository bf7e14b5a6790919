//! Client configuration
//!
//! Read from `TB_*` environment variables; unset or unparsable values fall
//! back to defaults.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use tb_core::gateway::{HttpGateway, SessionHandle};
use tb_core::Error;

/// What to do with the optimistic state when persisting a move fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Keep the optimistic state until the next full refresh
    #[default]
    Retain,
    /// Restore the board as it was before the move
    Rollback,
    /// Refetch the board from the backend
    Refresh,
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" | "keep" => Ok(Self::Retain),
            "rollback" | "revert" => Ok(Self::Rollback),
            "refresh" | "refetch" => Ok(Self::Refresh),
            _ => Err(Error::Validation(format!(
                "Unknown failure policy '{}'",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task API
    pub api_url: String,
    pub request_timeout: Duration,
    /// Quiet period before a search keystroke triggers a fetch
    pub search_debounce: Duration,
    /// How long a notification stays visible
    pub notification_ttl: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8081".to_string(),
            request_timeout: Duration::from_millis(10_000),
            search_debounce: Duration::from_millis(500),
            notification_ttl: Duration::from_millis(5_000),
            failure_policy: FailurePolicy::Retain,
        }
    }
}

impl ClientConfig {
    /// Load from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let api_url = lookup("TB_API_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.api_url);

        let failure_policy = match lookup("TB_FAILURE_POLICY") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("{}; using {:?}", err, defaults.failure_policy);
                defaults.failure_policy
            }),
            None => defaults.failure_policy,
        };

        Self {
            api_url,
            request_timeout: millis(&lookup, "TB_REQUEST_TIMEOUT_MS", defaults.request_timeout),
            search_debounce: millis(&lookup, "TB_SEARCH_DEBOUNCE_MS", defaults.search_debounce),
            notification_ttl: millis(&lookup, "TB_NOTIFICATION_TTL_MS", defaults.notification_ttl),
            failure_policy,
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// HTTP gateway for this configuration
    pub fn http_gateway(&self, session: SessionHandle) -> HttpGateway {
        HttpGateway::with_timeout(&self.api_url, self.request_timeout, session)
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: Duration) -> Duration {
    match lookup(name) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!("Ignoring {}={:?}: not a number of milliseconds", name, raw);
                default
            }
        },
        None => default,
    }
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
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.api_url, "http://localhost:8081");
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.failure_policy, FailurePolicy::Retain);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("TB_API_URL", "https://tasks.example.com"),
            ("TB_SEARCH_DEBOUNCE_MS", "250"),
            ("TB_FAILURE_POLICY", "Rollback"),
        ]));
        assert_eq!(config.api_url, "https://tasks.example.com");
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.failure_policy, FailurePolicy::Rollback);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("TB_REQUEST_TIMEOUT_MS", "soon"),
            ("TB_FAILURE_POLICY", "panic"),
            ("TB_API_URL", "   "),
        ]));
        assert_eq!(config.request_timeout, Duration::from_millis(10_000));
        assert_eq!(config.failure_policy, FailurePolicy::Retain);
        assert_eq!(config.api_url, "http://localhost:8081");
    }
}
