//! Server configuration from `TB_*` environment variables

use std::path::PathBuf;

use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret-change-me";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".tb-data"),
            port: 8081,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 8,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let value = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match value("TB_PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Ignoring TB_PORT={:?}: not a port number", raw);
                defaults.port
            }),
            None => defaults.port,
        };

        let token_ttl_hours = value("TB_TOKEN_TTL_HOURS")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(defaults.token_ttl_hours);

        let jwt_secret = value("TB_JWT_SECRET").unwrap_or_else(|| {
            warn!("TB_JWT_SECRET is not set; using the development secret");
            defaults.jwt_secret
        });

        Self {
            data_dir: value("TB_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            port,
            jwt_secret,
            token_ttl_hours,
        }
    }

    /// Configuration rooted at `data_dir`, otherwise defaults
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}
