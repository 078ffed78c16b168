//! Database connection settings.

use std::time::Duration;

use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }

    /// Read `DATABASE_URL`, plus the optional `REGISTRY_DB_MAX_CONNECTIONS` and
    /// `REGISTRY_DB_ACQUIRE_TIMEOUT_SECS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        Self::from_parts(
            url,
            std::env::var("REGISTRY_DB_MAX_CONNECTIONS").ok().as_deref(),
            std::env::var("REGISTRY_DB_ACQUIRE_TIMEOUT_SECS").ok().as_deref(),
        )
    }

    fn from_parts(url: String, max: Option<&str>, timeout: Option<&str>) -> anyhow::Result<Self> {
        let mut config = Self::new(url);
        if let Some(raw) = max {
            config.max_connections = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid REGISTRY_DB_MAX_CONNECTIONS: {raw}"))?;
        }
        if let Some(raw) = timeout {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("invalid REGISTRY_DB_ACQUIRE_TIMEOUT_SECS: {raw}"))?;
            config.acquire_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_overrides_are_absent() {
        let config = DatabaseConfig::from_parts("postgres://localhost/registry".into(), None, None).unwrap();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn overrides_are_parsed() {
        let config =
            DatabaseConfig::from_parts("postgres://db/registry".into(), Some(" 32 "), Some("2")).unwrap();
        assert_eq!(config.max_connections, 32);
        assert_eq!(config.acquire_timeout, Duration::from_secs(2));
    }

    #[test]
    fn garbage_overrides_are_errors() {
        assert!(DatabaseConfig::from_parts("postgres://db".into(), Some("lots"), None).is_err());
        assert!(DatabaseConfig::from_parts("postgres://db".into(), None, Some("-1")).is_err());
    }
}
