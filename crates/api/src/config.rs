//! Gate configuration, read from the environment.

const PRODUCTION: &str = "production";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Deployment environment name (`REGISTRY_ENV`).
    pub environment: String,
    /// Panic when a handler has no permission mapping, instead of only
    /// returning an error.
    pub panic_on_missing_mapping: bool,
}

impl GateConfig {
    /// Read `REGISTRY_ENV` and `REGISTRY_PANIC_ON_MISSING_MAPPING`.
    pub fn from_env() -> Self {
        let environment = std::env::var("REGISTRY_ENV").unwrap_or_else(|_| "development".to_string());
        let panic_on_missing_mapping = std::env::var("REGISTRY_PANIC_ON_MISSING_MAPPING")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or_else(|| default_fail_loud(&environment));
        Self {
            environment,
            panic_on_missing_mapping,
        }
    }

    /// Never panics; only logs and returns errors.
    pub fn production() -> Self {
        Self {
            environment: PRODUCTION.to_string(),
            panic_on_missing_mapping: false,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case(PRODUCTION)
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        let environment = "development".to_string();
        let panic_on_missing_mapping = default_fail_loud(&environment);
        Self {
            environment,
            panic_on_missing_mapping,
        }
    }
}

fn default_fail_loud(environment: &str) -> bool {
    !environment.eq_ignore_ascii_case(PRODUCTION) && cfg!(debug_assertions)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
