//! Registry configuration.

use tracing::warn;

/// Environment variable overriding `RegistryConfig::soft_limit`.
pub const SOFT_LIMIT_ENV: &str = "TESSEL_KIND_SOFT_LIMIT";

/// Environment variable overriding `RegistryConfig::initial_capacity`.
pub const INITIAL_CAPACITY_ENV: &str = "TESSEL_KIND_INITIAL_CAPACITY";

/// Tuning knobs for a `TypeRegistry`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Live kind count that triggers the one-time overflow report.
    /// Registration keeps succeeding past it.
    pub soft_limit: usize,
    /// Slots allocated up front.
    pub initial_capacity: usize,
}

impl RegistryConfig {
    pub const DEFAULT_SOFT_LIMIT: usize = 15_000;
    pub const DEFAULT_INITIAL_CAPACITY: usize = 256;

    /// Defaults overridden by `TESSEL_KIND_SOFT_LIMIT` and
    /// `TESSEL_KIND_INITIAL_CAPACITY`. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(limit) = read_env_usize(SOFT_LIMIT_ENV) {
            config.soft_limit = limit;
        }
        if let Some(capacity) = read_env_usize(INITIAL_CAPACITY_ENV) {
            config.initial_capacity = capacity;
        }
        config
    }

    #[must_use]
    pub fn with_soft_limit(mut self, soft_limit: usize) -> Self {
        self.soft_limit = soft_limit;
        self
    }

    #[must_use]
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            soft_limit: Self::DEFAULT_SOFT_LIMIT,
            initial_capacity: Self::DEFAULT_INITIAL_CAPACITY,
        }
    }
}

fn read_env_usize(var: &str) -> Option<usize> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(var, value = %raw, %err, "ignoring invalid registry setting");
            None
        }
    }
}
