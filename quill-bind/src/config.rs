//! Binding configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// How often the local caret is reported upstream, in milliseconds
    pub poll_period_ms: u64,
    /// Capacity of the inbound event channel
    pub event_capacity: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 500,
            event_capacity: 256,
        }
    }
}

impl BindingConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_period_ms == 0 {
            return Err(ConfigError::ZeroPollPeriod);
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(String),
    #[error("poll_period_ms must be greater than zero")]
    ZeroPollPeriod,
    #[error("event_capacity must be greater than zero")]
    ZeroCapacity,
}
