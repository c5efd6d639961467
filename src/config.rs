//! Session configuration.
//!
//! Read from `HOUSIE_*` environment variables or a JSON document. Missing or
//! unparsable values fall back to the defaults.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::chat::DEFAULT_CHAT_RETENTION;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    #[error("invalid config document: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Delay between automatic draws
    pub draw_interval_ms: u64,

    /// Language tag passed to the announcer
    pub language: String,

    /// Chat entries kept per node
    pub chat_retention: usize,

    /// Ask for a flavor chat line every N draws (0 = never)
    pub chat_flavor_every: u32,

    /// Deadline for announcer calls
    pub announce_timeout_ms: u64,

    /// Sender name for chat typed on the host
    pub host_name: String,

    /// Fixed seed for the draw order
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            draw_interval_ms: 4_000,
            language: "en".to_string(),
            chat_retention: DEFAULT_CHAT_RETENTION,
            chat_flavor_every: 5,
            announce_timeout_ms: 3_000,
            host_name: "Host".to_string(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            draw_interval_ms: read_var("HOUSIE_DRAW_INTERVAL_MS", defaults.draw_interval_ms),
            language: read_var("HOUSIE_LANGUAGE", defaults.language),
            chat_retention: read_var("HOUSIE_CHAT_RETENTION", defaults.chat_retention),
            chat_flavor_every: read_var("HOUSIE_CHAT_FLAVOR_EVERY", defaults.chat_flavor_every),
            announce_timeout_ms: read_var(
                "HOUSIE_ANNOUNCE_TIMEOUT_MS",
                defaults.announce_timeout_ms,
            ),
            host_name: read_var("HOUSIE_HOST_NAME", defaults.host_name),
            seed: std::env::var("HOUSIE_SEED")
                .ok()
                .and_then(|raw| raw.parse().ok()),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.draw_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "draw_interval_ms",
                reason: "must be greater than zero",
            });
        }
        if self.chat_retention == 0 {
            return Err(ConfigError::Invalid {
                field: "chat_retention",
                reason: "must be greater than zero",
            });
        }
        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "language",
                reason: "must not be empty",
            });
        }
        Ok(())
    }

    pub fn draw_interval(&self) -> Duration {
        Duration::from_millis(self.draw_interval_ms)
    }

    pub fn announce_timeout(&self) -> Duration {
        Duration::from_millis(self.announce_timeout_ms)
    }
}

fn read_var<T: FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<T>().ok())
        .unwrap_or(fallback)
}
