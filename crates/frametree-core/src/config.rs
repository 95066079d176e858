//! Protocol timing configuration.
//!
//! Defaults match the original protocol constants: 500 ms init timeout,
//! 500 ms data timeout, 100 ms timer tick. Values load from serde sources
//! with compiled defaults, and `FRAMETREE_*` environment variables override
//! individual fields (highest priority).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

fn default_init_timeout_ms() -> u64 {
    500
}

fn default_data_timeout_ms() -> u64 {
    500
}

fn default_timer_tick_ms() -> u64 {
    100
}

/// Timeouts and timer resolution for one protocol instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// How long discovery waits for an `initResponse` before synthesizing
    /// an empty subtree for the branch.
    #[serde(default = "default_init_timeout_ms")]
    pub init_timeout_ms: u64,

    /// How long collection waits for a `getDataResponse` before
    /// synthesizing an empty payload for the node.
    #[serde(default = "default_data_timeout_ms")]
    pub data_timeout_ms: u64,

    /// Tick size of the cancellable deadline timer.
    #[serde(default = "default_timer_tick_ms")]
    pub timer_tick_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            init_timeout_ms: default_init_timeout_ms(),
            data_timeout_ms: default_data_timeout_ms(),
            timer_tick_ms: default_timer_tick_ms(),
        }
    }
}

impl ProtocolConfig {
    /// Defaults with `FRAMETREE_TIMEOUT_INIT_MS`, `FRAMETREE_TIMEOUT_DATA_MS`
    /// and `FRAMETREE_TIMER_TICK_MS` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        apply_env_override("FRAMETREE_TIMEOUT_INIT_MS", &mut config.init_timeout_ms);
        apply_env_override("FRAMETREE_TIMEOUT_DATA_MS", &mut config.data_timeout_ms);
        apply_env_override("FRAMETREE_TIMER_TICK_MS", &mut config.timer_tick_ms);
        config
    }

    /// Discovery timeout as a [`Duration`].
    pub fn init_timeout(&self) -> Duration {
        Duration::from_millis(self.init_timeout_ms)
    }

    /// Collection timeout as a [`Duration`].
    pub fn data_timeout(&self) -> Duration {
        Duration::from_millis(self.data_timeout_ms)
    }

    /// Timer tick as a [`Duration`].
    pub fn timer_tick(&self) -> Duration {
        Duration::from_millis(self.timer_tick_ms)
    }
}

fn apply_env_override(var: &str, slot: &mut u64) {
    if let Ok(raw) = std::env::var(var) {
        match raw.parse::<u64>() {
            Ok(value) => *slot = value,
            Err(_) => warn!(var, raw, "ignoring non-numeric timeout override"),
        }
    }
}
