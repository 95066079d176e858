//! Tracing bootstrap.
//!
//! Filter priority: `FRAMETREE_LOG` environment variable, then the caller's
//! default directive, then `info`. `FRAMETREE_LOG_FORMAT=json` switches the
//! output layer to JSON; anything else renders text.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::errors::FrameTreeError;

/// Environment variable holding the tracing filter directives.
pub const LOG_ENV: &str = "FRAMETREE_LOG";

/// Environment variable selecting `json` or `text` output.
pub const LOG_FORMAT_ENV: &str = "FRAMETREE_LOG_FORMAT";

/// Initialize the global tracing subscriber.
///
/// Errors if a subscriber is already installed or a filter directive fails
/// to parse.
pub fn init_logging(default_filter: Option<&str>) -> Result<(), FrameTreeError> {
    let filter = build_filter(default_filter)?;
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| FrameTreeError::Config(format!("failed to install subscriber: {e}")))
}

fn build_filter(default_filter: Option<&str>) -> Result<EnvFilter, FrameTreeError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) {
        return Ok(filter);
    }
    let directives = default_filter.unwrap_or("info");
    EnvFilter::try_new(directives)
        .map_err(|e| FrameTreeError::Config(format!("invalid log directive {directives:?}: {e}")))
}
