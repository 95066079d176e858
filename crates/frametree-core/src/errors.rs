//! Error types shared across the frametree crates.
//!
//! The protocol itself is best-effort and never surfaces errors to the
//! snapshot caller; these types cover the seams where real failures can
//! occur — id parsing, configuration, and logging bootstrap.

use thiserror::Error;

/// Errors raised by the core types.
#[derive(Debug, Error)]
pub enum FrameTreeError {
    /// A string did not parse as a canonical dotted-path frame id.
    #[error("invalid frame id: {0:?}")]
    InvalidFrameId(String),

    /// Configuration or logging bootstrap failure.
    #[error("configuration error: {0}")]
    Config(String),
}
