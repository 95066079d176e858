//! Branded identifiers.
//!
//! [`FrameId`] is the canonical hierarchical identifier assigned during
//! discovery: a dotted path of zero-based child indices rooted at `"0"`
//! (e.g. `"0.2.1"` is the second child of the third child of the root).
//! [`SweepId`] correlates all log lines of one snapshot sweep.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::FrameTreeError;

/// The root identifier string.
pub const ROOT_ID: &str = "0";

/// Canonical dotted-path identifier of a frame context.
///
/// Construction is validated: every segment is a decimal index and the
/// first segment is always `0`. Child ids are derived with [`FrameId::child`],
/// which is the only way indices enter the path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FrameId(String);

impl FrameId {
    /// The root context id, `"0"`.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Id of the child at zero-based `index` among this context's
    /// frame-bearing children, in document order.
    pub fn child(&self, index: u32) -> Self {
        Self(format!("{}.{index}", self.0))
    }

    /// Parent id (the path before the last `.`), or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        self.0.rsplit_once('.').map(|(prefix, _)| Self(prefix.to_string()))
    }

    /// Tree depth: number of `.` separators. The root has depth 0.
    pub fn depth(&self) -> usize {
        self.0.bytes().filter(|b| *b == b'.').count()
    }

    /// Whether this is the root id.
    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    /// The underlying path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FrameId {
    type Err = FrameTreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = s.split('.');
        if segments.next() != Some(ROOT_ID) {
            return Err(FrameTreeError::InvalidFrameId(s.to_string()));
        }
        for segment in segments {
            if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FrameTreeError::InvalidFrameId(s.to_string()));
            }
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for FrameId {
    type Error = FrameTreeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FrameId> for String {
    fn from(id: FrameId) -> Self {
        id.0
    }
}

/// Correlation id for one full discovery + collection sweep.
///
/// UUIDv7 so sweep ids sort by start time in log aggregation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepId(Uuid);

impl SweepId {
    /// Generate a fresh sweep id.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SweepId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SweepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
