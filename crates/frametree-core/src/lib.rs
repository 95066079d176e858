//! # frametree-core
//!
//! Foundation types for the frametree snapshot protocol.
//!
//! This crate provides the shared vocabulary that the runtime crate and
//! transport implementations depend on:
//!
//! - **Branded IDs**: [`ids::FrameId`] dotted-path identifiers, [`ids::SweepId`]
//!   per-sweep correlation IDs
//! - **Nodes**: [`node::FrameNode`] — one record per discovered context
//! - **Messages**: [`messages::ProtocolMessage`] — the four protocol methods,
//!   serde-tagged for the wire
//! - **Envelope**: [`envelope`] — prefix-framed JSON encoding for
//!   window-style message channels
//! - **Config**: [`config::ProtocolConfig`] — timeouts and timer tick
//! - **Errors**: [`errors::FrameTreeError`] via `thiserror`
//! - **Logging**: [`logging::init_logging`] tracing bootstrap
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `frametree-runtime`.

#![deny(unsafe_code)]

pub mod config;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod node;

pub use config::ProtocolConfig;
pub use errors::FrameTreeError;
pub use ids::{FrameId, SweepId};
pub use messages::{FrameDescriptor, FramePayload, ProtocolMessage, SnapshotOptions};
pub use node::FrameNode;
