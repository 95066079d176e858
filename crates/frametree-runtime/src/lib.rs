//! # frametree-runtime
//!
//! The two-phase snapshot protocol over isolated frame contexts.
//!
//! - **Timer**: cancellable tick-based deadline timer backing every wait
//! - **Transport**: message channel abstraction + in-memory channel hub
//! - **Router**: phase-aware demux of inbound protocol messages
//! - **Discovery**: recursive tree walk, id assignment, registry merge
//! - **Collection**: parallel payload fan-out with per-node timeouts
//! - **Responder**: participant actor for non-root contexts
//! - **Orchestrator**: root-only entry point owning the registry lifecycle
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: frametree-core.

#![deny(unsafe_code)]

pub mod collection;
pub mod context;
pub mod discovery;
pub mod errors;
pub mod orchestrator;
pub mod pending;
pub mod processor;
pub mod registry;
pub mod responder;
pub mod router;
pub mod testkit;
pub mod timer;
pub mod transport;

// Re-export main public API
pub use context::{ChildFrame, FrameContext, LocalFrames};
pub use errors::{ExtractError, TransportError};
pub use orchestrator::SnapshotOrchestrator;
pub use processor::DocumentProcessor;
pub use responder::FrameResponder;
pub use transport::channel::ChannelHub;
pub use transport::{EndpointId, RootMailbox, Route, Transport};
