//! Phase-aware message demux for the root engine loops.
//!
//! The root only ever consumes `initResponse` during Discovery and
//! `getDataResponse` during Collection; everything else reaching its
//! mailbox — requests echoed by a broadcast transport, responses from a
//! phase that already ended, stale traffic a reset did not drain — is
//! dropped with a trace log and a counter. Dropping is never an error.

use metrics::counter;
use tracing::trace;

use frametree_core::{FrameDescriptor, FrameId, FramePayload, ProtocolMessage};

/// An `initResponse` accepted for the Discovery engine.
#[derive(Debug)]
pub struct InitReport {
    /// Reporting context.
    pub id: FrameId,
    /// Reporter's sibling index.
    pub index: u32,
    /// Its immediate children.
    pub subtree: Vec<FrameDescriptor>,
}

/// A `getDataResponse` accepted for the Collection engine.
#[derive(Debug)]
pub struct DataReport {
    /// Responding node.
    pub id: FrameId,
    /// Extracted content fields (empty for a timeout synthetic).
    pub payload: FramePayload,
}

/// Root-side message router.
#[derive(Debug, Default)]
pub struct MessageRouter {
    dropped: u64,
}

impl MessageRouter {
    /// Create a router with zeroed drop accounting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Demux during the Discovery phase.
    pub fn route_discovery(&mut self, message: ProtocolMessage) -> Option<InitReport> {
        match message {
            ProtocolMessage::InitResponse { id, index, subtree } => {
                Some(InitReport { id, index, subtree })
            }
            other => {
                self.drop_message(&other, "discovery");
                None
            }
        }
    }

    /// Demux during the Collection phase.
    pub fn route_collection(&mut self, message: ProtocolMessage) -> Option<DataReport> {
        match message {
            ProtocolMessage::GetDataResponse { id, payload } => Some(DataReport { id, payload }),
            other => {
                self.drop_message(&other, "collection");
                None
            }
        }
    }

    /// Messages dropped since construction.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn drop_message(&mut self, message: &ProtocolMessage, phase: &'static str) {
        self.dropped += 1;
        counter!("frametree_messages_dropped_total").increment(1);
        trace!(
            method = message.method(),
            frame = %message.frame_id(),
            phase,
            "dropping message not routable in this phase"
        );
    }
}
