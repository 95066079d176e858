//! Root orchestrator: the single entry point of a snapshot sweep.
//!
//! Owns every piece of sweep state — registry, pending trackers, local
//! context map, mailbox — and drives the two phases in order. A sweep
//! never fails: unresponsive branches degrade to childless or contentless
//! nodes, and the result is always the full discovered tree.

use std::sync::Arc;

use metrics::counter;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{Instrument, debug, info, info_span};

use frametree_core::{
    FrameId, FrameNode, ProtocolConfig, SnapshotOptions, SweepId,
};

use crate::collection::CollectionEngine;
use crate::context::{FrameContext, LocalFrames};
use crate::discovery::{DiscoveryEngine, RootSink, announce_context};
use crate::pending::PendingRequests;
use crate::processor::DocumentProcessor;
use crate::registry::FrameRegistry;
use crate::router::MessageRouter;
use crate::transport::{RootMailbox, Transport};

/// Drives discovery and collection from the root context.
pub struct SnapshotOrchestrator {
    context: Arc<dyn FrameContext>,
    processor: Arc<dyn DocumentProcessor>,
    transport: Arc<dyn Transport>,
    mailbox: RootMailbox,
    config: ProtocolConfig,
    registry: FrameRegistry,
    init_pending: PendingRequests,
    data_pending: PendingRequests,
    local: LocalFrames,
    router: MessageRouter,
}

impl SnapshotOrchestrator {
    /// Build an orchestrator rooted at `context`.
    ///
    /// `mailbox` must be the root mailbox registered on the same transport
    /// the isolated responders send through.
    pub fn new(
        context: Arc<dyn FrameContext>,
        processor: Arc<dyn DocumentProcessor>,
        transport: Arc<dyn Transport>,
        mailbox: RootMailbox,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            context,
            processor,
            transport,
            mailbox,
            config,
            registry: FrameRegistry::new(),
            init_pending: PendingRequests::new(),
            data_pending: PendingRequests::new(),
            local: LocalFrames::new(),
            router: MessageRouter::new(),
        }
    }

    /// Run one full sweep and return every discovered node, deepest first.
    ///
    /// Infallible by design: a branch that never answers shows up as a
    /// childless or contentless node rather than an error. Safe to call
    /// repeatedly; each sweep starts from a clean slate.
    pub async fn get_snapshot(&mut self, options: &SnapshotOptions) -> Vec<FrameNode> {
        let sweep = SweepId::new();
        let span = info_span!("snapshot_sweep", %sweep);
        async {
            counter!("frametree_sweeps_total").increment(1);
            self.reset();
            self.run_discovery().await;
            info!(frames = self.registry.len(), "discovery complete");
            self.run_collection(options).await;
            let nodes = self.registry.take_sorted();
            info!(
                frames = nodes.len(),
                with_content = nodes.iter().filter(|n| n.has_content()).count(),
                "sweep complete"
            );
            nodes
        }
        .instrument(span)
        .await
    }

    /// Clear all state left over from a previous sweep.
    fn reset(&mut self) {
        self.registry.reset();
        let _ = self.registry.insert(FrameNode::discovered(
            FrameId::root(),
            0,
            true,
            String::new(),
        ));
        self.init_pending.cancel_all();
        self.data_pending.cancel_all();
        self.local.clear();
        let _ = self
            .local
            .insert(FrameId::root(), Arc::clone(&self.context));

        // Stale traffic from a prior sweep must not leak into this one.
        let mut drained = 0_u64;
        loop {
            match self.mailbox.receiver.try_recv() {
                Ok(_) => drained += 1,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        if drained > 0 {
            debug!(drained, "discarded stale mailbox traffic on reset");
        }
    }

    async fn run_discovery(&mut self) {
        // The root's own reports loop back through the mailbox so they
        // merge on the same path as remote ones.
        announce_context(
            &self.context,
            FrameId::root(),
            0,
            &self.transport,
            &RootSink::Local(&self.mailbox.sender),
            &mut self.local,
            None,
        )
        .await;

        let Self {
            registry,
            init_pending,
            mailbox,
            config,
            router,
            ..
        } = self;
        let RootMailbox { sender, receiver } = mailbox;
        let mut engine = DiscoveryEngine::new(registry, init_pending, sender, config);
        while !engine.complete() {
            let Some(message) = receiver.recv().await else {
                break;
            };
            if let Some(report) = router.route_discovery(message) {
                engine.handle_report(report);
            }
        }
        self.init_pending.cancel_all();
    }

    async fn run_collection(&mut self, options: &SnapshotOptions) {
        let Self {
            registry,
            data_pending,
            mailbox,
            config,
            router,
            local,
            processor,
            transport,
            ..
        } = self;
        let RootMailbox { sender, receiver } = mailbox;
        let mut engine = CollectionEngine::new(registry, data_pending, sender, config);
        engine
            .request_all(local, processor.as_ref(), transport, options)
            .await;
        while !engine.complete() {
            let Some(message) = receiver.recv().await else {
                break;
            };
            if let Some(report) = router.route_collection(message) {
                engine.handle_report(report);
            }
        }
    }
}
