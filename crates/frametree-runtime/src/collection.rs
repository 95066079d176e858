//! Collection: fan out `getDataRequest`s and fold the responses back.
//!
//! Every registered node — local or isolated — goes through the same
//! pending-entry-plus-timer path, so the completion condition is simply
//! "no data request in flight". Local contexts are answered in-process and
//! the response looped back through the root mailbox; isolated contexts
//! get a broadcast request and filter on their adopted ids.

use std::sync::Arc;

use metrics::{counter, gauge};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use frametree_core::{ProtocolConfig, ProtocolMessage, SnapshotOptions};

use crate::context::LocalFrames;
use crate::pending::PendingRequests;
use crate::processor::{DocumentProcessor, answer_data_request};
use crate::registry::FrameRegistry;
use crate::router::DataReport;
use crate::timer;
use crate::transport::{Route, Transport, send_best_effort};

/// Root-side fan-out and merge of the Collection phase.
pub struct CollectionEngine<'a> {
    registry: &'a mut FrameRegistry,
    pending: &'a mut PendingRequests,
    mailbox: &'a mpsc::UnboundedSender<ProtocolMessage>,
    config: &'a ProtocolConfig,
}

impl<'a> CollectionEngine<'a> {
    /// Build an engine over root-owned sweep state.
    pub fn new(
        registry: &'a mut FrameRegistry,
        pending: &'a mut PendingRequests,
        mailbox: &'a mpsc::UnboundedSender<ProtocolMessage>,
        config: &'a ProtocolConfig,
    ) -> Self {
        Self {
            registry,
            pending,
            mailbox,
            config,
        }
    }

    /// Issue one data request per registered node.
    ///
    /// All pending entries and timers are armed before any request is
    /// sent, so a response can never race an unregistered entry.
    pub async fn request_all(
        &mut self,
        local: &LocalFrames,
        processor: &dyn DocumentProcessor,
        transport: &Arc<dyn Transport>,
        options: &SnapshotOptions,
    ) {
        let ids = self.registry.ids();
        for id in &ids {
            let mailbox = self.mailbox.clone();
            let fallback_id = id.clone();
            let handle = timer::arm(
                self.config.data_timeout(),
                self.config.timer_tick(),
                async move {
                    counter!("frametree_data_timeouts_total").increment(1);
                    let _ = mailbox.send(ProtocolMessage::empty_data_response(fallback_id));
                },
            );
            self.pending.register(id.clone(), handle);
        }
        gauge!("frametree_pending_data_requests").set(self.pending.len() as f64);

        for id in ids {
            match local.get(&id) {
                Some(context) => {
                    let response =
                        answer_data_request(processor, context.as_ref(), id, options);
                    let _ = self.mailbox.send(response);
                }
                None => {
                    // Isolated contexts filter the broadcast on their ids.
                    send_best_effort(
                        transport,
                        Route::Broadcast,
                        ProtocolMessage::GetDataRequest {
                            id,
                            options: options.clone(),
                        },
                    )
                    .await;
                }
            }
        }
    }

    /// Merge one data response. Late or duplicate responses (a real reply
    /// racing its timeout synthetic) are discarded whole.
    pub fn handle_report(&mut self, report: DataReport) {
        let DataReport { id, payload } = report;
        if !self.pending.resolve(&id) {
            trace!(frame = %id, "discarding data response with no pending request");
            return;
        }
        gauge!("frametree_pending_data_requests").set(self.pending.len() as f64);

        if let Some(node) = self.registry.get_mut(&id) {
            node.apply_payload(payload);
            debug!(frame = %id, has_content = node.has_content(), "data response merged");
        }
    }

    /// Quiescence: every issued request resolved, by reply or by timeout.
    pub fn complete(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::sleep;

    use frametree_core::{FrameId, FrameNode, FramePayload};

    use crate::router::MessageRouter;
    use crate::testkit::{StaticFrame, StaticProcessor};
    use crate::transport::channel::ChannelHub;

    struct Harness {
        registry: FrameRegistry,
        pending: PendingRequests,
        mailbox: mpsc::UnboundedSender<ProtocolMessage>,
        events: mpsc::UnboundedReceiver<ProtocolMessage>,
        config: ProtocolConfig,
        local: LocalFrames,
        processor: StaticProcessor,
        transport: Arc<dyn Transport>,
    }

    impl Harness {
        fn new() -> Self {
            let (mailbox, events) = mpsc::unbounded_channel();
            let mut registry = FrameRegistry::new();
            let _ = registry.insert(FrameNode::discovered(
                FrameId::root(),
                0,
                true,
                String::new(),
            ));
            let mut local = LocalFrames::new();
            let _ = local.insert(
                FrameId::root(),
                Arc::new(StaticFrame::leaf("https://example.test/", "Root", "<html/>"))
                    as Arc<dyn crate::context::FrameContext>,
            );
            Self {
                registry,
                pending: PendingRequests::new(),
                mailbox,
                events,
                config: ProtocolConfig::default(),
                local,
                processor: StaticProcessor::new(),
                transport: Arc::new(ChannelHub::new()),
            }
        }

        fn add_remote(&mut self, raw: &str) {
            let id: FrameId = raw.parse().unwrap();
            let mut node = FrameNode::discovered(id.clone(), 0, false, String::new());
            node.processed = true;
            let _ = self.registry.insert(node);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn local_node_is_answered_in_process() {
        let mut h = Harness::new();
        let mut engine =
            CollectionEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        engine
            .request_all(
                &h.local,
                &h.processor,
                &h.transport,
                &SnapshotOptions::default(),
            )
            .await;
        assert!(!engine.complete());

        let mut router = MessageRouter::new();
        let message = h.events.try_recv().unwrap();
        let report = router.route_collection(message).unwrap();
        engine.handle_report(report);

        assert!(engine.complete());
        let root = h.registry.get(&FrameId::root()).unwrap();
        assert_eq!(root.content.as_deref(), Some("<html/>"));
        assert_eq!(root.title.as_deref(), Some("Root"));
        assert_eq!(h.processor.pre_calls(), 1);
        assert_eq!(h.processor.post_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_remote_degrades_via_timeout() {
        let mut h = Harness::new();
        h.add_remote("0.0");
        let mut engine =
            CollectionEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        engine
            .request_all(
                &h.local,
                &h.processor,
                &h.transport,
                &SnapshotOptions::default(),
            )
            .await;

        // The local root answers immediately; the remote never will.
        let mut router = MessageRouter::new();
        let report = router.route_collection(h.events.try_recv().unwrap()).unwrap();
        engine.handle_report(report);
        assert!(!engine.complete());

        sleep(Duration::from_millis(600)).await;
        let report = router.route_collection(h.events.try_recv().unwrap()).unwrap();
        assert!(report.payload.is_empty());
        engine.handle_report(report);

        assert!(engine.complete());
        let node = h.registry.get(&"0.0".parse().unwrap()).unwrap();
        assert!(!node.has_content());
    }

    #[tokio::test(start_paused = true)]
    async fn late_response_after_timeout_is_discarded() {
        let mut h = Harness::new();
        h.add_remote("0.0");
        let mut engine =
            CollectionEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        engine
            .request_all(
                &h.local,
                &h.processor,
                &h.transport,
                &SnapshotOptions::default(),
            )
            .await;

        sleep(Duration::from_millis(600)).await;
        let mut router = MessageRouter::new();
        // Drain the local root's answer and the remote's timeout synthetic.
        while let Ok(message) = h.events.try_recv() {
            let report = router.route_collection(message).unwrap();
            engine.handle_report(report);
        }
        assert!(engine.complete());

        // The straggler shows up after its entry resolved.
        engine.handle_report(DataReport {
            id: "0.0".parse().unwrap(),
            payload: FramePayload {
                content: Some("<late/>".into()),
                ..FramePayload::default()
            },
        });
        let node = h.registry.get(&"0.0".parse().unwrap()).unwrap();
        assert!(node.content.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn resolved_entries_cancel_their_timers() {
        let mut h = Harness::new();
        let mut engine =
            CollectionEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        engine
            .request_all(
                &h.local,
                &h.processor,
                &h.transport,
                &SnapshotOptions::default(),
            )
            .await;

        let mut router = MessageRouter::new();
        let report = router.route_collection(h.events.try_recv().unwrap()).unwrap();
        engine.handle_report(report);

        // No timeout synthetic arrives for the already-resolved root.
        sleep(Duration::from_millis(1_000)).await;
        assert!(h.events.try_recv().is_err());
    }
}
