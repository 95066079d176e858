//! Discovery: recursive tree walk, id assignment, and registry merge.
//!
//! Two halves share this module:
//!
//! - [`announce_context`] — the walk every announcing actor performs (the
//!   root orchestrator and each isolated responder): report the context's
//!   immediate children toward the root, recurse synchronously into
//!   same-domain children, and hand isolated children an `initRequest`
//!   carrying their assigned id.
//! - [`DiscoveryEngine`] — the root-side merge: fold `initResponse`s into
//!   the registry, mark reporters processed, and arm a liveness timer for
//!   every node still awaiting its own report so an unresponsive branch
//!   degrades to "discovered but childless" instead of hanging the sweep.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use frametree_core::{FrameDescriptor, FrameId, FrameNode, ProtocolConfig, ProtocolMessage};

use crate::context::{ChildFrame, FrameContext, LocalFrames};
use crate::pending::PendingRequests;
use crate::registry::FrameRegistry;
use crate::router::InitReport;
use crate::timer;
use crate::transport::{Route, Transport, send_best_effort};

/// Where an announcing actor's `initResponse`s go: the root merges its own
/// reports through its mailbox directly (they never cross a boundary),
/// responders send them over the transport.
pub(crate) enum RootSink<'a> {
    /// Loop back into the root mailbox.
    Local(&'a mpsc::UnboundedSender<ProtocolMessage>),
    /// Cross the boundary via [`Route::Root`].
    Remote,
}

impl RootSink<'_> {
    async fn send(&self, transport: &Arc<dyn Transport>, message: ProtocolMessage) {
        match self {
            Self::Local(sender) => {
                let _ = sender.send(message);
            }
            Self::Remote => send_best_effort(transport, Route::Root, message).await,
        }
    }
}

/// Walk a context subtree, reporting and initializing as we go.
///
/// Same-domain children are recursed into synchronously and recorded in
/// `local` so their `getDataRequest`s can be answered in-process later.
/// Isolated children get an `initRequest`; when `init_fallback` is set
/// (responder side, which has no registry to hang liveness on), a
/// fire-and-forget timer synthesizes an empty report for them toward the
/// root. The timers are never cancelled; a redundant empty report for an
/// already-processed node is discarded by the merge.
pub(crate) fn announce_context<'a>(
    context: &'a Arc<dyn FrameContext>,
    id: FrameId,
    index: u32,
    transport: &'a Arc<dyn Transport>,
    sink: &'a RootSink<'a>,
    local: &'a mut LocalFrames,
    init_fallback: Option<&'a ProtocolConfig>,
) -> BoxFuture<'a, ()> {
    async move {
        let children = context.children();
        let mut subtree = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            subtree.push(FrameDescriptor {
                id: id.child(i as u32),
                index: i as u32,
                same_domain: child.same_domain(),
                source_reference: child.source_reference().to_string(),
            });
        }
        sink.send(
            transport,
            ProtocolMessage::InitResponse {
                id: id.clone(),
                index,
                subtree,
            },
        )
        .await;

        for (i, child) in children.into_iter().enumerate() {
            let child_id = id.child(i as u32);
            match child {
                ChildFrame::Direct {
                    context: child_context,
                    ..
                } => {
                    let _ = local.insert(child_id.clone(), Arc::clone(&child_context));
                    announce_context(
                        &child_context,
                        child_id,
                        i as u32,
                        transport,
                        sink,
                        local,
                        init_fallback,
                    )
                    .await;
                }
                ChildFrame::Isolated { endpoint, .. } => {
                    send_best_effort(
                        transport,
                        Route::Endpoint(endpoint),
                        ProtocolMessage::InitRequest {
                            id: child_id.clone(),
                            index: i as u32,
                        },
                    )
                    .await;
                    if let Some(config) = init_fallback {
                        let fallback_transport = Arc::clone(transport);
                        let _ = timer::arm(
                            config.init_timeout(),
                            config.timer_tick(),
                            async move {
                                counter!("frametree_init_timeouts_total").increment(1);
                                send_best_effort(
                                    &fallback_transport,
                                    Route::Root,
                                    ProtocolMessage::empty_init_response(child_id, i as u32),
                                )
                                .await;
                            },
                        );
                    }
                }
            }
        }
    }
    .boxed()
}

/// Root-side merge of `initResponse`s into the registry.
pub struct DiscoveryEngine<'a> {
    registry: &'a mut FrameRegistry,
    pending: &'a mut PendingRequests,
    mailbox: &'a mpsc::UnboundedSender<ProtocolMessage>,
    config: &'a ProtocolConfig,
    root_reported: bool,
}

impl<'a> DiscoveryEngine<'a> {
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
            root_reported: false,
        }
    }

    /// Merge one subtree report.
    pub fn handle_report(&mut self, report: InitReport) {
        let InitReport { id, index, subtree } = report;

        if id.is_root() {
            self.root_reported = true;
        } else {
            if self.registry.get(&id).is_some_and(|node| node.processed) {
                trace!(frame = %id, "discarding duplicate subtree report");
                return;
            }
            if !self.registry.contains(&id) {
                // Channels carry no cross-channel ordering guarantee: a
                // context's own report can beat the parent descriptor that
                // would have registered it.
                let _ = self.registry.insert(FrameNode::discovered(
                    id.clone(),
                    index,
                    false,
                    String::new(),
                ));
            }
            let _ = self.registry.mark_processed(&id);
            let _ = self.pending.resolve(&id);
        }

        for descriptor in subtree {
            if let Some(node) = self.registry.get_mut(&descriptor.id) {
                // The node's own report outran this descriptor and was
                // registered as a placeholder; the descriptor carries the
                // identity fields only the parent knows.
                trace!(frame = %descriptor.id, "descriptor backfills placeholder node");
                node.index = descriptor.index;
                node.same_domain = descriptor.same_domain;
                node.source_reference = descriptor.source_reference;
                continue;
            }
            let node = FrameNode::from_descriptor(descriptor);
            let node_id = node.id.clone();
            let node_index = node.index;
            let _ = self.registry.insert(node);

            // Liveness: every node awaiting its own report carries a
            // root-side timer that degrades the branch to childless.
            let mailbox = self.mailbox.clone();
            let fallback_id = node_id.clone();
            let timer = timer::arm(
                self.config.init_timeout(),
                self.config.timer_tick(),
                async move {
                    counter!("frametree_init_timeouts_total").increment(1);
                    let _ =
                        mailbox.send(ProtocolMessage::empty_init_response(fallback_id, node_index));
                },
            );
            self.pending.register(node_id, timer);
        }

        debug!(
            frame = %id,
            remaining = self.registry.unprocessed_count(),
            "subtree report merged"
        );
    }

    /// Quiescence: the root has reported its children and every non-root
    /// node's report has been merged (real or synthetic).
    pub fn complete(&self) -> bool {
        self.root_reported && self.registry.all_non_root_processed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::sleep;

    use frametree_core::FrameId;

    struct Harness {
        registry: FrameRegistry,
        pending: PendingRequests,
        mailbox: mpsc::UnboundedSender<ProtocolMessage>,
        events: mpsc::UnboundedReceiver<ProtocolMessage>,
        config: ProtocolConfig,
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
            Self {
                registry,
                pending: PendingRequests::new(),
                mailbox,
                events,
                config: ProtocolConfig::default(),
            }
        }
    }

    fn descriptor(raw: &str, index: u32, same_domain: bool) -> FrameDescriptor {
        FrameDescriptor {
            id: raw.parse().unwrap(),
            index,
            same_domain,
            source_reference: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_until_root_reports() {
        let mut h = Harness::new();
        let mut engine =
            DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        assert!(!engine.complete());

        engine.handle_report(InitReport {
            id: FrameId::root(),
            index: 0,
            subtree: vec![],
        });
        assert!(engine.complete());
    }

    #[tokio::test(start_paused = true)]
    async fn children_hold_completion_until_their_reports_merge() {
        let mut h = Harness::new();
        let mut engine =
            DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);

        engine.handle_report(InitReport {
            id: FrameId::root(),
            index: 0,
            subtree: vec![descriptor("0.0", 0, true), descriptor("0.1", 1, false)],
        });
        assert!(!engine.complete());

        engine.handle_report(InitReport {
            id: "0.0".parse().unwrap(),
            index: 0,
            subtree: vec![],
        });
        assert!(!engine.complete());

        engine.handle_report(InitReport {
            id: "0.1".parse().unwrap(),
            index: 1,
            subtree: vec![],
        });
        assert!(engine.complete());
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_child_degrades_to_childless_via_timer() {
        let mut h = Harness::new();
        {
            let mut engine =
                DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
            engine.handle_report(InitReport {
                id: FrameId::root(),
                index: 0,
                subtree: vec![descriptor("0.0", 0, false)],
            });
            assert!(!engine.complete());
        }

        // No reply ever arrives; the liveness timer injects the synthetic.
        sleep(Duration::from_millis(600)).await;
        let synthetic = h.events.try_recv().unwrap();
        match &synthetic {
            ProtocolMessage::InitResponse { id, subtree, .. } => {
                assert_eq!(id.as_str(), "0.0");
                assert!(subtree.is_empty());
            }
            other => panic!("unexpected message {other:?}"),
        }

        let mut engine =
            DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
        engine.handle_report(InitReport {
            id: FrameId::root(),
            index: 0,
            subtree: vec![],
        });
        if let ProtocolMessage::InitResponse { id, index, subtree } = synthetic {
            engine.handle_report(InitReport { id, index, subtree });
        }
        assert!(engine.complete());
        assert!(h.registry.get(&"0.0".parse().unwrap()).unwrap().processed);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_report_after_processing_is_discarded() {
        let mut h = Harness::new();
        let mut engine =
            DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);

        engine.handle_report(InitReport {
            id: FrameId::root(),
            index: 0,
            subtree: vec![descriptor("0.0", 0, false)],
        });
        engine.handle_report(InitReport {
            id: "0.0".parse().unwrap(),
            index: 0,
            subtree: vec![],
        });

        // A late real report must not resurrect children for the branch.
        engine.handle_report(InitReport {
            id: "0.0".parse().unwrap(),
            index: 0,
            subtree: vec![descriptor("0.0.0", 0, true)],
        });
        assert!(engine.complete());
        assert!(!h.registry.contains(&"0.0.0".parse().unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_order_report_registers_the_node() {
        let mut h = Harness::new();

        // The grandchild's own report beats its parent's descriptor.
        {
            let mut engine =
                DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
            engine.handle_report(InitReport {
                id: "0.0.0".parse().unwrap(),
                index: 0,
                subtree: vec![],
            });
        }
        let placeholder = h.registry.get(&"0.0.0".parse().unwrap()).unwrap();
        assert!(placeholder.processed);
        assert!(!placeholder.same_domain);
        assert!(placeholder.source_reference.is_empty());

        // The descriptor arriving later backfills the identity fields the
        // placeholder could not know, without demoting the node.
        {
            let mut engine =
                DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
            engine.handle_report(InitReport {
                id: "0.0".parse().unwrap(),
                index: 0,
                subtree: vec![FrameDescriptor {
                    id: "0.0.0".parse().unwrap(),
                    index: 0,
                    same_domain: true,
                    source_reference: "inner.html".into(),
                }],
            });
        }
        let node = h.registry.get(&"0.0.0".parse().unwrap()).unwrap();
        assert!(node.processed);
        assert!(node.same_domain);
        assert_eq!(node.source_reference, "inner.html");
        // No timer was armed for the already-reported node.
        assert!(h.pending.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn merge_resolves_the_pending_timer() {
        let mut h = Harness::new();

        {
            let mut engine =
                DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
            engine.handle_report(InitReport {
                id: FrameId::root(),
                index: 0,
                subtree: vec![descriptor("0.0", 0, false)],
            });
        }
        assert!(h.pending.has_pending(&"0.0".parse().unwrap()));

        {
            let mut engine =
                DiscoveryEngine::new(&mut h.registry, &mut h.pending, &h.mailbox, &h.config);
            engine.handle_report(InitReport {
                id: "0.0".parse().unwrap(),
                index: 0,
                subtree: vec![],
            });
        }
        assert!(h.pending.is_empty());

        // Timer was cancelled: no synthetic arrives later.
        sleep(Duration::from_millis(1_000)).await;
        assert!(h.events.try_recv().is_err());
    }
}
