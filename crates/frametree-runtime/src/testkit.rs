//! In-process simulation harness.
//!
//! [`StaticFrame`] and [`StaticProcessor`] give unit tests a canned context
//! and extractor; [`SimWorld`] wires a whole frame tree onto one
//! [`ChannelHub`], spawning a responder task per isolated context, so
//! integration tests can run full sweeps against misbehaving participants.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::sleep;

use frametree_core::{ProtocolConfig, ProtocolMessage, SnapshotOptions};

use crate::context::{ChildFrame, FrameContext, LocalFrames};
use crate::discovery::{RootSink, announce_context};
use crate::errors::ExtractError;
use crate::orchestrator::SnapshotOrchestrator;
use crate::processor::{DocumentProcessor, answer_data_request};
use crate::responder::FrameResponder;
use crate::transport::channel::ChannelHub;
use crate::transport::{Route, Transport, send_best_effort};

/// Immutable in-memory frame context.
pub struct StaticFrame {
    base_uri: String,
    title: String,
    /// Canned document content, read back by [`StaticProcessor`].
    pub content: String,
    children: Vec<ChildFrame>,
}

impl StaticFrame {
    /// A context with no frame-bearing children.
    pub fn leaf(base_uri: &str, title: &str, content: &str) -> Self {
        Self::with_children(base_uri, title, content, Vec::new())
    }

    /// A context with the given children, document order.
    pub fn with_children(
        base_uri: &str,
        title: &str,
        content: &str,
        children: Vec<ChildFrame>,
    ) -> Self {
        Self {
            base_uri: base_uri.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            children,
        }
    }

    /// Wrap this frame as a directly accessible child of another context.
    pub fn into_direct_child(self, source_reference: &str) -> ChildFrame {
        ChildFrame::Direct {
            source_reference: source_reference.to_string(),
            context: Arc::new(self),
        }
    }
}

impl FrameContext for StaticFrame {
    fn children(&self) -> Vec<ChildFrame> {
        self.children.clone()
    }

    fn base_uri(&self) -> String {
        self.base_uri.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Processor that reads content straight off a [`StaticFrame`], counting
/// lifecycle calls.
#[derive(Default)]
pub struct StaticProcessor {
    fail_extraction: bool,
    pre: AtomicUsize,
    post: AtomicUsize,
}

impl StaticProcessor {
    /// A processor whose extractions succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A processor whose extractions all fail.
    pub fn failing() -> Self {
        Self {
            fail_extraction: true,
            ..Self::default()
        }
    }

    /// Number of `pre_process` calls observed.
    pub fn pre_calls(&self) -> usize {
        self.pre.load(Ordering::SeqCst)
    }

    /// Number of `post_process` calls observed.
    pub fn post_calls(&self) -> usize {
        self.post.load(Ordering::SeqCst)
    }

    fn frame<'c>(&self, context: &'c dyn FrameContext) -> Result<&'c StaticFrame, ExtractError> {
        if self.fail_extraction {
            return Err(ExtractError("simulated extraction failure".into()));
        }
        context
            .as_any()
            .downcast_ref::<StaticFrame>()
            .ok_or_else(|| ExtractError("context is not a StaticFrame".into()))
    }
}

impl DocumentProcessor for StaticProcessor {
    fn pre_process(&self, _context: &dyn FrameContext, _options: &SnapshotOptions) {
        let _ = self.pre.fetch_add(1, Ordering::SeqCst);
    }

    fn extract_content(&self, context: &dyn FrameContext) -> Result<String, ExtractError> {
        Ok(self.frame(context)?.content.clone())
    }

    fn extract_auxiliary_style(&self, context: &dyn FrameContext) -> Result<String, ExtractError> {
        let _ = self.frame(context)?;
        Ok(String::new())
    }

    fn extract_auxiliary_binary(&self, context: &dyn FrameContext) -> Result<Value, ExtractError> {
        let _ = self.frame(context)?;
        Ok(Value::Array(Vec::new()))
    }

    fn post_process(&self, _context: &dyn FrameContext, _options: &SnapshotOptions) {
        let _ = self.post.fetch_add(1, Ordering::SeqCst);
    }
}

/// How a simulated isolated context behaves during a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponderBehavior {
    /// Full protocol participant.
    Normal,
    /// Receives everything, answers nothing.
    Silent,
    /// Announces its subtree but never answers data requests.
    InitOnly,
    /// Answers data requests after the given delay.
    DataLate(Duration),
}

/// Declarative description of one frame in a simulated tree.
pub struct SimFrame {
    base_uri: String,
    title: String,
    content: String,
    isolated: Option<ResponderBehavior>,
    children: Vec<SimFrame>,
}

impl SimFrame {
    /// A same-domain frame, reachable synchronously from its parent.
    pub fn direct(base_uri: &str, title: &str, content: &str) -> Self {
        Self {
            base_uri: base_uri.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            isolated: None,
            children: Vec::new(),
        }
    }

    /// An isolated frame served by its own responder task.
    pub fn isolated(base_uri: &str, title: &str, content: &str, behavior: ResponderBehavior) -> Self {
        Self {
            isolated: Some(behavior),
            ..Self::direct(base_uri, title, content)
        }
    }

    /// Append a child frame, document order.
    pub fn child(mut self, child: SimFrame) -> Self {
        self.children.push(child);
        self
    }
}

/// A fully wired simulation: orchestrator plus the hub its responders
/// live on.
pub struct SimWorld {
    /// The root orchestrator, ready to sweep.
    pub orchestrator: SnapshotOrchestrator,
    /// The shared message fabric.
    pub hub: Arc<ChannelHub>,
}

impl SimWorld {
    /// Build a world from a frame tree description. The root frame is
    /// always the orchestrator's own context; `isolated` on the root is
    /// ignored.
    pub fn build(root: SimFrame) -> Self {
        Self::build_with_config(root, ProtocolConfig::default())
    }

    /// Build with explicit protocol timeouts.
    pub fn build_with_config(root: SimFrame, config: ProtocolConfig) -> Self {
        let hub = Arc::new(ChannelHub::new());
        let context = materialize(&root, &hub, &config);
        let mailbox = hub.register_root();
        let orchestrator = SnapshotOrchestrator::new(
            context,
            Arc::new(StaticProcessor::new()),
            Arc::clone(&hub) as Arc<dyn Transport>,
            mailbox,
            config,
        );
        Self { orchestrator, hub }
    }
}

/// Turn a [`SimFrame`] subtree into a live context, registering endpoints
/// and spawning responder tasks for isolated descendants.
fn materialize(frame: &SimFrame, hub: &Arc<ChannelHub>, config: &ProtocolConfig) -> Arc<dyn FrameContext> {
    let mut children = Vec::with_capacity(frame.children.len());
    for child in &frame.children {
        let context = materialize(child, hub, config);
        let source_reference = child.base_uri.clone();
        match child.isolated {
            None => children.push(ChildFrame::Direct {
                source_reference,
                context,
            }),
            Some(behavior) => {
                let endpoint = spawn_responder(behavior, context, hub, config);
                children.push(ChildFrame::Isolated {
                    source_reference,
                    endpoint,
                });
            }
        }
    }
    Arc::new(StaticFrame::with_children(
        &frame.base_uri,
        &frame.title,
        &frame.content,
        children,
    ))
}

fn spawn_responder(
    behavior: ResponderBehavior,
    context: Arc<dyn FrameContext>,
    hub: &Arc<ChannelHub>,
    config: &ProtocolConfig,
) -> crate::transport::EndpointId {
    let (endpoint, receiver) = hub.register_endpoint();
    let transport = Arc::clone(hub) as Arc<dyn Transport>;
    match behavior {
        ResponderBehavior::Normal => {
            let responder = FrameResponder::new(
                context,
                Arc::new(StaticProcessor::new()),
                transport,
                receiver,
                *config,
            );
            let _ = tokio::spawn(responder.run());
        }
        ResponderBehavior::Silent => {
            let _ = tokio::spawn(black_hole(receiver));
        }
        ResponderBehavior::InitOnly | ResponderBehavior::DataLate(_) => {
            let _ = tokio::spawn(scripted_responder(
                behavior,
                context,
                transport,
                receiver,
                *config,
            ));
        }
    }
    endpoint
}

/// Consume every message without answering.
async fn black_hole(mut receiver: mpsc::UnboundedReceiver<ProtocolMessage>) {
    while receiver.recv().await.is_some() {}
}

/// Responder variant with scripted misbehavior on the data path.
async fn scripted_responder(
    behavior: ResponderBehavior,
    context: Arc<dyn FrameContext>,
    transport: Arc<dyn Transport>,
    mut receiver: mpsc::UnboundedReceiver<ProtocolMessage>,
    config: ProtocolConfig,
) {
    let processor = StaticProcessor::new();
    let mut local = LocalFrames::new();
    while let Some(message) = receiver.recv().await {
        match message {
            ProtocolMessage::InitRequest { id, index } => {
                local.clear();
                let _ = local.insert(id.clone(), Arc::clone(&context));
                announce_context(
                    &context,
                    id,
                    index,
                    &transport,
                    &RootSink::Remote,
                    &mut local,
                    Some(&config),
                )
                .await;
            }
            ProtocolMessage::GetDataRequest { id, options } => {
                let Some(target) = local.get(&id) else {
                    continue;
                };
                match behavior {
                    ResponderBehavior::InitOnly => {}
                    ResponderBehavior::DataLate(delay) => {
                        let response =
                            answer_data_request(&processor, target.as_ref(), id, &options);
                        let transport = Arc::clone(&transport);
                        let _ = tokio::spawn(async move {
                            sleep(delay).await;
                            send_best_effort(&transport, Route::Root, response).await;
                        });
                    }
                    ResponderBehavior::Normal | ResponderBehavior::Silent => unreachable!(),
                }
            }
            _ => {}
        }
    }
}
