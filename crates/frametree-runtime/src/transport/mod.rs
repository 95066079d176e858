//! Transport abstraction.
//!
//! How a message physically crosses a trust boundary is an external
//! concern; the engines only ever address one of three routes. Responses
//! always travel [`Route::Root`] so results bubble to the root actor,
//! `initRequest`s target a specific child endpoint, and collection
//! requests for isolated contexts are broadcast and filtered by id on the
//! receiving side.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use frametree_core::ProtocolMessage;

use crate::errors::TransportError;

pub mod channel;

/// Opaque address of one isolated context on a transport.
///
/// Endpoints stand in for the "frame element handle" a parent holds before
/// the child has any canonical id: the parent can address the child, but
/// knows nothing about what is behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EndpointId(Uuid);

impl EndpointId {
    pub(crate) fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Where a message is headed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// The root orchestrator's mailbox.
    Root,
    /// One specific isolated context.
    Endpoint(EndpointId),
    /// Every isolated context; receivers filter by frame id.
    Broadcast,
}

/// Message carrier across trust boundaries.
///
/// Delivery is best-effort: implementations may drop messages, and the
/// engines never rely on a send succeeding — every wait is bounded by a
/// timeout fallback.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `message` along `route`.
    async fn send(&self, route: Route, message: ProtocolMessage) -> Result<(), TransportError>;
}

/// Mailbox of the root orchestrator: the sender half is what transports
/// and timers use to inject messages, the receiver half is drained by the
/// engine loops.
pub struct RootMailbox {
    /// Injection side (loop-back sends, synthetic timeout messages).
    pub sender: mpsc::UnboundedSender<ProtocolMessage>,
    /// Consumption side, owned by the orchestrator.
    pub receiver: mpsc::UnboundedReceiver<ProtocolMessage>,
}

/// Send with protocol semantics: failures are swallowed at the send site
/// and left to the timeout fallback.
pub(crate) async fn send_best_effort(
    transport: &Arc<dyn Transport>,
    route: Route,
    message: ProtocolMessage,
) {
    let method = message.method();
    let id = message.frame_id().clone();
    if let Err(error) = transport.send(route, message).await {
        counter!("frametree_transport_send_failures_total").increment(1);
        trace!(%error, method, frame = %id, "send failed; relying on timeout fallback");
    }
}
