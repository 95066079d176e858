//! In-memory channel transport.
//!
//! One [`ChannelHub`] models the message fabric of a single page: a root
//! mailbox plus one unbounded channel per isolated context. Used by the
//! test harness and by embedders that host all contexts in one process.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use frametree_core::ProtocolMessage;

use super::{EndpointId, RootMailbox, Route, Transport};
use crate::errors::TransportError;

/// In-memory transport hub.
#[derive(Default)]
pub struct ChannelHub {
    root: Mutex<Option<mpsc::UnboundedSender<ProtocolMessage>>>,
    endpoints: DashMap<EndpointId, mpsc::UnboundedSender<ProtocolMessage>>,
}

impl ChannelHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the root mailbox. A second call replaces the first, which
    /// detaches any previous orchestrator from the hub.
    pub fn register_root(&self) -> RootMailbox {
        let (sender, receiver) = mpsc::unbounded_channel();
        *self.root.lock() = Some(sender.clone());
        RootMailbox { sender, receiver }
    }

    /// Register an isolated context, returning its address and inbound
    /// message stream.
    pub fn register_endpoint(&self) -> (EndpointId, mpsc::UnboundedReceiver<ProtocolMessage>) {
        let endpoint = EndpointId::new();
        let (sender, receiver) = mpsc::unbounded_channel();
        let _ = self.endpoints.insert(endpoint, sender);
        (endpoint, receiver)
    }

    /// Remove an endpoint, modeling a context destroyed mid-protocol.
    /// Subsequent sends to it fail (and are swallowed at the send site).
    pub fn disconnect(&self, endpoint: EndpointId) {
        let _ = self.endpoints.remove(&endpoint);
    }

    /// Number of registered endpoints.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }
}

#[async_trait]
impl Transport for ChannelHub {
    async fn send(&self, route: Route, message: ProtocolMessage) -> Result<(), TransportError> {
        match route {
            Route::Root => {
                let sender = self.root.lock().clone().ok_or(TransportError::ChannelClosed)?;
                sender
                    .send(message)
                    .map_err(|_| TransportError::ChannelClosed)
            }
            Route::Endpoint(endpoint) => {
                let sender = self
                    .endpoints
                    .get(&endpoint)
                    .map(|entry| entry.value().clone())
                    .ok_or(TransportError::UnknownEndpoint(endpoint))?;
                sender
                    .send(message)
                    .map_err(|_| TransportError::ChannelClosed)
            }
            Route::Broadcast => {
                // Best-effort per receiver; a dropped endpoint never blocks
                // delivery to the others.
                for entry in &self.endpoints {
                    let _ = entry.value().send(message.clone());
                }
                Ok(())
            }
        }
    }
}
