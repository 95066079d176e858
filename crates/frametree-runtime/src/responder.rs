//! Responder actor for isolated contexts.
//!
//! Each isolated context runs one [`FrameResponder`] over its endpoint
//! mailbox. An `initRequest` hands it its canonical id: it adopts the id,
//! forgets ids from any prior sweep, and announces its subtree toward the
//! root. A `getDataRequest` is a broadcast; the responder answers only for
//! ids it adopted and stays silent otherwise.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use frametree_core::{ProtocolConfig, ProtocolMessage};

use crate::context::{FrameContext, LocalFrames};
use crate::discovery::{RootSink, announce_context};
use crate::processor::{DocumentProcessor, answer_data_request};
use crate::transport::{Route, Transport, send_best_effort};

/// Message-driven actor answering protocol requests for one isolated
/// context and its same-domain descendants.
pub struct FrameResponder {
    context: Arc<dyn FrameContext>,
    processor: Arc<dyn DocumentProcessor>,
    transport: Arc<dyn Transport>,
    receiver: mpsc::UnboundedReceiver<ProtocolMessage>,
    config: ProtocolConfig,
    local: LocalFrames,
}

impl FrameResponder {
    /// Build a responder over its endpoint mailbox.
    pub fn new(
        context: Arc<dyn FrameContext>,
        processor: Arc<dyn DocumentProcessor>,
        transport: Arc<dyn Transport>,
        receiver: mpsc::UnboundedReceiver<ProtocolMessage>,
        config: ProtocolConfig,
    ) -> Self {
        Self {
            context,
            processor,
            transport,
            receiver,
            config,
            local: LocalFrames::new(),
        }
    }

    /// Drive the actor until its endpoint channel closes.
    pub async fn run(mut self) {
        while let Some(message) = self.receiver.recv().await {
            self.handle(message).await;
        }
    }

    async fn handle(&mut self, message: ProtocolMessage) {
        match message {
            ProtocolMessage::InitRequest { id, index } => {
                debug!(frame = %id, "adopting id and announcing subtree");
                // A new sweep may re-assign ids; prior adoptions are void.
                self.local.clear();
                let _ = self.local.insert(id.clone(), Arc::clone(&self.context));
                announce_context(
                    &self.context,
                    id,
                    index,
                    &self.transport,
                    &RootSink::Remote,
                    &mut self.local,
                    Some(&self.config),
                )
                .await;
            }
            ProtocolMessage::GetDataRequest { id, options } => {
                let Some(context) = self.local.get(&id) else {
                    trace!(frame = %id, "ignoring data request for unadopted id");
                    return;
                };
                let response =
                    answer_data_request(self.processor.as_ref(), context.as_ref(), id, &options);
                send_best_effort(&self.transport, Route::Root, response).await;
            }
            other => {
                trace!(method = other.method(), "responder ignoring message");
            }
        }
    }
}
