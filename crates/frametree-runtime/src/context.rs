//! A context's view of its own document.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use frametree_core::FrameId;

use crate::transport::EndpointId;

/// One execution context's local world: its frame-bearing children in
/// document order plus the document metadata the protocol reports.
///
/// `as_any` lets a paired [`crate::processor::DocumentProcessor`]
/// implementation downcast to the concrete context type it extracts from.
pub trait FrameContext: Send + Sync {
    /// Frame-bearing child elements, in document order.
    fn children(&self) -> Vec<ChildFrame>;

    /// Base URI of this context's document.
    fn base_uri(&self) -> String;

    /// Document title.
    fn title(&self) -> String;

    /// Concrete-type escape hatch for processor implementations.
    fn as_any(&self) -> &dyn Any;
}

/// One frame-bearing child as seen from its parent.
#[derive(Clone)]
pub enum ChildFrame {
    /// The parent holds direct synchronous access to the child context.
    Direct {
        /// Declared source locator.
        source_reference: String,
        /// The child's context, reachable without crossing a boundary.
        context: Arc<dyn FrameContext>,
    },
    /// A trust boundary separates the child; only messaging reaches it.
    Isolated {
        /// Declared source locator; empty when unreadable.
        source_reference: String,
        /// Transport address of the child.
        endpoint: EndpointId,
    },
}

impl ChildFrame {
    /// The child's declared source locator.
    pub fn source_reference(&self) -> &str {
        match self {
            Self::Direct {
                source_reference, ..
            }
            | Self::Isolated {
                source_reference, ..
            } => source_reference,
        }
    }

    /// Whether direct access is available.
    pub fn same_domain(&self) -> bool {
        matches!(self, Self::Direct { .. })
    }
}

/// Same-domain contexts indexed by assigned id, held by whichever actor
/// announced them (the root orchestrator or an isolated responder) so it
/// can answer their `getDataRequest`s in-process.
pub type LocalFrames = HashMap<FrameId, Arc<dyn FrameContext>>;
