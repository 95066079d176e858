//! Protocol messages.
//!
//! Four methods, serde-tagged by `method` with camelCase field names so the
//! wire format matches the window-bridge envelope:
//!
//! - `initRequest` (parent → child): assigns the child its canonical id
//! - `initResponse` (child → root): reports one context's immediate subtree
//! - `getDataRequest` (root → any node): asks for the content payload
//! - `getDataResponse` (any node → root): carries the payload back
//!
//! Timeout fallbacks are expressed as messages too: a fired timer injects a
//! synthetic empty `initResponse` or `getDataResponse`, so every wait in the
//! engines resolves through the same path as a real reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::FrameId;

/// Per-sweep content options, forwarded verbatim to the document processor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Drop elements that are not visible before extraction.
    #[serde(rename = "removeHiddenElements", default)]
    pub remove_hidden_elements: bool,
    /// Compress extracted markup.
    #[serde(rename = "compressHTML", default)]
    pub compress_html: bool,
}

/// One child entry in an `initResponse` subtree report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameDescriptor {
    /// Canonical id assigned to the child.
    pub id: FrameId,
    /// Zero-based position among frame-bearing siblings.
    pub index: u32,
    /// Whether the reporting parent holds direct access to the child.
    pub same_domain: bool,
    /// Declared source locator; empty when unreadable across the boundary.
    #[serde(default)]
    pub source_reference: String,
}

/// Content payload of a `getDataResponse`.
///
/// All fields are optional: a synthetic timeout response carries none, and
/// a degraded extraction may carry only a subset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FramePayload {
    /// Serialized document content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Base URI of the context's document.
    #[serde(rename = "baseURI", skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Auxiliary stylesheet text collected alongside the content.
    #[serde(rename = "auxiliaryStyleText", skip_serializing_if = "Option::is_none")]
    pub auxiliary_style_text: Option<String>,
    /// Auxiliary binary payload (canvas-style data), JSON-encoded.
    #[serde(rename = "auxiliaryBinaryData", skip_serializing_if = "Option::is_none")]
    pub auxiliary_binary_data: Option<Value>,
}

impl FramePayload {
    /// Whether the payload carries no data at all (synthetic timeout shape).
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.base_uri.is_none()
            && self.title.is_none()
            && self.auxiliary_style_text.is_none()
            && self.auxiliary_binary_data.is_none()
    }
}

/// A protocol message, tagged by method on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum ProtocolMessage {
    /// Parent → child: adopt `id` and announce your subtree.
    #[serde(rename = "initRequest")]
    InitRequest {
        /// Canonical id assigned to the receiving context.
        id: FrameId,
        /// The receiver's index among its siblings.
        index: u32,
    },

    /// Child → root: one context's immediate children.
    #[serde(rename = "initResponse")]
    InitResponse {
        /// Id of the reporting context.
        id: FrameId,
        /// The reporter's index among its siblings.
        index: u32,
        /// Immediate frame-bearing children, document order.
        #[serde(default)]
        subtree: Vec<FrameDescriptor>,
    },

    /// Root → node: request the content payload.
    #[serde(rename = "getDataRequest")]
    GetDataRequest {
        /// Target node id; receivers ignore requests for ids they do not own.
        id: FrameId,
        /// Content options for the document processor.
        options: SnapshotOptions,
    },

    /// Node → root: the content payload (possibly empty on timeout).
    #[serde(rename = "getDataResponse")]
    GetDataResponse {
        /// Id of the responding node.
        id: FrameId,
        /// Extracted content fields.
        #[serde(flatten)]
        payload: FramePayload,
    },
}

impl ProtocolMessage {
    /// Wire method name of this message.
    pub fn method(&self) -> &'static str {
        match self {
            Self::InitRequest { .. } => "initRequest",
            Self::InitResponse { .. } => "initResponse",
            Self::GetDataRequest { .. } => "getDataRequest",
            Self::GetDataResponse { .. } => "getDataResponse",
        }
    }

    /// The frame id this message is about.
    pub fn frame_id(&self) -> &FrameId {
        match self {
            Self::InitRequest { id, .. }
            | Self::InitResponse { id, .. }
            | Self::GetDataRequest { id, .. }
            | Self::GetDataResponse { id, .. } => id,
        }
    }

    /// Synthetic childless `initResponse`, used by init timeout fallbacks.
    pub fn empty_init_response(id: FrameId, index: u32) -> Self {
        Self::InitResponse {
            id,
            index,
            subtree: Vec::new(),
        }
    }

    /// Synthetic contentless `getDataResponse`, used by data timeout fallbacks.
    pub fn empty_data_response(id: FrameId) -> Self {
        Self::GetDataResponse {
            id,
            payload: FramePayload::default(),
        }
    }
}
