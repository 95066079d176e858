//! Discovered frame records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::FrameId;
use crate::messages::{FrameDescriptor, FramePayload};

/// One entry per discovered context.
///
/// Discovery fills the identity fields and flips `processed` once the
/// node's subtree report has been merged; Collection populates the content
/// fields at most once per sweep (a node that timed out keeps them `None`,
/// which callers must treat as a valid degraded case).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    /// Canonical dotted-path id.
    pub id: FrameId,
    /// Zero-based index among frame-bearing siblings.
    pub index: u32,
    /// Whether the parent held direct synchronous access at discovery time.
    pub same_domain: bool,
    /// Declared source locator; empty when unreadable.
    #[serde(default)]
    pub source_reference: String,
    /// Set once this node's subtree report has been merged at the root.
    pub processed: bool,
    /// Serialized document content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Base URI of the context's document.
    #[serde(rename = "baseURI", skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    /// Document title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Auxiliary stylesheet text.
    #[serde(rename = "auxiliaryStyleText", skip_serializing_if = "Option::is_none")]
    pub auxiliary_style_text: Option<String>,
    /// Auxiliary binary payload (canvas-style data).
    #[serde(rename = "auxiliaryBinaryData", skip_serializing_if = "Option::is_none")]
    pub auxiliary_binary_data: Option<Value>,
}

impl FrameNode {
    /// A freshly discovered node with no content.
    pub fn discovered(id: FrameId, index: u32, same_domain: bool, source_reference: String) -> Self {
        Self {
            id,
            index,
            same_domain,
            source_reference,
            processed: false,
            content: None,
            base_uri: None,
            title: None,
            auxiliary_style_text: None,
            auxiliary_binary_data: None,
        }
    }

    /// A node registered from a parent's subtree descriptor.
    pub fn from_descriptor(descriptor: FrameDescriptor) -> Self {
        Self::discovered(
            descriptor.id,
            descriptor.index,
            descriptor.same_domain,
            descriptor.source_reference,
        )
    }

    /// Tree depth of this node's id.
    pub fn depth(&self) -> usize {
        self.id.depth()
    }

    /// Copy a collection payload into the content fields.
    pub fn apply_payload(&mut self, payload: FramePayload) {
        self.content = payload.content;
        self.base_uri = payload.base_uri;
        self.title = payload.title;
        self.auxiliary_style_text = payload.auxiliary_style_text;
        self.auxiliary_binary_data = payload.auxiliary_binary_data;
    }

    /// Whether Collection populated any content for this node.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovered_node_is_bare() {
        let node = FrameNode::discovered(FrameId::root().child(0), 0, true, String::new());
        assert!(!node.processed);
        assert!(!node.has_content());
        assert_eq!(node.depth(), 1);
    }

    #[test]
    fn apply_payload_sets_content_fields() {
        let mut node = FrameNode::discovered(FrameId::root(), 0, true, String::new());
        node.apply_payload(FramePayload {
            content: Some("<html/>".into()),
            base_uri: Some("about:blank".into()),
            title: Some("t".into()),
            auxiliary_style_text: Some(String::new()),
            auxiliary_binary_data: None,
        });
        assert!(node.has_content());
        assert_eq!(node.base_uri.as_deref(), Some("about:blank"));
    }

    #[test]
    fn empty_payload_leaves_node_contentless() {
        let mut node = FrameNode::discovered(FrameId::root().child(1), 1, false, "src".into());
        node.apply_payload(FramePayload::default());
        assert!(!node.has_content());
    }

    #[test]
    fn serializes_camel_case() {
        let node = FrameNode::discovered(FrameId::root().child(1), 1, false, "src".into());
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["sameDomain"], false);
        assert_eq!(value["sourceReference"], "src");
        assert!(value.get("content").is_none());
    }
}
