//! Document processor contract and the shared `getDataRequest` answer path.
//!
//! Producing and restoring the actual page content is an external
//! collaborator's job; the protocol only guarantees the calling order:
//! `pre_process`, then the pure extraction reads, then `post_process` —
//! always, so a context is restored to its pre-request state even when an
//! extraction fails.

use serde_json::Value;
use tracing::warn;

use frametree_core::{FrameId, FramePayload, ProtocolMessage, SnapshotOptions};

use crate::context::FrameContext;
use crate::errors::ExtractError;

/// Content production hooks consumed when answering a `getDataRequest`.
pub trait DocumentProcessor: Send + Sync {
    /// Side-effecting preparation (hiding/compressing). Called once per
    /// request; implementations must tolerate that.
    fn pre_process(&self, context: &dyn FrameContext, options: &SnapshotOptions);

    /// Serialized document content.
    fn extract_content(&self, context: &dyn FrameContext) -> Result<String, ExtractError>;

    /// Auxiliary stylesheet text.
    fn extract_auxiliary_style(&self, context: &dyn FrameContext) -> Result<String, ExtractError>;

    /// Auxiliary binary payload (canvas-style data), JSON-encoded.
    fn extract_auxiliary_binary(&self, context: &dyn FrameContext) -> Result<Value, ExtractError>;

    /// Side-effecting cleanup restoring the pre-request state. Invoked
    /// after extraction regardless of success.
    fn post_process(&self, context: &dyn FrameContext, options: &SnapshotOptions);
}

/// Build the `getDataResponse` for one context.
///
/// Extraction failures degrade to absent fields; they never fail the
/// request, and `post_process` runs either way.
pub(crate) fn answer_data_request(
    processor: &dyn DocumentProcessor,
    context: &dyn FrameContext,
    id: FrameId,
    options: &SnapshotOptions,
) -> ProtocolMessage {
    processor.pre_process(context, options);

    let content = checked(&id, "content", processor.extract_content(context));
    let auxiliary_style_text = checked(
        &id,
        "auxiliaryStyleText",
        processor.extract_auxiliary_style(context),
    );
    let auxiliary_binary_data = checked(
        &id,
        "auxiliaryBinaryData",
        processor.extract_auxiliary_binary(context),
    );
    let payload = FramePayload {
        content,
        base_uri: Some(context.base_uri()),
        title: Some(context.title()),
        auxiliary_style_text,
        auxiliary_binary_data,
    };

    processor.post_process(context, options);
    ProtocolMessage::GetDataResponse { id, payload }
}

fn checked<T>(id: &FrameId, field: &str, result: Result<T, ExtractError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(frame = %id, field, %error, "extraction failed; degrading to empty field");
            None
        }
    }
}
