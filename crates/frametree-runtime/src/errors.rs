//! Runtime error types.
//!
//! None of these ever aborts a sweep: transport failures are swallowed at
//! the send site (the timeout fallback provides forward progress) and
//! extraction failures degrade to empty payload fields.

use thiserror::Error;

use crate::transport::EndpointId;

/// Errors raised by transport implementations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The receiving side of a channel is gone.
    #[error("message channel closed")]
    ChannelClosed,

    /// No endpoint is registered under the given id.
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(EndpointId),
}

/// Errors raised by document processor implementations during the pure
/// read steps of a `getDataRequest`.
#[derive(Debug, Error)]
#[error("extraction failed: {0}")]
pub struct ExtractError(pub String);
