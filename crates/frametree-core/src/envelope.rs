//! Wire envelope for window-style message channels.
//!
//! Transports that carry protocol messages over a shared string channel
//! frame them as `__FrameTree__::<json>`. Strings without the prefix belong
//! to other listeners on the channel and decode to `None`, as does any
//! malformed JSON after the prefix — the router treats both as silence.

use tracing::trace;

use crate::messages::ProtocolMessage;

/// Envelope prefix identifying frametree traffic on a shared channel.
pub const MESSAGE_PREFIX: &str = "__FrameTree__";

const SEPARATOR: &str = "::";

/// Encode a message into its framed wire form.
pub fn encode(message: &ProtocolMessage) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string(message)?;
    Ok(format!("{MESSAGE_PREFIX}{SEPARATOR}{body}"))
}

/// Decode a framed wire string. `None` for foreign or malformed input.
pub fn decode(raw: &str) -> Option<ProtocolMessage> {
    let body = raw
        .strip_prefix(MESSAGE_PREFIX)
        .and_then(|rest| rest.strip_prefix(SEPARATOR))?;
    match serde_json::from_str(body) {
        Ok(message) => Some(message),
        Err(error) => {
            trace!(%error, "discarding malformed envelope body");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FrameId;
    use crate::messages::SnapshotOptions;

    #[test]
    fn round_trips_a_message() {
        let msg = ProtocolMessage::GetDataRequest {
            id: FrameId::root().child(4),
            options: SnapshotOptions {
                remove_hidden_elements: true,
                compress_html: true,
            },
        };
        let wire = encode(&msg).unwrap();
        assert!(wire.starts_with("__FrameTree__::{"));
        assert_eq!(decode(&wire).unwrap(), msg);
    }

    #[test]
    fn foreign_strings_decode_to_none() {
        assert!(decode("hello").is_none());
        assert!(decode("__OtherListener__::{}").is_none());
        assert!(decode("").is_none());
    }

    #[test]
    fn malformed_body_decodes_to_none() {
        assert!(decode("__FrameTree__::not json").is_none());
        assert!(decode("__FrameTree__::{\"method\":\"unknownMethod\"}").is_none());
        assert!(decode("__FrameTree__::").is_none());
    }
}
