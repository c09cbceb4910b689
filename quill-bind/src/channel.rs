//! Boundary between a binding and the collaboration layer.
//!
//! Inbound, everything arrives as a [`RemoteEvent`] on a single ordered
//! channel. Outbound, the binding calls a [`Collaborator`]. Sends are
//! synchronous and fire-and-forget; any later acknowledgement from the remote
//! side comes back as another inbound event.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::transform::Transform;

/// Full document content, delivered once before editing is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub content: String,
}

impl DocumentSnapshot {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Events pushed to a binding by the collaboration layer.
///
/// JSON form: `{"type": "transforms", "body": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum RemoteEvent {
    /// Initial document snapshot
    Document(DocumentSnapshot),
    /// Ordered batch of transforms from other participants
    Transforms(Vec<Transform>),
    /// Session ended
    Disconnect,
    /// Opaque presence data for the presence UI
    Presence(serde_json::Value),
}

impl RemoteEvent {
    /// Short name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Transforms(_) => "transforms",
            Self::Disconnect => "disconnect",
            Self::Presence(_) => "presence",
        }
    }
}

/// The remote side refused a locally produced transform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transform rejected: {reason}")]
pub struct Rejection {
    pub reason: String,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Outbound actions a binding performs.
pub trait Collaborator {
    /// Submit a local transform. `Err` means the remote side considers it
    /// invalid against its copy of the document.
    fn send_transform(&mut self, transform: &Transform) -> Result<(), Rejection>;

    /// Report the local caret offset.
    fn update_cursor(&mut self, offset: usize);

    /// Surface a diagnostic to the application. Never a panic or abort.
    fn raise_error(&mut self, message: &str);

    /// Presence payloads are handed on untouched. Ignored by default.
    fn presence(&mut self, _payload: &serde_json::Value) {}
}

/// An outbound action, as forwarded by [`ChannelCollaborator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Outbound {
    Transform(Transform),
    Cursor(usize),
    Error(String),
    Presence(serde_json::Value),
}

/// Collaborator that forwards every action into a tokio channel.
///
/// Transforms that change nothing are rejected before they reach the
/// channel. Once the receiver has gone away every action is dropped; a closed
/// transport is not a verdict on the transform.
#[derive(Debug, Clone)]
pub struct ChannelCollaborator {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelCollaborator {
    /// Create a collaborator and the receiver its actions arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Collaborator for ChannelCollaborator {
    fn send_transform(&mut self, transform: &Transform) -> Result<(), Rejection> {
        transform
            .validate()
            .map_err(|e| Rejection::new(e.to_string()))?;
        if self.tx.send(Outbound::Transform(transform.clone())).is_err() {
            log::debug!("Outbound channel closed, dropping transform at {}", transform.position);
        }
        Ok(())
    }

    fn update_cursor(&mut self, offset: usize) {
        let _ = self.tx.send(Outbound::Cursor(offset));
    }

    fn raise_error(&mut self, message: &str) {
        let _ = self.tx.send(Outbound::Error(message.to_string()));
    }

    fn presence(&mut self, payload: &serde_json::Value) {
        let _ = self.tx.send(Outbound::Presence(payload.clone()));
    }
}

/// Create the inbound event channel for a binding.
///
/// The sender belongs to the collaboration layer; the receiver is handed to
/// [`crate::Binding::bind`].
pub fn remote_events(capacity: usize) -> (mpsc::Sender<RemoteEvent>, mpsc::Receiver<RemoteEvent>) {
    mpsc::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_event_json() {
        let event: RemoteEvent =
            serde_json::from_str(r#"{"type":"document","body":{"content":"hello"}}"#).unwrap();
        assert_eq!(event, RemoteEvent::Document(DocumentSnapshot::new("hello")));

        let event: RemoteEvent = serde_json::from_str(
            r#"{"type":"transforms","body":[{"position":0,"insert":"X"},{"position":1,"num_delete":1}]}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            RemoteEvent::Transforms(vec![Transform::insert(0, "X"), Transform::delete(1, 1)])
        );

        let event: RemoteEvent = serde_json::from_str(r#"{"type":"disconnect"}"#).unwrap();
        assert_eq!(event, RemoteEvent::Disconnect);
    }

    #[test]
    fn test_presence_payload_is_opaque() {
        let payload = json!({"user": {"id": "abc", "position": 4}, "extra": [1, 2]});
        let event = RemoteEvent::Presence(payload.clone());
        let encoded = serde_json::to_string(&event).unwrap();
        let decoded: RemoteEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, RemoteEvent::Presence(payload));
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(RemoteEvent::Disconnect.kind(), "disconnect");
        assert_eq!(RemoteEvent::Transforms(vec![]).kind(), "transforms");
    }

    #[test]
    fn test_channel_collaborator_forwards() {
        let (mut collab, mut rx) = ChannelCollaborator::new();
        collab.send_transform(&Transform::insert(5, "x")).unwrap();
        collab.update_cursor(6);
        collab.raise_error("boom");
        collab.presence(&json!({"id": 1}));

        assert_eq!(rx.try_recv().unwrap(), Outbound::Transform(Transform::insert(5, "x")));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Cursor(6));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Error("boom".into()));
        assert_eq!(rx.try_recv().unwrap(), Outbound::Presence(json!({"id": 1})));
    }

    #[test]
    fn test_channel_collaborator_rejects_noop() {
        let (mut collab, mut rx) = ChannelCollaborator::new();
        let err = collab.send_transform(&Transform::insert(0, "")).unwrap_err();
        assert!(err.reason.contains("changes nothing"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_collaborator_closed_is_not_rejection() {
        let (mut collab, rx) = ChannelCollaborator::new();
        drop(rx);
        assert_eq!(collab.send_transform(&Transform::insert(0, "a")), Ok(()));
    }
}
