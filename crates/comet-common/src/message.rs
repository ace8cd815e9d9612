//! Inbound message events and the outgoing message model

use crate::{
    error::Result,
    types::{ActorId, Scope, ScopeId},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// One element of an outgoing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageSegment {
    /// Plain text
    Text(String),
    /// A non-text element (image, mention, face, ...) the transport renders
    Rich {
        /// Element kind understood by the transport, e.g. "image"
        kind: String,
        /// Transport specific payload (url, id, ...)
        payload: String,
    },
}

/// Ordered list of segments sent back into a conversation.
///
/// `OutgoingMessage::empty()` means "no reply" and is never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    segments: Vec<MessageSegment>,
}

impl OutgoingMessage {
    /// The distinguished "no reply" value
    pub fn empty() -> Self {
        Self::default()
    }

    /// A message with a single text segment. Empty text gives the empty message.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::empty();
        }
        Self {
            segments: vec![MessageSegment::Text(text)],
        }
    }

    /// Build a message from existing segments
    pub fn from_segments(segments: Vec<MessageSegment>) -> Self {
        Self { segments }
    }

    /// Append a text segment
    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.segments.push(MessageSegment::Text(text.into()));
        self
    }

    /// Append a rich element
    pub fn push_rich(&mut self, kind: impl Into<String>, payload: impl Into<String>) -> &mut Self {
        self.segments.push(MessageSegment::Rich {
            kind: kind.into(),
            payload: payload.into(),
        });
        self
    }

    /// Whether this is the "no reply" value
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments in send order
    pub fn segments(&self) -> &[MessageSegment] {
        &self.segments
    }

    /// Consume the message, returning its segments
    pub fn into_segments(self) -> Vec<MessageSegment> {
        self.segments
    }

    /// Concatenated text of all text segments
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                MessageSegment::Text(text) => Some(text.as_str()),
                MessageSegment::Rich { .. } => None,
            })
            .collect()
    }
}

impl From<&str> for OutgoingMessage {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for OutgoingMessage {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

/// Capability to send a message back into the conversation an event came from
#[async_trait]
pub trait Replier: Send + Sync {
    /// Deliver `message` to the originating conversation
    async fn reply(&self, message: OutgoingMessage) -> Result<()>;
}

/// A message received from the transport
#[derive(Clone)]
pub struct MessageEvent {
    /// Who sent the message
    pub sender: ActorId,
    /// Display name of the sender
    pub sender_name: String,
    /// Group the message was posted in; `None` for private chats
    pub group: Option<ScopeId>,
    /// Raw message text
    pub text: String,
    /// Reply channel back into the originating conversation
    pub replier: Arc<dyn Replier>,
}

impl MessageEvent {
    /// Create an event
    pub fn new(
        sender: ActorId,
        sender_name: impl Into<String>,
        group: Option<ScopeId>,
        text: impl Into<String>,
        replier: Arc<dyn Replier>,
    ) -> Self {
        Self {
            sender,
            sender_name: sender_name.into(),
            group,
            text: text.into(),
            replier,
        }
    }

    /// Session scope of this event
    pub fn scope(&self) -> Scope {
        match self.group {
            Some(group) => Scope::Group(group),
            None => Scope::Private(self.sender),
        }
    }

    /// Whether the message was posted in a group
    pub fn is_group(&self) -> bool {
        self.group.is_some()
    }

    /// Send `message` back to the originating conversation. Empty messages are dropped.
    pub async fn reply(&self, message: impl Into<OutgoingMessage>) -> Result<()> {
        let message = message.into();
        if message.is_empty() {
            return Ok(());
        }
        self.replier.reply(message).await
    }
}

impl fmt::Debug for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageEvent")
            .field("sender", &self.sender)
            .field("sender_name", &self.sender_name)
            .field("group", &self.group)
            .field("text", &self.text)
            .finish_non_exhaustive()
    }
}
