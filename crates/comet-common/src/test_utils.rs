//! Test utilities and shared fixtures for Comet Bot.
//!
//! Enabled inside this crate's tests and for other crates through the
//! `testing` feature.

use crate::{
    error::Result,
    message::{MessageEvent, OutgoingMessage, Replier},
    types::{ActorId, ScopeId},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

/// Initialize logging for tests. Safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// `Replier` that records everything sent through it
#[derive(Debug, Default)]
pub struct RecordingReplier {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingReplier {
    /// Create a shared recorder
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All messages sent so far
    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Plain text of all messages sent so far
    pub fn texts(&self) -> Vec<String> {
        self.messages().iter().map(OutgoingMessage::plain_text).collect()
    }

    /// Plain text of the most recent message
    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    /// Forget recorded messages
    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait]
impl Replier for RecordingReplier {
    async fn reply(&self, message: OutgoingMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

/// Message event posted by `sender` in `group`
pub fn group_message(
    sender: u64,
    group: u64,
    text: &str,
    replier: Arc<RecordingReplier>,
) -> MessageEvent {
    MessageEvent::new(
        ActorId(sender),
        format!("user{sender}"),
        Some(ScopeId(group)),
        text,
        replier,
    )
}

/// Message event sent privately by `sender`
pub fn private_message(sender: u64, text: &str, replier: Arc<RecordingReplier>) -> MessageEvent {
    MessageEvent::new(ActorId(sender), format!("user{sender}"), None, text, replier)
}

/// Create a temporary directory for tests that automatically cleans up.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}
