//! Shared state handed to every command

use crate::{
    cooldown::CooldownTracker,
    filter::MessageFilter,
    permissions::{InMemoryUserStore, UserStore},
    registry::CommandRegistry,
    session::SessionRegistry,
};
use comet_api::TwitterClient;
use comet_common::{ActorId, MessageEvent, OutgoingMessage, Result};
use comet_config::ConfigCache;
use std::sync::Arc;
use tokio::time::Instant;

/// Injectable containers shared by the dispatcher and all commands
#[derive(Clone)]
pub struct CommandContext {
    /// Live configuration
    pub config: Arc<ConfigCache>,
    /// Registered chat commands
    pub registry: Arc<CommandRegistry>,
    /// Active sessions
    pub sessions: Arc<SessionRegistry>,
    /// Cooldown ledger
    pub cooldowns: Arc<CooldownTracker>,
    /// User records
    pub users: Arc<dyn UserStore>,
    /// External lookup client
    pub twitter: Arc<TwitterClient>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl CommandContext {
    /// Context with fresh session, cooldown and in-memory user containers following `config`
    pub fn new(
        config: Arc<ConfigCache>,
        registry: Arc<CommandRegistry>,
        twitter: Arc<TwitterClient>,
    ) -> Self {
        Self {
            cooldowns: Arc::new(CooldownTracker::new(Arc::clone(&config))),
            users: Arc::new(InMemoryUserStore::from_config(Arc::clone(&config))),
            config,
            registry,
            sessions: Arc::new(SessionRegistry::new()),
            twitter,
            started_at: Instant::now(),
        }
    }

    /// Replace the user store
    pub fn with_user_store(mut self, users: Arc<dyn UserStore>) -> Self {
        self.users = users;
        self
    }

    /// Whether `actor` is the configured owner
    pub fn is_owner(&self, actor: ActorId) -> bool {
        self.config.get().bot.owner() == actor
    }

    /// `message` after the banned-word filter of the live configuration
    pub fn filter_outgoing(&self, message: OutgoingMessage) -> OutgoingMessage {
        MessageFilter::from_config(&self.config.get().filter).apply(message)
    }

    /// Filter `message` and send it into the conversation of `event`
    pub async fn reply(
        &self,
        event: &MessageEvent,
        message: impl Into<OutgoingMessage> + Send,
    ) -> Result<()> {
        event.reply(self.filter_outgoing(message.into())).await
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("commands", &self.registry.len())
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
