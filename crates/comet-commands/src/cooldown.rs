//! Per-actor cooldown tracking

use comet_common::ActorId;
use comet_config::{BotConfig, ConfigCache};
use dashmap::{mapref::entry::Entry, DashMap};
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::debug;

/// Last-trigger timestamp per actor.
///
/// A trigger is allowed when the actor has no entry or its entry is at least
/// one window old; an allowed trigger restarts the window. Entries are only
/// ever replaced on the next allowed trigger, never swept.
///
/// Owner, blocked account, administrators and the default window are read
/// from the live configuration on every check.
#[derive(Debug)]
pub struct CooldownTracker {
    entries: DashMap<ActorId, Instant>,
    config: Arc<ConfigCache>,
}

impl CooldownTracker {
    /// Create a tracker following `config`
    pub fn new(config: Arc<ConfigCache>) -> Self {
        Self {
            entries: DashMap::new(),
            config,
        }
    }

    /// Whether `actor` may trigger now under `window`, recording the trigger if so
    pub fn is_allowed(&self, actor: ActorId, window: Duration) -> bool {
        let config = self.config.get();
        self.check(&config.bot, actor, window)
    }

    /// [`Self::is_allowed`] under the configured default window. Administrators are exempt.
    pub fn is_allowed_default(&self, actor: ActorId) -> bool {
        let config = self.config.get();
        let bot = &config.bot;
        if bot.blocked() != Some(actor) && bot.admin_ids.contains(&actor.0) {
            return true;
        }
        self.check(bot, actor, bot.cooldown())
    }

    fn check(&self, bot: &BotConfig, actor: ActorId, window: Duration) -> bool {
        if bot.blocked() == Some(actor) {
            return false;
        }
        if actor == bot.owner() || window < Duration::from_secs(1) {
            return true;
        }

        let now = Instant::now();
        match self.entries.entry(actor) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.duration_since(*entry.get());
                if elapsed >= window {
                    entry.insert(now);
                    true
                } else {
                    debug!(
                        actor = %actor,
                        remaining_ms = (window - elapsed).as_millis() as u64,
                        "Actor is on cooldown"
                    );
                    false
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                true
            }
        }
    }

    /// Number of actors with a recorded trigger
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no triggers are recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
