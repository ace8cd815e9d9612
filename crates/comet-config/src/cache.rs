//! Thread-safe configuration caching with arc-swap for lock-free reads.

use crate::schema::Config;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

/// Lock-free holder of the active configuration.
///
/// Readers take a cheap snapshot with [`ConfigCache::get`]; writers publish a
/// whole new `Config` so a reader never observes a half-applied change.
#[derive(Debug)]
pub struct ConfigCache {
    config: ArcSwap<Config>,
}

impl ConfigCache {
    /// Creates a new configuration cache with the given initial configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
        }
    }

    /// Snapshot of the current configuration.
    pub fn get(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Replaces the configuration atomically.
    pub fn update(&self, config: Config) {
        self.config.store(Arc::new(config));
        info!("Configuration replaced");
    }

    /// Applies `change` to a copy of the current configuration and publishes it.
    ///
    /// Concurrent modifications are retried, so `change` may run more than once.
    pub fn modify<F>(&self, change: F) -> Arc<Config>
    where
        F: Fn(&mut Config),
    {
        self.config.rcu(|current| {
            let mut next = Config::clone(current);
            change(&mut next);
            next
        });
        self.get()
    }

    /// Flips the global enable switch, returning the new state.
    pub fn toggle_enabled(&self) -> bool {
        let previous = self.config.rcu(|current| {
            let mut next = Config::clone(current);
            next.bot.enabled = !next.bot.enabled;
            next
        });
        let enabled = !previous.bot.enabled;
        info!(enabled, "Bot enable switch toggled");
        enabled
    }
}

impl Default for ConfigCache {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
