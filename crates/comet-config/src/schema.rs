//! Configuration schema

use comet_common::{ActorId, LoggingConfig, ScopeId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatcher and identity settings
    pub bot: BotConfig,
    /// Outgoing message filter
    pub filter: FilterConfig,
    /// Per-group overrides
    pub groups: Vec<GroupConfig>,
    /// External lookup API client
    pub twitter: TwitterConfig,
    /// Logging output
    pub logging: LoggingConfig,
}

/// Dispatcher and identity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Leading strings that mark a message as a command invocation
    pub command_prefixes: Vec<String>,
    /// Global enable switch; when off only the diagnostic command runs
    pub enabled: bool,
    /// Owner account. Always cooldown-exempt and registered at owner level.
    pub owner_id: u64,
    /// Account that never passes cooldown checks
    pub blocked_id: Option<u64>,
    /// Accounts registered at admin level
    pub admin_ids: Vec<u64>,
    /// Default cooldown window in seconds; below 1 disables throttling
    pub cooldown_seconds: u64,
    /// Command that still runs while the bot is disabled
    pub diagnostic_command: String,
}

/// Outgoing message filter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Substrings redacted from outgoing text
    pub banned_words: Vec<String>,
    /// Redactions allowed before the whole message is suppressed
    pub max_redactions: usize,
}

/// Overrides for one group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Group id
    pub id: u64,
    /// Command names that are silently ignored in this group
    pub disabled_commands: Vec<String>,
}

/// External lookup API client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    /// OAuth consumer key
    pub consumer_key: String,
    /// OAuth consumer secret
    pub consumer_secret: String,
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Token endpoint for the client-credentials exchange
    pub token_url: String,
    /// Optional HTTP proxy host
    pub proxy_url: Option<String>,
    /// Proxy port, used with `proxy_url`
    pub proxy_port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Remote calls allowed per tracking window
    pub call_limit: u32,
    /// Tracking window length in seconds
    pub window_secs: u64,
    /// Freshness of cached posts in seconds
    pub cache_ttl_secs: u64,
    /// Maximum number of cached lookup keys
    pub cache_capacity: u64,
    /// Attempts made by the retry helper
    pub max_retries: usize,
    /// Directory for unparseable-response reports
    pub diagnostics_dir: String,
}

impl Config {
    /// Whether `command` is disabled in `group`
    pub fn is_command_disabled(&self, group: ScopeId, command: &str) -> bool {
        self.group(group)
            .is_some_and(|g| g.disabled_commands.iter().any(|c| c == command))
    }

    /// Overrides for `group`, if any
    pub fn group(&self, group: ScopeId) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.id == group.0)
    }
}

impl BotConfig {
    /// Owner account id
    pub fn owner(&self) -> ActorId {
        ActorId(self.owner_id)
    }

    /// Blocked account id, if configured
    pub fn blocked(&self) -> Option<ActorId> {
        self.blocked_id.map(ActorId)
    }

    /// Default cooldown window
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }
}

impl TwitterConfig {
    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Tracking window for the call budget
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Freshness of cached posts
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Full proxy URL, when a proxy host is configured
    pub fn proxy(&self) -> Option<String> {
        self.proxy_url
            .as_deref()
            .filter(|host| !host.is_empty())
            .map(|host| {
                if host.contains("://") {
                    format!("{host}:{}", self.proxy_port)
                } else {
                    format!("http://{host}:{}", self.proxy_port)
                }
            })
    }

    /// Whether API credentials are configured
    pub fn has_credentials(&self) -> bool {
        !self.consumer_key.is_empty() && !self.consumer_secret.is_empty()
    }
}
