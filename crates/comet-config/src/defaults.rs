//! Default values for every configuration section.

use crate::schema::*;
use comet_common::LoggingConfig;

/// Account that is always refused by the cooldown tracker unless configured otherwise
pub const DEFAULT_BLOCKED_ID: u64 = 80_000_000;

/// Remote calls allowed per tracking window
pub const DEFAULT_CALL_LIMIT: u32 = 1500;

/// Tracking window for the call budget, in seconds
pub const DEFAULT_WINDOW_SECS: u64 = 15 * 60;

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            filter: FilterConfig::default(),
            groups: Vec::new(),
            twitter: TwitterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefixes: vec!["/".to_string(), "#".to_string()],
            enabled: true,
            owner_id: 0,
            blocked_id: Some(DEFAULT_BLOCKED_ID),
            admin_ids: Vec::new(),
            cooldown_seconds: 7,
            diagnostic_command: "debug".to_string(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            banned_words: Vec::new(),
            max_redactions: 5,
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            api_base_url: "https://api.twitter.com/1.1".to_string(),
            token_url: "https://api.twitter.com/oauth2/token".to_string(),
            proxy_url: None,
            proxy_port: 8080,
            timeout_secs: 10,
            call_limit: DEFAULT_CALL_LIMIT,
            window_secs: DEFAULT_WINDOW_SECS,
            cache_ttl_secs: 60,
            cache_capacity: 512,
            max_retries: 5,
            diagnostics_dir: "logs/diagnostics".to_string(),
        }
    }
}
