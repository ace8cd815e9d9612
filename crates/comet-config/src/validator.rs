//! Runtime validation of a loaded configuration.

use crate::{loader::ConfigError, schema::Config};

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, collecting every problem into one error.
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        let bot = &config.bot;
        if bot.command_prefixes.is_empty() {
            problems.push("bot.command_prefixes must not be empty".to_string());
        }
        if bot.command_prefixes.iter().any(|p| p.is_empty() || p.contains(' ')) {
            problems.push(
                "bot.command_prefixes entries must be non-empty and contain no spaces".to_string(),
            );
        }
        if bot.diagnostic_command.trim().is_empty() {
            problems.push("bot.diagnostic_command must not be empty".to_string());
        }
        if bot.blocked_id.is_some_and(|blocked| blocked == bot.owner_id) {
            problems.push("bot.blocked_id must differ from bot.owner_id".to_string());
        }

        if config.filter.banned_words.iter().any(String::is_empty) {
            problems.push("filter.banned_words must not contain empty entries".to_string());
        }

        let twitter = &config.twitter;
        if twitter.call_limit == 0 {
            problems.push("twitter.call_limit must be at least 1".to_string());
        }
        if twitter.window_secs == 0 {
            problems.push("twitter.window_secs must be at least 1".to_string());
        }
        if twitter.timeout_secs == 0 {
            problems.push("twitter.timeout_secs must be at least 1".to_string());
        }
        if twitter.max_retries == 0 {
            problems.push("twitter.max_retries must be at least 1".to_string());
        }
        if twitter.cache_capacity == 0 {
            problems.push("twitter.cache_capacity must be at least 1".to_string());
        }
        if twitter.proxy_url.as_deref().is_some_and(|p| !p.is_empty()) && twitter.proxy_port == 0 {
            problems.push("twitter.proxy_port must be set when twitter.proxy_url is".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }
}
