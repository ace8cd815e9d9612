//! Operator console commands

use crate::{context::CommandContext, dispatcher::parse_invocation, registry::CommandDescriptor};
use async_trait::async_trait;
use comet_common::Result;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info, warn};

/// A command typed at the operator console
#[async_trait]
pub trait ConsoleCommand: Send + Sync {
    /// Registration data; only name and aliases are used
    fn descriptor(&self) -> &CommandDescriptor;

    /// Run the command and return the text to print
    async fn execute(&self, ctx: &CommandContext, args: &[String]) -> Result<String>;
}

/// Registered console commands
#[derive(Default)]
pub struct ConsoleRegistry {
    commands: Vec<Arc<dyn ConsoleCommand>>,
    index: HashMap<String, usize>,
}

impl ConsoleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in console commands
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for command in builtin_console_commands() {
            registry.register(command);
        }
        registry
    }

    /// Register a command; duplicates of a name or alias are ignored
    pub fn register(&mut self, command: Arc<dyn ConsoleCommand>) -> bool {
        let descriptor = command.descriptor();
        let tokens: Vec<&String> = std::iter::once(&descriptor.name)
            .chain(descriptor.aliases.iter())
            .collect();

        if tokens.iter().any(|token| self.index.contains_key(token.as_str())) {
            warn!(command = %descriptor.name, "Ignoring duplicate console command registration");
            return false;
        }

        let slot = self.commands.len();
        for token in tokens {
            self.index.insert(token.clone(), slot);
        }
        self.commands.push(command);
        true
    }

    /// Command whose name or alias equals `token`
    pub fn lookup(&self, token: &str) -> Option<Arc<dyn ConsoleCommand>> {
        self.index
            .get(token)
            .and_then(|slot| self.commands.get(*slot))
            .cloned()
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run one console line. Unknown commands, unprefixed lines and failures yield "".
    pub async fn execute(&self, ctx: &CommandContext, line: &str) -> String {
        let prefixes = ctx.config.get().bot.command_prefixes.clone();
        let Some(invocation) = parse_invocation(line.trim(), &prefixes) else {
            return String::new();
        };
        let Some(command) = self.lookup(&invocation.name) else {
            return String::new();
        };

        debug!(command = %command.descriptor().name, "Executing console command");
        match command.execute(ctx, &invocation.args).await {
            Ok(output) => output,
            Err(e) => {
                warn!(line, error = %e, "Console command failed");
                String::new()
            }
        }
    }
}

impl std::fmt::Debug for ConsoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.commands.iter().map(|c| &c.descriptor().name))
            .finish()
    }
}

/// The console commands every bot carries
pub fn builtin_console_commands() -> Vec<Arc<dyn ConsoleCommand>> {
    vec![
        Arc::new(SwitchCommand::default()),
        Arc::new(RefreshTokenCommand::default()),
        Arc::new(ResetUsageCommand::default()),
    ]
}

/// Flips the global enable switch
pub struct SwitchCommand {
    descriptor: CommandDescriptor,
}

impl Default for SwitchCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("switch")
                .with_description("Toggle the bot on or off"),
        }
    }
}

#[async_trait]
impl ConsoleCommand for SwitchCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &CommandContext, _args: &[String]) -> Result<String> {
        let enabled = ctx.config.toggle_enabled();
        info!(enabled, "Enable switch toggled from console");
        Ok(format!("Bot is now {}", if enabled { "enabled" } else { "disabled" }))
    }
}

/// Re-runs the API token exchange
pub struct RefreshTokenCommand {
    descriptor: CommandDescriptor,
}

impl Default for RefreshTokenCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("refresh-token")
                .with_aliases(["token"])
                .with_description("Request a new API bearer token"),
        }
    }
}

#[async_trait]
impl ConsoleCommand for RefreshTokenCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &CommandContext, _args: &[String]) -> Result<String> {
        Ok(if ctx.twitter.authenticate().await {
            "Token refreshed".to_string()
        } else {
            "Token refresh failed, see the log for details".to_string()
        })
    }
}

/// Clears the API call counter
pub struct ResetUsageCommand {
    descriptor: CommandDescriptor,
}

impl Default for ResetUsageCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("reset-usage")
                .with_description("Reset the API call counter"),
        }
    }
}

#[async_trait]
impl ConsoleCommand for ResetUsageCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(&self, ctx: &CommandContext, _args: &[String]) -> Result<String> {
        let before = ctx.twitter.usage();
        ctx.twitter.reset_usage();
        Ok(format!("API usage reset ({before} calls counted)"))
    }
}
