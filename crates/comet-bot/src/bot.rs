//! Bot lifecycle: component wiring, event intake and the operator console.

use crate::error::BotResult;
use async_trait::async_trait;
use comet_api::TwitterClient;
use comet_commands::{
    commands::builtin_commands, CommandContext, CommandDescriptor, CommandRegistry, ConsoleCommand,
    ConsoleRegistry, Dispatcher, ExecutedResult,
};
use comet_common::{MessageEvent, Result};
use comet_config::{Config, ConfigCache, ConfigValidator};
use std::sync::Arc;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::watch,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Console command that ends the console loop
struct StopCommand {
    descriptor: CommandDescriptor,
    shutdown: Arc<watch::Sender<bool>>,
}

#[async_trait]
impl ConsoleCommand for StopCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(&self, _ctx: &CommandContext, _args: &[String]) -> Result<String> {
        self.shutdown.send_replace(true);
        Ok("Stopping Comet Bot".to_string())
    }
}

/// Main bot structure.
pub struct CometBot {
    dispatcher: Dispatcher,
    shutdown: Arc<watch::Sender<bool>>,
}

impl CometBot {
    /// Validates `config` and builds a bot that talks to the real API.
    pub fn new(config: Config) -> BotResult<Self> {
        ConfigValidator::validate(&config)?;
        let twitter = TwitterClient::new(config.twitter.clone())?;
        Ok(Self::with_client(config, twitter))
    }

    /// Builds a bot around an existing API client.
    pub fn with_client(config: Config, twitter: TwitterClient) -> Self {
        let mut registry = CommandRegistry::new();
        let registered = registry.register_all(builtin_commands());

        let ctx = CommandContext::new(
            Arc::new(ConfigCache::new(config)),
            Arc::new(registry),
            Arc::new(twitter),
        );

        let (shutdown, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown);
        let mut console = ConsoleRegistry::with_builtins();
        console.register(Arc::new(StopCommand {
            descriptor: CommandDescriptor::new("stop").with_description("Stop the bot"),
            shutdown: Arc::clone(&shutdown),
        }));

        info!(commands = registered, console_commands = console.len(), "Comet Bot initialized");
        Self {
            dispatcher: Dispatcher::new(ctx).with_console(console),
            shutdown,
        }
    }

    /// The dispatcher every event goes through.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Live configuration.
    pub fn config(&self) -> &ConfigCache {
        &self.dispatcher.context().config
    }

    /// Performs startup work: the API token exchange when credentials are configured.
    pub async fn start(&self) {
        let ctx = self.dispatcher.context();
        if ctx.config.get().twitter.has_credentials() {
            if !ctx.twitter.authenticate().await {
                warn!("API token exchange failed, lookups will fail until the token is refreshed");
            }
        } else {
            warn!("No API credentials configured, lookups are unavailable");
        }
        info!("Comet Bot started");
    }

    /// Handles one event on its own task.
    pub fn spawn_event(&self, event: MessageEvent) -> JoinHandle<ExecutedResult> {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move { dispatcher.handle(&event).await })
    }

    /// Requests shutdown of the console loop.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown was requested.
    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Reads console lines from `input` until EOF or a stop request,
    /// writing each non-empty command output as one line to `output`.
    pub async fn run_console<R, W>(&self, input: R, mut output: W) -> BotResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        let mut stop = self.shutdown.subscribe();
        info!("Console ready");

        loop {
            if *stop.borrow_and_update() {
                break;
            }

            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    debug!(line = %line, "Console input");
                    let result = self.dispatcher.execute_console(&line).await;
                    if !result.is_empty() {
                        output.write_all(result.as_bytes()).await?;
                        output.write_all(b"\n").await?;
                        output.flush().await?;
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Console closed");
        Ok(())
    }
}
