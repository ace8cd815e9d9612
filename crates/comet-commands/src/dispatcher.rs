//! Resolves message events to sessions or commands and runs them

use crate::{console::ConsoleRegistry, context::CommandContext, session::Session};
use comet_common::{CometError, MessageEvent, OutgoingMessage, Result};
use futures::FutureExt;
use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc};
use tokio::time::Instant;
use tracing::{debug, error, instrument, warn, Span};

/// Reply when the actor may not run the command
pub const PERMISSION_DENIED_MESSAGE: &str = "Bot > You don't have permission to do that!";

/// Reply when a command failed with a timeout-class error
pub const TIMEOUT_MESSAGE: &str = "Bot > A network operation timed out, please try again later.";

/// Reply when a command failed for any other reason
pub const FAILURE_MESSAGE: &str =
    "Bot > Something went wrong while running this command, please contact an administrator.";

/// Outcome of dispatching one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedResult {
    /// Reply to send; empty means no reply
    pub message: OutgoingMessage,
    /// Name of the command the event resolved to, if any
    pub command: Option<String>,
}

impl ExecutedResult {
    fn new(message: impl Into<OutgoingMessage>, command: Option<String>) -> Self {
        Self {
            message: message.into(),
            command,
        }
    }

    fn silent(command: Option<String>) -> Self {
        Self::new(OutgoingMessage::empty(), command)
    }

    /// Whether there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

/// A prefixed message split into the command token and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// First word after the prefix
    pub name: String,
    /// Remaining non-empty words
    pub args: Vec<String>,
}

/// Parse `text` as a command invocation if it starts with one of `prefixes`
pub fn parse_invocation(text: &str, prefixes: &[String]) -> Option<Invocation> {
    let body = prefixes
        .iter()
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| text.strip_prefix(prefix.as_str()))?;

    let mut words = body.split(' ');
    let name = words.next().unwrap_or_default().to_string();
    let args = words
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect();

    Some(Invocation { name, args })
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Routes events to sessions and commands. Cheap to clone across tasks.
#[derive(Clone)]
pub struct Dispatcher {
    ctx: Arc<CommandContext>,
    console: Arc<ConsoleRegistry>,
}

impl Dispatcher {
    /// Dispatcher over `ctx` with no console commands
    pub fn new(ctx: CommandContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            console: Arc::new(ConsoleRegistry::new()),
        }
    }

    /// Attach console commands
    pub fn with_console(mut self, console: ConsoleRegistry) -> Self {
        self.console = Arc::new(console);
        self
    }

    /// Shared command context
    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    /// Resolve and run `event`, returning the unfiltered reply.
    ///
    /// Never fails: errors and panics inside handlers become fixed replies.
    #[instrument(
        skip_all,
        fields(actor = %event.sender, scope = %event.scope(), command = tracing::field::Empty)
    )]
    pub async fn dispatch(&self, event: &MessageEvent) -> ExecutedResult {
        let config = self.ctx.config.get();
        let invocation = parse_invocation(event.text.trim(), &config.bot.command_prefixes);
        let command = invocation
            .as_ref()
            .and_then(|invocation| self.ctx.registry.lookup(&invocation.name));
        let command_name = command.as_ref().map(|c| c.descriptor().name.clone());
        if let Some(name) = &command_name {
            Span::current().record("command", name.as_str());
        }

        if !config.bot.enabled
            && command_name.as_deref() != Some(config.bot.diagnostic_command.as_str())
        {
            return ExecutedResult::silent(command_name);
        }

        if let Some(session) = self.ctx.sessions.get(event.scope()) {
            if invocation.is_none() {
                let owner = Some(session.command().to_string());
                let daemon = session.is_daemon();
                let routed = self.route_to_session(event, session);
                if let Err(failure) = self.guarded(event, routed).await {
                    return ExecutedResult::new(failure, owner);
                }
                if !daemon {
                    return ExecutedResult::silent(owner);
                }
            }
        }

        if let (Some(group), Some(name)) = (event.group, command_name.as_deref()) {
            if config.is_command_disabled(group, name) {
                debug!("Command disabled in this group");
                return ExecutedResult::silent(command_name);
            }
        }

        let (Some(invocation), Some(command)) = (invocation, command) else {
            return ExecutedResult::silent(command_name);
        };

        let user = self.ctx.users.get_or_register(event.sender).await;
        if !command.has_permission(&user) {
            debug!(level = user.level.as_str(), "Permission denied");
            return ExecutedResult::new(PERMISSION_DENIED_MESSAGE, command_name);
        }

        debug!(args = ?invocation.args, "Executing command");
        let started = Instant::now();
        let outcome = self
            .guarded(event, command.execute(&self.ctx, event, &invocation.args, &user))
            .await;
        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Command finished");

        ExecutedResult::new(outcome.unwrap_or_else(|failure| failure), command_name)
    }

    /// Dispatch `event`, filter the reply and send it back into the conversation
    pub async fn handle(&self, event: &MessageEvent) -> ExecutedResult {
        let mut result = self.dispatch(event).await;
        result.message = self.ctx.filter_outgoing(result.message);

        if let Err(e) = event.reply(result.message.clone()).await {
            warn!(error = %e, "Failed to deliver reply");
        }
        result
    }

    /// Run one operator console line, returning its output or an empty string
    pub async fn execute_console(&self, line: &str) -> String {
        self.console.execute(&self.ctx, line).await
    }

    async fn route_to_session(&self, event: &MessageEvent, session: Arc<Session>) -> Result<()> {
        let Some(command) = self.ctx.registry.lookup(session.command()) else {
            warn!(command = session.command(), "Session owner is not registered");
            return Ok(());
        };
        let Some(handler) = command.session_handler() else {
            return Ok(());
        };

        session.touch();
        let user = self.ctx.users.get_or_register(event.sender).await;
        debug!(session = %session.id(), "Routing message to session");
        handler.handle_input(&self.ctx, event, &user, session).await
    }

    /// Await `future`, turning errors and panics into the fixed failure replies
    async fn guarded<T, F>(
        &self,
        event: &MessageEvent,
        future: F,
    ) -> std::result::Result<T, OutgoingMessage>
    where
        F: Future<Output = Result<T>>,
    {
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(Self::failure_reply(event, &e)),
            Err(panic) => {
                error!(
                    sender = %event.sender,
                    message = %event.text,
                    panic = panic_message(panic.as_ref()),
                    "Command panicked"
                );
                Err(FAILURE_MESSAGE.into())
            }
        }
    }

    fn failure_reply(event: &MessageEvent, err: &CometError) -> OutgoingMessage {
        if err.is_timeout() {
            warn!(error = %err, "Command timed out");
            TIMEOUT_MESSAGE.into()
        } else {
            error!(
                sender = %event.sender,
                message = %event.text,
                error = %err,
                details = ?err,
                "Command failed"
            );
            FAILURE_MESSAGE.into()
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").field("ctx", &self.ctx).finish_non_exhaustive()
    }
}
