//! Status report and remote enable switch

use super::bot_reply;
use crate::{
    context::CommandContext,
    dispatcher::PERMISSION_DENIED_MESSAGE,
    permissions::UserRecord,
    registry::{ChatCommand, CommandDescriptor},
};
use async_trait::async_trait;
use comet_common::{utils::format_uptime, MessageEvent, OutgoingMessage, Result};
use tracing::info;

/// `/debug` status report; `/debug switch` toggles the bot (owner only).
///
/// This is the command the disabled bot still answers to, so the owner can
/// switch it back on from chat.
pub struct DebugCommand {
    descriptor: CommandDescriptor,
}

impl Default for DebugCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("debug")
                .with_description("Show bot status")
                .with_help("/debug  show bot status\n/debug switch  turn the bot on or off"),
        }
    }
}

impl DebugCommand {
    fn status(ctx: &CommandContext) -> String {
        let config = ctx.config.get();
        let metrics = ctx.twitter.client_metrics();
        format!(
            concat!(
                "Comet Bot v{}\nUptime: {}\nStatus: {}\n",
                "Commands: {}\nActive sessions: {}\nAPI usage: {}/{}",
            ),
            env!("CARGO_PKG_VERSION"),
            format_uptime(ctx.started_at.elapsed()),
            if config.bot.enabled { "enabled" } else { "disabled" },
            ctx.registry.len(),
            ctx.sessions.len(),
            metrics.calls_used,
            metrics.call_limit,
        )
    }
}

#[async_trait]
impl ChatCommand for DebugCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        args: &[String],
        _user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        match args.first().map(String::as_str) {
            None => Ok(bot_reply(Self::status(ctx))),
            Some("switch") => {
                if !ctx.is_owner(event.sender) {
                    return Ok(PERMISSION_DENIED_MESSAGE.into());
                }
                let enabled = ctx.config.toggle_enabled();
                info!(enabled, actor = %event.sender, "Enable switch toggled from chat");
                Ok(bot_reply(if enabled { "Bot enabled" } else { "Bot disabled" }))
            }
            Some(_) => Ok(OutgoingMessage::text(self.descriptor.help.clone())),
        }
    }
}
