//! Command listing

use super::bot_reply;
use crate::{
    context::CommandContext,
    permissions::UserRecord,
    registry::{ChatCommand, CommandDescriptor},
};
use async_trait::async_trait;
use comet_common::{MessageEvent, OutgoingMessage, Result};

/// `/help [command]`
pub struct HelpCommand {
    descriptor: CommandDescriptor,
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("help")
                .with_aliases(["?"])
                .with_description("List commands or show how to use one")
                .with_help("/help  list commands\n/help [command]  show usage of a command"),
        }
    }
}

#[async_trait]
impl ChatCommand for HelpCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        _event: &MessageEvent,
        args: &[String],
        user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        if let Some(name) = args.first() {
            return Ok(match ctx.registry.lookup(name) {
                Some(command) if !command.descriptor().help.is_empty() => {
                    OutgoingMessage::text(command.descriptor().help.clone())
                }
                Some(command) => {
                    bot_reply(format!("{} has no usage notes.", command.descriptor().name))
                }
                None => bot_reply(format!("No such command: {name}")),
            });
        }

        let mut text = String::from("Available commands:");
        for descriptor in ctx.registry.descriptors() {
            if user.level < descriptor.min_level {
                continue;
            }
            text.push_str(&format!("\n{}", descriptor.name));
            if !descriptor.aliases.is_empty() {
                text.push_str(&format!(" ({})", descriptor.aliases.join(", ")));
            }
            if !descriptor.description.is_empty() {
                text.push_str(&format!(": {}", descriptor.description));
            }
        }
        Ok(bot_reply(text))
    }
}
