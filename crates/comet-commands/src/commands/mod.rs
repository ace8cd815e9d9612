//! Built-in chat commands

mod debug;
mod guess_number;
mod help;
mod lookup;

pub use debug::DebugCommand;
pub use guess_number::{GuessNumberCommand, GuessNumberGame, GuessOutcome};
pub use help::HelpCommand;
pub use lookup::LookupCommand;

use crate::registry::ChatCommand;
use comet_common::OutgoingMessage;
use std::sync::Arc;

/// Prefix of every reply the bot writes
pub const REPLY_PREFIX: &str = "Bot > ";

/// Plain text reply carrying the bot prefix
pub fn bot_reply(text: impl AsRef<str>) -> OutgoingMessage {
    OutgoingMessage::text(format!("{REPLY_PREFIX}{}", text.as_ref()))
}

/// All built-in chat commands
pub fn builtin_commands() -> Vec<Arc<dyn ChatCommand>> {
    vec![
        Arc::new(DebugCommand::default()),
        Arc::new(GuessNumberCommand::default()),
        Arc::new(HelpCommand::default()),
        Arc::new(LookupCommand::default()),
    ]
}
