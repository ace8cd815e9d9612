//! Command descriptors, the command traits and the command registry

use crate::{
    context::CommandContext,
    permissions::{UserLevel, UserRecord},
    session::Session,
};
use async_trait::async_trait;
use comet_common::{MessageEvent, OutgoingMessage, Result};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, warn};

/// Immutable registration data of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    /// Primary name, matched exactly
    pub name: String,
    /// Alternative names, matched exactly
    pub aliases: Vec<String>,
    /// Named permission that grants access regardless of level
    pub permission: Option<String>,
    /// Minimum level that grants access
    pub min_level: UserLevel,
    /// One-line description
    pub description: String,
    /// Usage text shown by `help`
    pub help: String,
}

impl CommandDescriptor {
    /// Descriptor open to every user
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            permission: None,
            min_level: UserLevel::User,
            description: String::new(),
            help: String::new(),
        }
    }

    /// Set aliases
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Set the named permission
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Set the minimum level
    pub fn with_level(mut self, level: UserLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Whether `token` is the name or one of the aliases
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|alias| alias == token)
    }
}

/// A command invoked from chat
#[async_trait]
pub trait ChatCommand: Send + Sync {
    /// Registration data
    fn descriptor(&self) -> &CommandDescriptor;

    /// Run the command. `args` are the space-separated words after the command token.
    async fn execute(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        args: &[String],
        user: &UserRecord,
    ) -> Result<OutgoingMessage>;

    /// Whether `user` may run this command
    fn has_permission(&self, user: &UserRecord) -> bool {
        let descriptor = self.descriptor();
        user.level >= descriptor.min_level
            || descriptor
                .permission
                .as_deref()
                .is_some_and(|permission| user.has_permission(permission))
    }

    /// Input handler for sessions this command owns, if it starts any
    fn session_handler(&self) -> Option<&dyn SessionHandler> {
        None
    }
}

/// Receives unprefixed messages sent into a scope with a live session
#[async_trait]
pub trait SessionHandler: Send + Sync {
    /// Handle one message. Replies go through [`CommandContext::reply`].
    async fn handle_input(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        user: &UserRecord,
        session: Arc<Session>,
    ) -> Result<()>;
}

/// Registered chat commands, looked up by name or alias
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<dyn ChatCommand>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Returns false, leaving the registry unchanged,
    /// if its name or any alias is already taken.
    pub fn register(&mut self, command: Arc<dyn ChatCommand>) -> bool {
        let descriptor = command.descriptor();
        let tokens: Vec<&String> = std::iter::once(&descriptor.name)
            .chain(descriptor.aliases.iter())
            .collect();

        if let Some(taken) = tokens.iter().find(|token| self.index.contains_key(token.as_str())) {
            warn!(
                command = %descriptor.name,
                token = %taken,
                "Ignoring duplicate command registration"
            );
            return false;
        }

        let slot = self.commands.len();
        for token in tokens {
            self.index.insert(token.clone(), slot);
        }
        debug!(command = %descriptor.name, "Registered command");
        self.commands.push(command);
        true
    }

    /// Register several commands, returning how many were accepted
    pub fn register_all(
        &mut self,
        commands: impl IntoIterator<Item = Arc<dyn ChatCommand>>,
    ) -> usize {
        commands
            .into_iter()
            .map(|command| self.register(command))
            .filter(|registered| *registered)
            .count()
    }

    /// Command whose name or alias equals `token`
    pub fn lookup(&self, token: &str) -> Option<Arc<dyn ChatCommand>> {
        self.index
            .get(token)
            .and_then(|slot| self.commands.get(*slot))
            .cloned()
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.iter().map(|command| command.descriptor())
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.descriptors().map(|d| &d.name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comet_common::ActorId;
    use proptest::prelude::*;

    struct Noop(CommandDescriptor);

    #[async_trait]
    impl ChatCommand for Noop {
        fn descriptor(&self) -> &CommandDescriptor {
            &self.0
        }

        async fn execute(
            &self,
            _ctx: &CommandContext,
            _event: &MessageEvent,
            _args: &[String],
            _user: &UserRecord,
        ) -> Result<OutgoingMessage> {
            Ok(OutgoingMessage::empty())
        }
    }

    fn noop(descriptor: CommandDescriptor) -> Arc<dyn ChatCommand> {
        Arc::new(Noop(descriptor))
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let mut registry = CommandRegistry::new();
        let command = CommandDescriptor::new("guessnumber").with_aliases(["csz"]);
        assert!(registry.register(noop(command)));

        let name_of = |token: &str| registry.lookup(token).map(|c| c.descriptor().name.clone());
        assert_eq!(name_of("guessnumber").as_deref(), Some("guessnumber"));
        assert_eq!(name_of("csz").as_deref(), Some("guessnumber"));
        assert!(registry.lookup("CSZ").is_none());
        assert!(registry.lookup("guess").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut registry = CommandRegistry::new();
        assert!(registry.register(noop(CommandDescriptor::new("lookup").with_aliases(["tw"]))));
        assert!(!registry.register(noop(CommandDescriptor::new("tw"))));
        assert!(!registry.register(noop(CommandDescriptor::new("other").with_aliases(["lookup"]))));

        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("other").is_none());
    }

    #[test]
    fn test_permission_by_level_or_name() {
        let command = Noop(
            CommandDescriptor::new("admin")
                .with_level(UserLevel::Admin)
                .with_permission("comet.admin"),
        );

        let mut user = UserRecord::new(ActorId(1), UserLevel::User);
        assert!(!command.has_permission(&user));
        user.grant("comet.admin");
        assert!(command.has_permission(&user));

        assert!(command.has_permission(&UserRecord::new(ActorId(2), UserLevel::Admin)));
        assert!(command.has_permission(&UserRecord::new(ActorId(3), UserLevel::Owner)));
    }

    proptest! {
        #[test]
        fn prop_lookup_is_exact_match(name in "[a-z]{2,12}", cut in 1usize..12) {
            let mut registry = CommandRegistry::new();
            registry.register(noop(CommandDescriptor::new(name.clone())));

            prop_assert!(registry.lookup(&name).is_some());

            let cut = cut.min(name.len() - 1);
            prop_assert!(registry.lookup(&name[..cut]).is_none());
            prop_assert!(registry.lookup(&name[cut..]).is_none());
            let extended = format!("{name}x");
            prop_assert!(registry.lookup(&extended).is_none());
        }
    }
}
