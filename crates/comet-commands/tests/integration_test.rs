//! Integration tests for comet-commands

use async_trait::async_trait;
use comet_api::{ApiRequest, ApiResponse, ApiTransport, TwitterClient};
use comet_commands::{
    commands::{builtin_commands, GuessNumberGame},
    dispatcher::{FAILURE_MESSAGE, PERMISSION_DENIED_MESSAGE, TIMEOUT_MESSAGE},
    ChatCommand, CommandContext, CommandDescriptor, CommandRegistry, ConsoleRegistry, Dispatcher,
    MessageFilter, Session, SessionHandler, SessionKind, UserLevel, UserRecord,
};
use comet_common::{
    test_utils::{group_message, init_test_logging, private_message, RecordingReplier},
    CometError, MessageEvent, OutgoingMessage, Result, Scope, ScopeId,
};
use comet_config::{Config, ConfigCache, GroupConfig, TwitterConfig};
use proptest::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tempfile::TempDir;

const OWNER: u64 = 1;
const GROUP: u64 = 100;

#[derive(Default)]
struct FakeTransport {
    calls: AtomicUsize,
}

#[async_trait]
impl ApiTransport for FakeTransport {
    async fn execute(&self, _request: ApiRequest) -> Result<ApiResponse> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(ApiResponse::new(
            200,
            format!(r#"[{{"id": {n}, "full_text": "post number {n}"}}]"#),
        ))
    }
}

/// Test command that behaves according to its first argument
struct ScriptedCommand {
    descriptor: CommandDescriptor,
}

#[async_trait]
impl ChatCommand for ScriptedCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        _ctx: &CommandContext,
        _event: &MessageEvent,
        args: &[String],
        _user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        match args.first().map(String::as_str) {
            Some("panic") => panic!("command panicked"),
            Some("timeout") => Err(CometError::timeout("command timed out")),
            Some("fail") => Err(CometError::new("command failed")),
            _ => Ok(OutgoingMessage::text(args.join(" "))),
        }
    }
}

/// Test command that opens a session counting the unprefixed messages it sees
struct WatchCommand {
    descriptor: CommandDescriptor,
    kind: SessionKind,
}

impl WatchCommand {
    fn new(name: &str, kind: SessionKind) -> Arc<Self> {
        Arc::new(Self {
            descriptor: CommandDescriptor::new(name),
            kind,
        })
    }
}

#[async_trait]
impl ChatCommand for WatchCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        _args: &[String],
        _user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        let session = Session::new(event.scope(), self.descriptor.name.clone(), self.kind, 0u32);
        ctx.sessions.create(session)?;
        Ok(OutgoingMessage::text("watching"))
    }

    fn session_handler(&self) -> Option<&dyn SessionHandler> {
        Some(self)
    }
}

#[async_trait]
impl SessionHandler for WatchCommand {
    async fn handle_input(
        &self,
        _ctx: &CommandContext,
        event: &MessageEvent,
        _user: &UserRecord,
        session: Arc<Session>,
    ) -> Result<()> {
        match event.text.trim() {
            "panic" => panic!("watcher panicked"),
            "timeout" => Err(CometError::timeout("watcher timed out")),
            "fail" => Err(CometError::new("watcher failed")),
            _ => {
                session.with_payload(|seen: &mut u32| *seen += 1).await;
                Ok(())
            }
        }
    }
}

async fn messages_seen(dispatcher: &Dispatcher) -> u32 {
    let session = dispatcher.context().sessions.get(group_scope()).unwrap();
    session.with_payload(|seen: &mut u32| *seen).await.unwrap()
}

struct Harness {
    dispatcher: Dispatcher,
    transport: Arc<FakeTransport>,
    _dir: TempDir,
}

fn harness(configure: impl FnOnce(&mut Config)) -> Harness {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.bot.owner_id = OWNER;
    config.twitter = TwitterConfig {
        api_base_url: "https://api.example.com/1.1".to_string(),
        diagnostics_dir: dir.path().display().to_string(),
        ..TwitterConfig::default()
    };
    configure(&mut config);

    let transport = Arc::new(FakeTransport::default());
    let twitter = Arc::new(TwitterClient::with_transport(
        config.twitter.clone(),
        transport.clone(),
    ));

    let mut registry = CommandRegistry::new();
    registry.register_all(builtin_commands());
    registry.register(Arc::new(ScriptedCommand {
        descriptor: CommandDescriptor::new("echo"),
    }));
    registry.register(Arc::new(ScriptedCommand {
        descriptor: CommandDescriptor::new("admin").with_level(UserLevel::Admin),
    }));
    registry.register(WatchCommand::new("watch", SessionKind::Daemon));
    registry.register(WatchCommand::new("trap", SessionKind::Exclusive));

    let ctx = CommandContext::new(Arc::new(ConfigCache::new(config)), Arc::new(registry), twitter);
    Harness {
        dispatcher: Dispatcher::new(ctx).with_console(ConsoleRegistry::with_builtins()),
        transport,
        _dir: dir,
    }
}

fn group_scope() -> Scope {
    Scope::Group(ScopeId(GROUP))
}

#[tokio::test]
async fn test_guess_number_round() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .handle(&group_message(10, GROUP, "/csz 10 90", replier.clone()))
        .await;
    assert_eq!(result.command.as_deref(), Some("guessnumber"));
    assert_eq!(replier.last_text().as_deref(), Some("Bot > Guess a number! Range [10, 90]"));

    let session = h.dispatcher.context().sessions.get(group_scope()).unwrap();
    let answer = session
        .with_payload(|game: &mut GuessNumberGame| game.answer())
        .await
        .unwrap();
    assert!((10..=90).contains(&answer));

    if answer != 50 {
        let result = h
            .dispatcher
            .handle(&group_message(20, GROUP, "50", replier.clone()))
            .await;
        assert!(result.is_empty());
        assert_eq!(result.command.as_deref(), Some("guessnumber"));
        let expected = if 50 > answer { "Bot > Too high!" } else { "Bot > Too low!" };
        assert_eq!(replier.last_text().as_deref(), Some(expected));
    }

    h.dispatcher
        .handle(&group_message(30, GROUP, &answer.to_string(), replier.clone()))
        .await;
    let announcement = replier.last_text().unwrap();
    assert!(announcement.starts_with(&format!(
        "Bot > user30 guessed it! The answer was {answer}."
    )));
    assert!(announcement.contains("\nuser30 1 guesses"));
    assert!(h.dispatcher.context().sessions.is_empty());
}

#[tokio::test]
async fn test_session_rules() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    h.dispatcher
        .handle(&group_message(10, GROUP, "/csz", replier.clone()))
        .await;
    assert_eq!(replier.last_text().as_deref(), Some("Bot > Guess a number! Range [0, 100]"));

    // a second game in the same scope is refused
    let result = h
        .dispatcher
        .dispatch(&group_message(11, GROUP, "/guessnumber", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "Bot > A game is already in progress~");

    // prefixed messages still reach commands while the game runs
    let result = h
        .dispatcher
        .dispatch(&group_message(12, GROUP, "/echo hi", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "hi");

    // other groups are independent
    let result = h
        .dispatcher
        .dispatch(&group_message(13, GROUP + 1, "/csz", replier.clone()))
        .await;
    assert!(result.message.plain_text().starts_with("Bot > Guess a number!"));

    // chatter is consumed silently, quit words end the game
    let result = h
        .dispatcher
        .handle(&group_message(14, GROUP, "hello there", replier.clone()))
        .await;
    assert!(result.is_empty());
    h.dispatcher
        .handle(&group_message(14, GROUP, "quit", replier.clone()))
        .await;
    assert_eq!(replier.last_text().as_deref(), Some("Bot > Game over."));
    assert!(!h.dispatcher.context().sessions.contains(group_scope()));
    assert_eq!(h.dispatcher.context().sessions.len(), 1);
}

#[tokio::test]
async fn test_daemon_session_sees_chatter_and_commands_still_run() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/watch", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "watching");
    assert!(h.dispatcher.context().sessions.get(group_scope()).unwrap().is_daemon());

    let result = h
        .dispatcher
        .handle(&group_message(11, GROUP, "hello", replier.clone()))
        .await;
    assert!(result.is_empty());
    assert!(result.command.is_none());
    assert_eq!(messages_seen(&h.dispatcher).await, 1);

    // prefixed messages go to commands and bypass the session
    let result = h
        .dispatcher
        .dispatch(&group_message(12, GROUP, "/echo hi", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "hi");
    assert_eq!(messages_seen(&h.dispatcher).await, 1);

    // other scopes are unaffected
    h.dispatcher
        .dispatch(&group_message(13, GROUP + 1, "hello", replier))
        .await;
    assert_eq!(messages_seen(&h.dispatcher).await, 1);
}

#[tokio::test]
async fn test_session_handler_failures_become_fixed_replies() {
    for (opener, kind) in [("/watch", SessionKind::Daemon), ("/trap", SessionKind::Exclusive)] {
        let h = harness(|_| {});
        let replier = RecordingReplier::shared();
        h.dispatcher
            .dispatch(&group_message(10, GROUP, opener, replier.clone()))
            .await;
        let owner = &opener[1..];

        let cases = [
            ("panic", FAILURE_MESSAGE),
            ("fail", FAILURE_MESSAGE),
            ("timeout", TIMEOUT_MESSAGE),
        ];
        for (text, expected) in cases {
            let result = h
                .dispatcher
                .dispatch(&group_message(11, GROUP, text, replier.clone()))
                .await;
            assert_eq!(result.message.plain_text(), expected, "{kind:?} {text}");
            assert_eq!(result.command.as_deref(), Some(owner));
        }

        // the session survives its handler failing
        h.dispatcher
            .dispatch(&group_message(11, GROUP, "hello", replier))
            .await;
        assert_eq!(messages_seen(&h.dispatcher).await, 1);
    }
}

#[tokio::test]
async fn test_replaced_owner_takes_effect_everywhere() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();
    let new_owner = 42;

    let mut next = Config::clone(&h.dispatcher.context().config.get());
    next.bot.owner_id = new_owner;
    h.dispatcher.context().config.update(next);

    // cooldown exemption follows the new owner
    for _ in 0..3 {
        let result = h
            .dispatcher
            .dispatch(&group_message(new_owner, GROUP, "/tw someone", replier.clone()))
            .await;
        assert!(result.message.plain_text().starts_with("Bot > @someone:"));
    }

    let result = h
        .dispatcher
        .dispatch(&group_message(new_owner, GROUP, "/admin ok", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "ok");

    // the previous owner is an ordinary user now
    let result = h
        .dispatcher
        .dispatch(&group_message(OWNER, GROUP, "/admin ok", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), PERMISSION_DENIED_MESSAGE);
    let result = h
        .dispatcher
        .dispatch(&group_message(OWNER, GROUP, "/debug switch", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), PERMISSION_DENIED_MESSAGE);

    let result = h
        .dispatcher
        .dispatch(&group_message(new_owner, GROUP, "/debug switch", replier))
        .await;
    assert_eq!(result.message.plain_text(), "Bot > Bot disabled");
}

#[tokio::test]
async fn test_guess_number_argument_errors() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/csz 90 10", replier.clone()))
        .await;
    assert_eq!(
        result.message.plain_text(),
        "Bot > Please enter valid non-negative integers!"
    );

    let result = h
        .dispatcher
        .dispatch(&group_message(11, GROUP, "/csz 1 2 3", replier.clone()))
        .await;
    assert!(result.message.plain_text().starts_with("/csz"));

    let result = h
        .dispatcher
        .dispatch(&private_message(12, "/csz", replier))
        .await;
    assert!(result.is_empty());
    assert!(h.dispatcher.context().sessions.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_game_starts_create_one_session() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let tasks: Vec<_> = (0..16u64)
        .map(|i| {
            let dispatcher = h.dispatcher.clone();
            let event = group_message(100 + i, GROUP, "/csz", replier.clone());
            tokio::spawn(async move { dispatcher.dispatch(&event).await })
        })
        .collect();

    let mut started = 0;
    for task in tasks {
        let result = task.await.unwrap();
        if result.message.plain_text().starts_with("Bot > Guess a number!") {
            started += 1;
        } else {
            assert_eq!(result.message.plain_text(), "Bot > A game is already in progress~");
        }
    }

    assert_eq!(started, 1);
    assert_eq!(h.dispatcher.context().sessions.len(), 1);
}

#[tokio::test]
async fn test_lookup_served_from_cache() {
    let h = harness(|config| config.bot.cooldown_seconds = 0);
    let replier = RecordingReplier::shared();

    let first = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/tw someone", replier.clone()))
        .await;
    let second = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/lookup someone", replier.clone()))
        .await;

    assert!(first.message.plain_text().starts_with("Bot > @someone:\npost number 1"));
    assert_eq!(first.message, second.message);
    assert_eq!(h.transport.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.dispatcher.context().twitter.usage(), 1);
}

#[tokio::test]
async fn test_lookup_cooldown_and_validation() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/tw bad/name", replier.clone()))
        .await;
    assert_eq!(
        result.message.plain_text(),
        "Bot > That doesn't look like a valid account name."
    );

    // the rejected lookup already started the cooldown
    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/tw someone", replier.clone()))
        .await;
    assert!(result.is_empty());
    assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_disabled_bot_only_answers_the_diagnostic_command() {
    let h = harness(|config| config.bot.enabled = false);
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/echo hi", replier.clone()))
        .await;
    assert!(result.is_empty());
    assert_eq!(result.command.as_deref(), Some("echo"));

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/debug", replier.clone()))
        .await;
    assert!(result.message.plain_text().contains("Status: disabled"));

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/debug switch", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), PERMISSION_DENIED_MESSAGE);

    let result = h
        .dispatcher
        .dispatch(&group_message(OWNER, GROUP, "/debug switch", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "Bot > Bot enabled");

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/echo hi", replier))
        .await;
    assert_eq!(result.message.plain_text(), "hi");
}

#[tokio::test]
async fn test_permissions() {
    let h = harness(|config| config.bot.admin_ids = vec![2]);
    let replier = RecordingReplier::shared();

    let result = h
        .dispatcher
        .dispatch(&group_message(5, GROUP, "/admin ok", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), PERMISSION_DENIED_MESSAGE);

    for actor in [OWNER, 2] {
        let result = h
            .dispatcher
            .dispatch(&group_message(actor, GROUP, "/admin ok", replier.clone()))
            .await;
        assert_eq!(result.message.plain_text(), "ok");
    }
}

#[tokio::test]
async fn test_failures_become_fixed_replies() {
    let h = harness(|_| {});
    let replier = RecordingReplier::shared();

    let cases = [
        ("/echo panic", FAILURE_MESSAGE),
        ("/echo fail", FAILURE_MESSAGE),
        ("/echo timeout", TIMEOUT_MESSAGE),
    ];
    for (text, expected) in cases {
        let result = h
            .dispatcher
            .dispatch(&group_message(10, GROUP, text, replier.clone()))
            .await;
        assert_eq!(result.message.plain_text(), expected, "{text}");
        assert_eq!(result.command.as_deref(), Some("echo"));
    }

    // the dispatcher keeps serving after a panic
    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP, "/echo still here", replier))
        .await;
    assert_eq!(result.message.plain_text(), "still here");
}

#[tokio::test]
async fn test_unknown_and_group_disabled_commands_are_silent() {
    let h = harness(|config| {
        config.groups = vec![GroupConfig {
            id: GROUP,
            disabled_commands: vec!["echo".to_string()],
        }];
    });
    let replier = RecordingReplier::shared();

    for text in ["/nosuch", "/", "plain chatter", "/echo hi"] {
        let result = h
            .dispatcher
            .handle(&group_message(10, GROUP, text, replier.clone()))
            .await;
        assert!(result.is_empty(), "{text}");
    }
    assert!(replier.messages().is_empty());

    let result = h
        .dispatcher
        .dispatch(&group_message(10, GROUP + 1, "/echo hi", replier.clone()))
        .await;
    assert_eq!(result.message.plain_text(), "hi");

    let result = h
        .dispatcher
        .dispatch(&private_message(10, "#echo hi", replier))
        .await;
    assert_eq!(result.message.plain_text(), "hi");
}

#[tokio::test]
async fn test_outgoing_filter() {
    let h = harness(|config| {
        config.filter.banned_words = vec!["bad".to_string()];
        config.filter.max_redactions = 5;
    });
    let replier = RecordingReplier::shared();

    h.dispatcher
        .handle(&group_message(10, GROUP, "/echo bad bad bad bad bad", replier.clone()))
        .await;
    assert_eq!(replier.last_text().as_deref(), Some("         "));

    replier.clear();
    let result = h
        .dispatcher
        .handle(&group_message(10, GROUP, "/echo bad bad bad bad bad bad", replier.clone()))
        .await;
    assert!(result.is_empty());
    assert!(replier.messages().is_empty());
}

#[tokio::test]
async fn test_session_replies_are_filtered() {
    let h = harness(|config| config.filter.banned_words = vec!["user30".to_string()]);
    let replier = RecordingReplier::shared();

    h.dispatcher
        .handle(&group_message(10, GROUP, "/csz 10 90", replier.clone()))
        .await;
    let session = h.dispatcher.context().sessions.get(group_scope()).unwrap();
    let answer = session
        .with_payload(|game: &mut GuessNumberGame| game.answer())
        .await
        .unwrap();

    h.dispatcher
        .handle(&group_message(30, GROUP, &answer.to_string(), replier.clone()))
        .await;
    let announcement = replier.last_text().unwrap();
    assert!(announcement.contains(&format!("guessed it! The answer was {answer}.")));
    assert!(!announcement.contains("user30"));
}

#[tokio::test]
async fn test_console_commands() {
    let h = harness(|_| {});

    assert_eq!(h.dispatcher.execute_console("/switch").await, "Bot is now disabled");
    assert!(!h.dispatcher.context().config.get().bot.enabled);
    assert_eq!(h.dispatcher.execute_console("#switch").await, "Bot is now enabled");

    assert_eq!(h.dispatcher.execute_console("switch").await, "");
    assert_eq!(h.dispatcher.execute_console("/nosuch").await, "");
    assert!(h
        .dispatcher
        .execute_console("/reset-usage")
        .await
        .starts_with("API usage reset"));
}

proptest! {
    #[test]
    fn prop_redaction_threshold(count in 0usize..12) {
        let filter = MessageFilter::new(["x"], 5);
        let text = vec!["x"; count].join(" ");
        let filtered = filter.apply(OutgoingMessage::text(text));
        if count > 5 {
            prop_assert!(filtered.is_empty());
        } else {
            prop_assert!(!filtered.plain_text().contains('x'));
        }
    }
}
