//! Group guessing game played through an exclusive session

use super::bot_reply;
use crate::{
    context::CommandContext,
    permissions::UserRecord,
    registry::{ChatCommand, CommandDescriptor, SessionHandler},
    session::{Session, SessionKind},
};
use async_trait::async_trait;
use comet_common::{utils::is_numeric, ActorId, CometError, MessageEvent, OutgoingMessage, Result};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_MIN: u32 = 0;
const DEFAULT_MAX: u32 = 100;
const QUIT_WORDS: [&str; 3] = ["quit", "stop", "end game"];
const IN_PROGRESS: &str = "A game is already in progress~";

/// Result of one guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Guess is above the answer
    TooHigh,
    /// Guess is below the answer
    TooLow,
    /// Guess equals the answer
    Correct,
}

#[derive(Debug, Clone)]
struct Participant {
    actor: ActorId,
    name: String,
    guesses: u32,
}

/// State of one game: the bounds, the hidden answer and per-player guess counts
#[derive(Debug, Clone)]
pub struct GuessNumberGame {
    min: u32,
    max: u32,
    answer: u32,
    participants: Vec<Participant>,
}

impl GuessNumberGame {
    /// Game with an answer drawn uniformly from `min..=max`
    pub fn new(min: u32, max: u32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self::with_answer(min, max, fastrand::u32(min..=max))
    }

    /// Game with a fixed answer
    pub fn with_answer(min: u32, max: u32, answer: u32) -> Self {
        Self {
            min,
            max,
            answer,
            participants: Vec::new(),
        }
    }

    /// The hidden answer
    pub fn answer(&self) -> u32 {
        self.answer
    }

    /// Inclusive bounds
    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    /// Record a guess of `value` by `actor`
    pub fn guess(&mut self, actor: ActorId, name: &str, value: u64) -> GuessOutcome {
        match self.participants.iter_mut().find(|p| p.actor == actor) {
            Some(participant) => participant.guesses += 1,
            None => self.participants.push(Participant {
                actor,
                name: name.to_string(),
                guesses: 1,
            }),
        }

        match value.cmp(&u64::from(self.answer)) {
            std::cmp::Ordering::Greater => GuessOutcome::TooHigh,
            std::cmp::Ordering::Less => GuessOutcome::TooLow,
            std::cmp::Ordering::Equal => GuessOutcome::Correct,
        }
    }

    /// Players and their guess counts, fewest guesses first
    pub fn leaderboard(&self) -> Vec<(String, u32)> {
        let mut board: Vec<(String, u32)> = self
            .participants
            .iter()
            .map(|p| (p.name.clone(), p.guesses))
            .collect();
        board.sort_by_key(|(_, guesses)| *guesses);
        board
    }
}

fn parse_bounds(min: &str, max: &str) -> Option<(u32, u32)> {
    let min = min.parse::<u32>().ok()?;
    let max = max.parse::<u32>().ok()?;
    (min < max).then_some((min, max))
}

/// `/guessnumber [min max]`, alias `/csz`
pub struct GuessNumberCommand {
    descriptor: CommandDescriptor,
}

impl Default for GuessNumberCommand {
    fn default() -> Self {
        Self {
            descriptor: CommandDescriptor::new("guessnumber")
                .with_aliases(["csz"])
                .with_permission("comet.commands.guessnumber")
                .with_description("Guess the number")
                .with_help(concat!(
                    "/csz  guess a number in [0, 100]\n",
                    "/csz [min] [max]  guess a number in [min, max]",
                )),
        }
    }
}

#[async_trait]
impl ChatCommand for GuessNumberCommand {
    fn descriptor(&self) -> &CommandDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        args: &[String],
        user: &UserRecord,
    ) -> Result<OutgoingMessage> {
        let Some(group) = event.group else {
            return Ok(OutgoingMessage::empty());
        };
        if !ctx.cooldowns.is_allowed_default(user.id) {
            return Ok(OutgoingMessage::empty());
        }

        let scope = event.scope();
        if ctx.sessions.contains(scope) {
            return Ok(bot_reply(IN_PROGRESS));
        }

        let (min, max) = match args {
            [] => (DEFAULT_MIN, DEFAULT_MAX),
            [min, max] => match parse_bounds(min, max) {
                Some(bounds) => bounds,
                None => return Ok(bot_reply("Please enter valid non-negative integers!")),
            },
            _ => return Ok(OutgoingMessage::text(self.descriptor.help.clone())),
        };

        let game = GuessNumberGame::new(min, max);
        debug!(%group, answer = game.answer(), "Generated guess number answer");

        let name = self.descriptor.name.clone();
        let session = Session::new(scope, name, SessionKind::Exclusive, game);
        match ctx.sessions.create(session) {
            Ok(_) => Ok(bot_reply(format!("Guess a number! Range [{min}, {max}]"))),
            Err(CometError::SessionConflict { .. }) => Ok(bot_reply(IN_PROGRESS)),
            Err(e) => Err(e),
        }
    }

    fn session_handler(&self) -> Option<&dyn SessionHandler> {
        Some(self)
    }
}

#[async_trait]
impl SessionHandler for GuessNumberCommand {
    async fn handle_input(
        &self,
        ctx: &CommandContext,
        event: &MessageEvent,
        _user: &UserRecord,
        session: Arc<Session>,
    ) -> Result<()> {
        let text = event.text.trim();

        if !is_numeric(text) {
            if QUIT_WORDS.contains(&text) && ctx.sessions.expire(&session) {
                ctx.reply(event, bot_reply("Game over.")).await?;
            }
            return Ok(());
        }

        // digits that overflow are above any answer
        let value = text.parse::<u64>().unwrap_or(u64::MAX);
        let sender = event.sender;
        let name = event.sender_name.as_str();
        let played = session
            .with_payload(|game: &mut GuessNumberGame| {
                let outcome = game.guess(sender, name, value);
                let board = (outcome == GuessOutcome::Correct).then(|| game.leaderboard());
                (outcome, game.answer(), board)
            })
            .await;

        let Some((outcome, answer, board)) = played else {
            warn!(session = %session.id(), "Session payload is not a guess number game");
            return Ok(());
        };

        match outcome {
            GuessOutcome::TooHigh => ctx.reply(event, bot_reply("Too high!")).await,
            GuessOutcome::TooLow => ctx.reply(event, bot_reply("Too low!")).await,
            GuessOutcome::Correct => {
                // a concurrent winner already closed the game
                if !ctx.sessions.expire(&session) {
                    return Ok(());
                }

                let mut text = format!(
                    "{name} guessed it! The answer was {answer}.\nTotal time: {}s\n",
                    session.age().as_secs()
                );
                for (player, guesses) in board.unwrap_or_default() {
                    text.push_str(&format!("\n{player} {guesses} guesses"));
                }
                ctx.reply(event, bot_reply(text)).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_guess_outcomes_and_counts() {
        let mut game = GuessNumberGame::with_answer(10, 90, 42);
        assert_eq!(game.guess(ActorId(1), "alice", 50), GuessOutcome::TooHigh);
        assert_eq!(game.guess(ActorId(2), "bob", 30), GuessOutcome::TooLow);
        assert_eq!(game.guess(ActorId(1), "alice", 40), GuessOutcome::TooLow);
        assert_eq!(game.guess(ActorId(2), "bob", 42), GuessOutcome::Correct);

        assert_eq!(
            game.leaderboard(),
            vec![("alice".to_string(), 2), ("bob".to_string(), 2)]
        );
    }

    #[test]
    fn test_leaderboard_is_fewest_first() {
        let mut game = GuessNumberGame::with_answer(0, 100, 1);
        for _ in 0..3 {
            game.guess(ActorId(1), "slow", 99);
        }
        game.guess(ActorId(2), "quick", 1);

        let board = game.leaderboard();
        assert_eq!(board[0], ("quick".to_string(), 1));
        assert_eq!(board[1], ("slow".to_string(), 3));
    }

    #[test]
    fn test_parse_bounds() {
        assert_eq!(parse_bounds("10", "90"), Some((10, 90)));
        assert_eq!(parse_bounds("0", "1"), Some((0, 1)));
        assert_eq!(parse_bounds("90", "10"), None);
        assert_eq!(parse_bounds("5", "5"), None);
        assert_eq!(parse_bounds("-1", "10"), None);
        assert_eq!(parse_bounds("a", "10"), None);
    }

    proptest! {
        #[test]
        fn prop_answer_within_bounds(min in 0u32..1000, span in 1u32..1000) {
            let game = GuessNumberGame::new(min, min + span);
            prop_assert!(game.answer() >= min);
            prop_assert!(game.answer() <= min + span);
            prop_assert_eq!(game.bounds(), (min, min + span));
        }
    }
}
