//! # Comet Commands
//!
//! Command dispatch and session arbitration for Comet Bot.
//!
//! The [`Dispatcher`] resolves each incoming [`MessageEvent`] either to the
//! active session of its scope or to a registered command, applies the
//! enable switch, per-group disabled lists and permission checks, runs the
//! handler and turns every outcome (including failures and panics) into an
//! [`OutgoingMessage`].
//!
//! [`MessageEvent`]: comet_common::MessageEvent
//! [`OutgoingMessage`]: comet_common::OutgoingMessage

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod console;
pub mod context;
pub mod cooldown;
pub mod dispatcher;
pub mod filter;
pub mod permissions;
pub mod registry;
pub mod session;

pub use console::{ConsoleCommand, ConsoleRegistry};
pub use context::CommandContext;
pub use cooldown::CooldownTracker;
pub use dispatcher::{Dispatcher, ExecutedResult};
pub use filter::MessageFilter;
pub use permissions::{InMemoryUserStore, UserLevel, UserRecord, UserStore};
pub use registry::{ChatCommand, CommandDescriptor, CommandRegistry, SessionHandler};
pub use session::{Session, SessionKind, SessionRegistry};
