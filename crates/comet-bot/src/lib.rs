//! # Comet Bot
//!
//! Chat automation bot: routes incoming messages to commands and interactive
//! sessions, and runs the operator console.
//!
//! This crate wires configuration, the API client and the command dispatcher
//! together and owns the application lifecycle.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bot;
pub mod error;

pub use bot::*;
pub use error::*;
