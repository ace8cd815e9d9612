//! # Comet Common
//!
//! Shared types, utilities, and common functionality for Comet Bot.
//!
//! This crate provides the error type, logging setup, identifier newtypes and
//! the transport-facing message model used by every other crate in the
//! workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod message;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{CometError, Result};
pub use logging::{init_default_logging, init_dev_logging, init_logging, LoggingConfig};
pub use message::{MessageEvent, MessageSegment, OutgoingMessage, Replier};
pub use types::*;
