//! # Comet Config
//!
//! Type-safe configuration management for Comet Bot.
//!
//! Configuration is read from a YAML or TOML file, overridden from `COMET_*`
//! environment variables, validated, and then published through a lock-free
//! [`ConfigCache`] so the running bot can swap it at runtime.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use cache::*;
pub use loader::*;
pub use schema::*;
pub use validator::*;
