//! # Comet API
//!
//! Client for the external lookup API used by Comet Bot commands.
//!
//! The client guards every remote call with a fixed per-window [`CallBudget`],
//! keeps recently fetched posts in a bounded [`PostCache`], retries
//! timeout-class failures through [`execute_with_retry`], and writes a
//! diagnostic report whenever a response cannot be decoded.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod budget;
pub mod cache;
pub mod client;
pub mod diagnostics;
pub mod models;
pub mod retry;
pub mod transport;

pub use budget::CallBudget;
pub use cache::PostCache;
pub use client::{ClientMetrics, TwitterClient};
pub use diagnostics::DiagnosticWriter;
pub use models::{ApiErrorBody, ApiErrorEntry, Post, Profile, TokenResponse};
pub use retry::{execute_with_retry, DEFAULT_RETRY_ATTEMPTS};
pub use transport::{
    ApiRequest, ApiResponse, ApiTransport, HttpMethod, RequestAuth, ReqwestTransport,
};
