//! Error types and utilities for Comet Bot

use thiserror::Error;

/// Boxed error used as the `source` of wrapped failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for Comet operations
pub type Result<T> = std::result::Result<T, CometError>;

/// Main error type for Comet operations
#[derive(Error, Debug)]
pub enum CometError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxError>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network related errors (HTTP requests, connection failures, timeouts)
    #[error("Network error: {message}")]
    Network {
        /// Description of the failed operation
        message: String,
        /// Whether the failure was a transport timeout
        timeout: bool,
        /// Underlying transport error
        #[source]
        source: Option<BoxError>,
    },

    /// The external API call budget for the current window is exhausted
    #[error("API call budget exhausted ({used}/{limit} calls in the current window)")]
    RateLimitExceeded {
        /// Calls counted in the current window
        used: u32,
        /// Per-window ceiling
        limit: u32,
    },

    /// A well-formed response carried no usable payload
    #[error("Empty result: {message}")]
    EmptyResult {
        /// What was requested
        message: String,
    },

    /// The external API answered with a structured error body
    #[error("API error {code}: {reason}")]
    ApiProtocol {
        /// Error code reported by the API
        code: i64,
        /// Error message reported by the API
        reason: String,
    },

    /// A response matched neither the expected schema nor the error schema
    #[error("Failed to parse API response: {message}")]
    ParseFailure {
        /// Which response could not be decoded
        message: String,
        /// Decoder error
        #[source]
        source: Option<BoxError>,
    },

    /// The retry helper used up its attempt budget
    #[error("Gave up after {attempts} attempts")]
    RetryLimitExceeded {
        /// Attempts made, including the first
        attempts: usize,
        /// Failure of the final attempt
        #[source]
        last: Option<Box<CometError>>,
    },

    /// The actor lacks the level or named permission a command requires
    #[error("Permission denied for command '{command}'")]
    PermissionDenied {
        /// Command that was refused
        command: String,
    },

    /// A session already exists for the scope
    #[error("A session is already active in scope {scope}")]
    SessionConflict {
        /// Scope that already has a session
        scope: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Error message
        message: String,
        /// Underlying error, if any
        #[source]
        source: Option<BoxError>,
    },
}

impl CometError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            timeout: false,
            source: None,
        }
    }

    /// Create a new network error with source
    pub fn network_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: msg.into(),
            timeout: false,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new transport timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Network {
            message: msg.into(),
            timeout: true,
            source: None,
        }
    }

    /// Create a new empty result error
    pub fn empty_result(msg: impl Into<String>) -> Self {
        Self::EmptyResult {
            message: msg.into(),
        }
    }

    /// Create a new API protocol error from a structured error body
    pub fn api_protocol(code: i64, reason: impl Into<String>) -> Self {
        Self::ApiProtocol {
            code,
            reason: reason.into(),
        }
    }

    /// Create a new parse failure with the decoder error as source
    pub fn parse_failure_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ParseFailure {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new session conflict error
    pub fn session_conflict(scope: impl ToString) -> Self {
        Self::SessionConflict {
            scope: scope.to_string(),
        }
    }

    /// Whether this failure is timeout-class (including an exhausted retry budget)
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Network { timeout: true, .. } | Self::RetryLimitExceeded { .. }
        )
    }

    /// Whether this failure is a rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded { .. })
    }
}

// Error conversion implementations for external types

/// Convert from reqwest::Error to CometError
impl From<reqwest::Error> for CometError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network {
                message: "Request timeout".to_string(),
                timeout: true,
                source: Some(Box::new(err)),
            }
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err)
        } else if err.is_status() {
            let status_code = err.status().map_or(0, |s| s.as_u16());
            Self::network_with_source(format!("HTTP error: {status_code}"), err)
        } else {
            Self::network_with_source("Network request failed", err)
        }
    }
}

/// Convert from toml::de::Error to CometError
impl From<toml::de::Error> for CometError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML parsing error", err)
    }
}

/// Convert from serde_yaml::Error to CometError
impl From<serde_yaml::Error> for CometError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing error", err)
    }
}
