//! Error types for configuration operations.
//!
//! Responsibilities:
//! - Define the error taxonomy shared by every operation in the crate.
//! - Provide constructors that embed the identifying source in each error.
//!
//! Does NOT handle:
//! - Retrying failed operations (retry policy belongs to the caller).
//! - Logging (callers log where the failure is meaningful).
//!
//! Invariants:
//! - Every variant carries the path, resource name or key it concerns.
//! - Missing optional resources never produce an error (see `loader.rs`).

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur while loading, merging or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A null/absent value was supplied for a key.
    ///
    /// Entries processed before the offending key remain applied.
    #[error("Null value for property {key}")]
    InvalidValue { key: String },

    /// A mandatory source could not be located.
    #[error("Not found: {target}")]
    NotFound { target: String },

    /// Source bytes are not a well-formed configuration document.
    #[error("Failed to parse {target}: {message}")]
    Parse { target: String, message: String },

    /// A lower-level read/write/open/close failure.
    #[error("IO error on {target}: {error}")]
    Io {
        target: String,
        #[source]
        error: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid_value(key: impl Into<String>) -> Self {
        ConfigError::InvalidValue { key: key.into() }
    }

    pub(crate) fn not_found(target: impl Display) -> Self {
        ConfigError::NotFound {
            target: target.to_string(),
        }
    }

    pub(crate) fn parse(target: impl Display, message: impl Display) -> Self {
        ConfigError::Parse {
            target: target.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(target: impl Display, error: std::io::Error) -> Self {
        ConfigError::Io {
            target: target.to_string(),
            error,
        }
    }

    /// Returns the path, resource name or key this error concerns.
    pub fn subject(&self) -> &str {
        match self {
            ConfigError::InvalidValue { key } => key,
            ConfigError::NotFound { target }
            | ConfigError::Parse { target, .. }
            | ConfigError::Io { target, .. } => target,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;
