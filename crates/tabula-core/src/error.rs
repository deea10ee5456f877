use crate::{filter::FilterError, schema::SchemaError, sort::SortError};
use std::fmt::{self, Display};
use thiserror::Error as ThisError;

/// Error type transports are free to fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

///
/// Operation
/// The five operations every accessor exposes; errors carry the one
/// that was running.
///

#[remain::sorted]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Add,
    Get,
    List,
    Set,
    Update,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Get => "get",
            Self::List => "list",
            Self::Set => "set",
            Self::Update => "update",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// AccessorError
/// The one failure taxonomy accessor operations report.
///
/// Everything up to `NotFound` is detected locally, before a request
/// leaves the process. `Backend` and `Transport` are the only variants a
/// network round trip can produce, and neither is retried.
///

#[derive(Debug, ThisError)]
pub enum AccessorError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Sort(#[from] SortError),

    /// The key cannot address a record on this backend.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// The cursor payload was minted by a different backend or corrupted.
    #[error("invalid cursor: {reason}")]
    InvalidCursor { reason: String },

    /// A row value violates a backend write rule.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// The backend cannot perform this operation at all.
    #[error("operation not supported: {operation}: {reason}")]
    Unsupported {
        operation: Operation,
        reason: &'static str,
    },

    /// A keyed operation matched no record.
    #[error("not found: {key}")]
    NotFound { key: String },

    /// The backend answered with a non-success status.
    #[error("operation failed: {operation} (status {status})")]
    Backend { operation: Operation, status: u16 },

    /// The transport failed before producing a response.
    #[error("operation failed: {operation}: {source}")]
    Transport {
        operation: Operation,
        source: BoxError,
    },
}

impl AccessorError {
    /// Gate a backend response on its status class.
    pub fn check_status(operation: Operation, status: u16) -> Result<(), Self> {
        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(Self::Backend { operation, status })
        }
    }
}

///
/// TESTS
///
