//! Error and warning types produced during collection.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for collection operations
pub type CollectionResult<T> = Result<T, CollectionError>;

/// Errors that abort collection of a single path
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("{0}")]
    ParseError(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration in {path}: {message}")]
    ConfigError { path: PathBuf, message: String },
}

/// Outcome of collecting a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Passed,
    Failed,
}

/// Non-fatal findings reported alongside the collected items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionWarning {
    /// A test reads an attribute off `self` that no scope provides
    UnresolvedSelfAttribute {
        nodeid: String,
        attribute: String,
        line: usize,
    },
    /// A path was given explicitly but cannot be collected
    NotCollectable { path: PathBuf, reason: String },
}

impl fmt::Display for CollectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedSelfAttribute {
                nodeid,
                attribute,
                line,
            } => write!(
                f,
                "{nodeid}:{line}: reads self.{attribute} which no enclosing scope provides"
            ),
            Self::NotCollectable { path, reason } => {
                write!(f, "{}: not collected ({reason})", path.display())
            }
        }
    }
}
