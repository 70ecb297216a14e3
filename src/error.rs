// Copyright (c) Chris Gunn.
// Licensed under the MIT license.

//! Error types for loading, mutating and writing pipeline documents.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type alias for pipemut operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Every kind aborts the current scenario. A harness should report them as setup
/// failures, distinct from assertion failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    MalformedDocument,
    DuplicateKey,
    MalformedPayload,
    ReparseFailure,
    Poisoned,
    InvalidScript,
    Io,
    Emit,
}

#[derive(Debug, Error)]
pub enum Error {
    /// The text is not valid YAML.
    #[error("{}: invalid yaml: {}", .path.display(), .message)]
    Syntax { path: PathBuf, message: String },

    /// Valid YAML, but not a shape a pipeline document can take.
    #[error("{}: {}", .path.display(), .message)]
    MalformedDocument { path: PathBuf, message: String },

    #[error("{}:{}: duplicate key `{}`", .path.display(), .line, .key)]
    DuplicateKey { path: PathBuf, key: String, line: usize },

    #[error("{action}: malformed payload: {message}")]
    MalformedPayload { action: String, message: String },

    #[error("{}: replacing `{}` left the document unparsable: {}", .path.display(), .find, .message)]
    ReparseFailure {
        path: PathBuf,
        find: String,
        message: String,
    },

    /// A previous literal substitution failed on this document.
    #[error("{}: document is unusable after a failed literal substitution", .path.display())]
    Poisoned { path: PathBuf },

    #[error("{}: {}", .path.display(), .message)]
    InvalidScript { path: PathBuf, message: String },

    #[error("{}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: template `{}` could not be read: {}", .referenced_from.display(), .path.display(), .source)]
    TemplateNotFound {
        referenced_from: PathBuf,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: failed to write yaml: {}", .path.display(), .message)]
    Emit { path: PathBuf, message: String },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::MalformedPayload { .. } => ErrorKind::MalformedPayload,
            Error::ReparseFailure { .. } => ErrorKind::ReparseFailure,
            Error::Poisoned { .. } => ErrorKind::Poisoned,
            Error::InvalidScript { .. } => ErrorKind::InvalidScript,
            Error::Io { .. } | Error::TemplateNotFound { .. } => ErrorKind::Io,
            Error::Emit { .. } => ErrorKind::Emit,
        }
    }
}
