//! Domain-specific error types for the INI editor.
//!
//! Internal modules return [`EditError`] while the command layer converts it
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error kinds
//!
//! ```text
//! EditError
//! ├── Usage            : bad flag/argument combination, before any file access
//! ├── Parse            : malformed INI content, names the bad line
//! ├── MissingSection   : existence-policy violation (or unknown section on --get)
//! ├── MissingParam     : existence-policy violation (or unknown key on --get)
//! ├── Io               : open/lock/stat/read failures on a named path
//! ├── Commit           : failure while writing the new content
//! ├── InvalidIdentifier: sh output refused an unsafe identifier
//! └── Output           : stdout/stderr write failures (broken pipes included)
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure an invocation can end with.
#[derive(Error, Debug)]
pub enum EditError {
    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// The document could not be parsed.
    #[error("Error parsing {file}: {source}")]
    Parse {
        /// Name of the file being parsed (`-` for stdin).
        file: String,
        /// Details of the offending line.
        source: ParseError,
    },

    /// A section required by the request does not exist.
    #[error("Section not found: {0}")]
    MissingSection(String),

    /// A parameter required by the request does not exist.
    #[error("Parameter not found: {0}")]
    MissingParam(String),

    /// Opening, locking or reading a file failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path of the file involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Committing new content to disk failed.
    #[error("failed to write {}: {source}", path.display())]
    Commit {
        /// Path of the file being replaced or rewritten.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A key cannot be emitted as a shell variable name.
    #[error("Invalid sh identifier: {0}")]
    InvalidIdentifier(String),

    /// Writing to stdout or stderr failed.
    #[error("{0}")]
    Output(#[from] io::Error),
}

impl EditError {
    /// Build an [`EditError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`EditError::Commit`] for `path`.
    pub fn commit(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Commit {
            path: path.into(),
            source,
        }
    }

    /// Return `true` when the downstream reader closed its end of a pipe.
    ///
    /// Such failures are benign and are silenced rather than reported.
    #[must_use]
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Self::Output(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}

/// A line the INI grammar does not accept.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line_number}: {reason}: {line:?}")]
pub struct ParseError {
    /// 1-based line number in the original input.
    pub line_number: usize,
    /// The offending line, without its terminator.
    pub line: String,
    /// Short description of what is wrong with the line.
    pub reason: &'static str,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = EditError> = std::result::Result<T, E>;
