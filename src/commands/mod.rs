//! One invocation from locked read to commit.
//!
//! [`get`] handles the read-only path and [`edit`] every mutating mode. Both
//! take their standard streams from [`Streams`] so integration tests can run
//! a full invocation without spawning a process.

pub mod edit;
pub mod get;

use std::io::{Read, Write};
use std::path::Path;

use anyhow::Result;

use crate::config::Settings;
use crate::engine::Mode;
use crate::error::EditError;
use crate::ini::{Document, KeyCase, ParseOptions, parse};
use crate::storage::{Acquired, CommitStrategy, LockHandle, LockMode, LockRequest};

/// Standard streams of an invocation.
pub struct Streams<'a> {
    /// Merge source for `--merge`.
    pub stdin: &'a mut dyn Read,
    /// Query results and `--output=-` documents.
    pub stdout: &'a mut dyn Write,
    /// The `--verbose` change report.
    pub stderr: &'a mut dyn Write,
}

impl std::fmt::Debug for Streams<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

/// Run the invocation described by `settings`.
///
/// # Errors
///
/// Returns an error wrapping [`EditError`] for any usage, parse, policy or
/// I/O failure.
pub fn run(settings: &Settings, streams: &mut Streams<'_>) -> Result<()> {
    tracing::debug!(
        "{} {} (commit: {:?})",
        settings.request.mode,
        settings.file.display(),
        settings.commit
    );
    match settings.request.mode {
        Mode::Get => get::run(settings, streams),
        Mode::Set | Mode::Delete | Mode::Merge => edit::run(settings, streams),
    }
}

/// How the config file is opened for `settings`.
fn lock_request(settings: &Settings) -> LockRequest {
    let request = &settings.request;
    let mutating = request.mode.is_mutating();
    LockRequest {
        mode: if mutating {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        },
        create: mutating && request.may_create_file() && request.mode != Mode::Delete,
        missing_is_empty: request.may_create_file() && request.mode == Mode::Delete,
        verify_identity: settings.commit == CommitStrategy::Replace,
    }
}

/// Lock the config file and read it. A missing file reads as empty when the
/// request allows it, and no handle is returned.
fn load(settings: &Settings) -> crate::error::Result<(Option<LockHandle>, String)> {
    match LockHandle::acquire(&settings.file, lock_request(settings))? {
        Acquired::Locked(mut handle) => {
            let data = handle.read_to_string()?;
            Ok((Some(handle), data))
        }
        Acquired::Missing => Ok((None, String::new())),
    }
}

/// Parse `data`, naming `file` in any error.
fn parse_document(
    data: &str,
    file: &Path,
    settings: &Settings,
    key_case: KeyCase,
) -> crate::error::Result<Document> {
    let options = ParseOptions {
        dialect: settings.request.dialect,
        key_case,
    };
    parse(data, &options).map_err(|source| EditError::Parse {
        file: file.display().to_string(),
        source,
    })
}
