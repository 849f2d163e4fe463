//! `--set`, `--del` and `--merge`: mutate the config file under an
//! exclusive lock and commit the result if it changed.

use std::path::Path;

use anyhow::Result;

use super::{Streams, load, parse_document};
use crate::config::{OutputTarget, Settings};
use crate::engine::{Mode, RunContext};
use crate::error::EditError;
use crate::ini::KeyCase;
use crate::output::sh;
use crate::storage::{CommitStrategy, LockHandle, Verdict, commit};

/// Apply the mutation described by `settings`.
///
/// # Errors
///
/// Returns an error if reading, parsing, the existence policy, or the
/// commit fails. The file on disk is unchanged in every error case.
pub fn run(settings: &Settings, streams: &mut Streams<'_>) -> Result<()> {
    let merge_source = if settings.request.mode == Mode::Merge {
        let mut data = String::new();
        streams
            .stdin
            .read_to_string(&mut data)
            .map_err(|e| EditError::io("-", e))?;
        Some(parse_document(&data, Path::new("-"), settings, KeyCase::Preserve)?)
    } else {
        None
    };

    let (mut handle, data) = load(settings)?;
    let doc = parse_document(&data, &settings.file, settings, KeyCase::Fold)?;

    let mut ctx = RunContext::new(settings.request.clone(), doc);
    if let Some(source) = merge_source {
        ctx = ctx.with_merge_source(source);
    }
    ctx.apply()?;

    let rendered = ctx.doc.render(ctx.render_config());
    let verdict = Verdict::compare(&ctx.doc.meta().checksum, rendered.as_bytes());

    match &settings.output {
        OutputTarget::Stdout => streams
            .stdout
            .write_all(rendered.as_bytes())
            .map_err(EditError::from)?,
        OutputTarget::File(path) if verdict.is_changed() => {
            commit_to(settings, path, handle.as_mut(), rendered.as_bytes())?;
        }
        OutputTarget::File(_) => tracing::debug!("content unchanged; nothing to write"),
    }
    drop(handle);

    if settings.verbose {
        writeln!(streams.stderr, "{}: {}", verdict.as_str(), describe(settings))
            .map_err(EditError::from)?;
    }
    Ok(())
}

fn commit_to(
    settings: &Settings,
    path: &Path,
    handle: Option<&mut LockHandle>,
    data: &[u8],
) -> crate::error::Result<()> {
    match (settings.commit, handle) {
        (CommitStrategy::Replace, _) => commit::replace(path, data),
        (CommitStrategy::InPlace, Some(handle)) if path == settings.file => handle.rewrite(data),
        (CommitStrategy::InPlace, _) => commit::rewrite(path, data),
    }
}

/// The invocation's arguments for the `--verbose` report, shell-quoted.
fn describe(settings: &Settings) -> String {
    let request = &settings.request;
    let mode = request.mode.to_string();
    let file = settings.file.display().to_string();
    [
        Some(mode.as_str()),
        Some(file.as_str()),
        request.section_name(),
        request.key.as_deref(),
        request.value.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|arg| !arg.is_empty())
    .map(|arg| sh::quote(arg).replace('\n', "\\n"))
    .collect::<Vec<_>>()
    .join(" ")
}
