//! `--get`: query the config file under a shared lock.

use anyhow::Result;

use super::{Streams, load, parse_document};
use crate::config::Settings;
use crate::engine::RunContext;
use crate::ini::KeyCase;
use crate::output::renderer;

/// Print the sections, keys or value requested by `settings`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the queried
/// section or key does not exist, or output fails.
pub fn run(settings: &Settings, streams: &mut Streams<'_>) -> Result<()> {
    let (handle, data) = load(settings)?;
    // Listing a section keeps key spelling; single lookups ignore case.
    let key_case = if settings.request.key.is_none() {
        KeyCase::Preserve
    } else {
        KeyCase::Fold
    };
    let doc = parse_document(&data, &settings.file, settings, key_case)?;
    drop(handle);

    let ctx = RunContext::new(settings.request.clone(), doc);
    let result = ctx.query(settings.format.expands_sections())?;
    renderer(settings.format).render(&result, streams.stdout)?;
    Ok(())
}
