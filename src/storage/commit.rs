//! Writing a rendered document back to disk.
//!
//! [`CommitStrategy::Replace`] writes a temporary file beside the target,
//! copies the target's permissions and ownership onto it, syncs it, renames
//! it over the target and syncs the directory. Readers see either the old
//! or the new file, never a mix. The temporary file is removed on any
//! failure (and on Ctrl-C, see [`crate::interrupt`]).
//!
//! [`CommitStrategy::InPlace`] truncates and rewrites the existing file, so
//! its inode (and any hard links or open descriptors) survive. Concurrent
//! readers may observe a partial file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use crate::error::{EditError, Result};
use crate::interrupt::PendingTemp;

/// How new content reaches the target path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Temporary file, then atomic rename.
    #[default]
    Replace,
    /// Truncate and write the existing file.
    InPlace,
}

/// Atomically replace `path` with `data`.
///
/// Symlinks are followed so the link itself survives and its target is
/// replaced.
///
/// # Errors
///
/// Returns [`EditError::Commit`] if any step fails; the target is left
/// untouched in that case.
pub fn replace(path: &Path, data: &[u8]) -> Result<()> {
    let target = resolve_target(path).map_err(|e| EditError::commit(path, e))?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut prefix = target
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    prefix.push(".");

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|e| EditError::commit(&target, e))?;
    let _pending = PendingTemp::track(tmp.path());

    copy_metadata(&target, tmp.as_file()).map_err(|e| EditError::commit(&target, e))?;
    tmp.write_all(data)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| EditError::commit(&target, e))?;
    tmp.persist(&target)
        .map_err(|e| EditError::commit(&target, e.error))?;
    sync_directory(&dir).map_err(|e| EditError::commit(&dir, e))?;

    tracing::debug!("replaced {}", target.display());
    Ok(())
}

/// Truncate `path` and write `data` into the existing file.
///
/// Used when the output is not the locked file itself; the locked file is
/// rewritten through its handle.
///
/// # Errors
///
/// Returns [`EditError::Commit`] if any step fails.
pub fn rewrite(path: &Path, data: &[u8]) -> Result<()> {
    let write = || -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.sync_all()
    };
    write().map_err(|e| EditError::commit(path, e))?;
    tracing::debug!("rewrote {} in place", path.display());
    Ok(())
}

/// Canonical path of the file to replace, which may not exist yet.
fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::canonicalize(path) {
        Ok(target) => Ok(target),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let Some(name) = path.file_name() else {
                return Err(e);
            };
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            Ok(fs::canonicalize(parent)?.join(name))
        }
        Err(e) => Err(e),
    }
}

/// Give the temporary file the target's permissions and, where allowed,
/// its owner.
fn copy_metadata(target: &Path, tmp: &File) -> io::Result<()> {
    let metadata = match fs::metadata(target) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    tmp.set_permissions(metadata.permissions())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt as _;
        if let Err(e) = std::os::unix::fs::fchown(tmp, Some(metadata.uid()), Some(metadata.gid())) {
            tracing::debug!("keeping temporary file ownership: {e}");
        }
    }
    Ok(())
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn sync_directory(_dir: &Path) -> io::Result<()> {
    Ok(())
}
