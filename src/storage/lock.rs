//! Advisory locking of the file being edited.
//!
//! Readers take a shared lock and writers an exclusive one. Locks block
//! without a timeout. Because a concurrent writer may rename a new file over
//! the path between our `open` and our lock, the lock is confirmed by
//! reopening the path and comparing file identity, retrying until both
//! descriptors refer to the same file.

use std::fs::{File, OpenOptions};
use std::io::{self, Read as _, Seek as _, SeekFrom, Write as _};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{EditError, Result};

/// Kind of advisory lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers.
    Shared,
    /// One writer.
    Exclusive,
}

/// How the target file is opened and locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRequest {
    /// Lock kind; exclusive also opens the file for writing.
    pub mode: LockMode,
    /// Create the file when it does not exist.
    pub create: bool,
    /// Treat a missing file as an empty document instead of an error.
    pub missing_is_empty: bool,
    /// Reopen the path after locking to detect a concurrent rename.
    pub verify_identity: bool,
}

/// Result of [`LockHandle::acquire`].
#[derive(Debug)]
pub enum Acquired {
    /// The file is open and locked.
    Locked(LockHandle),
    /// The file does not exist and the request allows that.
    Missing,
}

/// An open, locked file. The lock is released on drop.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    file: File,
    /// Descriptor that confirmed the lock; kept open with the lock.
    _confirmed: Option<File>,
}

impl LockHandle {
    /// Open `path` and lock it as `request` describes.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Io`] if the file cannot be opened or locked.
    pub fn acquire(path: &Path, request: LockRequest) -> Result<Acquired> {
        let open = || open_options(request).open(path);
        let mut file = match open() {
            Ok(file) => file,
            Err(e) if request.missing_is_empty && is_missing(&e) => {
                tracing::debug!("{} does not exist; using an empty document", path.display());
                return Ok(Acquired::Missing);
            }
            Err(e) => return Err(EditError::io(path, e)),
        };

        loop {
            lock(&file, request.mode).map_err(|e| EditError::io(path, e))?;
            if !request.verify_identity {
                tracing::debug!("locked {} ({:?})", path.display(), request.mode);
                return Ok(Acquired::Locked(Self {
                    path: path.to_path_buf(),
                    file,
                    _confirmed: None,
                }));
            }
            let fresh = open().map_err(|e| EditError::io(path, e))?;
            if same_file(&file, &fresh).map_err(|e| EditError::io(path, e))? {
                tracing::debug!("locked {} ({:?})", path.display(), request.mode);
                return Ok(Acquired::Locked(Self {
                    path: path.to_path_buf(),
                    file,
                    _confirmed: Some(fresh),
                }));
            }
            tracing::debug!(
                "{} was replaced while waiting for the lock; retrying",
                path.display()
            );
            // Dropping the stale descriptor releases its lock.
            file = fresh;
        }
    }

    /// Path the handle was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Io`] on read failure or invalid UTF-8.
    pub fn read_to_string(&mut self) -> Result<String> {
        let mut data = String::new();
        self.file
            .read_to_string(&mut data)
            .map_err(|e| EditError::io(&self.path, e))?;
        Ok(data)
    }

    /// Truncate the locked file and write `data` through the held descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Commit`] if any step fails.
    pub fn rewrite(&mut self, data: &[u8]) -> Result<()> {
        let write = |file: &mut File| -> io::Result<()> {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(data)?;
            file.sync_all()
        };
        write(&mut self.file).map_err(|e| EditError::commit(&self.path, e))
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!("unlocking {} failed: {e}", self.path.display());
        }
    }
}

fn open_options(request: LockRequest) -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true);
    if request.mode == LockMode::Exclusive {
        options.write(true).create(request.create);
    }
    options
}

fn lock(file: &File, mode: LockMode) -> io::Result<()> {
    match mode {
        LockMode::Shared => FileExt::lock_shared(file),
        LockMode::Exclusive => FileExt::lock_exclusive(file),
    }
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

#[cfg(unix)]
fn same_file(a: &File, b: &File) -> io::Result<bool> {
    use std::os::unix::fs::MetadataExt as _;
    let (a, b) = (a.metadata()?, b.metadata()?);
    Ok(a.dev() == b.dev() && a.ino() == b.ino())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn same_file(_a: &File, _b: &File) -> io::Result<bool> {
    // No portable inode identity; trust the first lock.
    Ok(true)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    fn exclusive(create: bool) -> LockRequest {
        LockRequest {
            mode: LockMode::Exclusive,
            create,
            missing_is_empty: false,
            verify_identity: true,
        }
    }

    fn locked(acquired: Acquired) -> LockHandle {
        match acquired {
            Acquired::Locked(handle) => handle,
            Acquired::Missing => panic!("expected a locked file"),
        }
    }

    #[test]
    fn creates_missing_file_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.ini");
        let mut handle = locked(LockHandle::acquire(&path, exclusive(true)).unwrap());
        assert!(path.exists());
        assert_eq!(handle.read_to_string().unwrap(), "");
        assert_eq!(handle.path(), path);
    }

    #[test]
    fn missing_file_is_an_error_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.ini");
        let err = LockHandle::acquire(&path, exclusive(false)).unwrap_err();
        assert!(matches!(err, EditError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_can_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let request = LockRequest {
            missing_is_empty: true,
            ..exclusive(false)
        };
        let acquired = LockHandle::acquire(&dir.path().join("absent.ini"), request).unwrap();
        assert!(matches!(acquired, Acquired::Missing));
    }

    #[test]
    fn shared_lock_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ini");
        fs::write(&path, "[s]\nk = v\n").unwrap();
        let request = LockRequest {
            mode: LockMode::Shared,
            create: false,
            missing_is_empty: false,
            verify_identity: true,
        };
        let mut first = locked(LockHandle::acquire(&path, request).unwrap());
        let mut second = locked(LockHandle::acquire(&path, request).unwrap());
        assert_eq!(first.read_to_string().unwrap(), "[s]\nk = v\n");
        assert_eq!(second.read_to_string().unwrap(), "[s]\nk = v\n");
    }

    #[test]
    fn rewrite_replaces_content_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ini");
        fs::write(&path, "a much longer original content\n").unwrap();
        let mut handle = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
        handle.rewrite(b"short\n").unwrap();
        drop(handle);
        assert_eq!(fs::read_to_string(&path).unwrap(), "short\n");
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ini");
        fs::write(&path, "").unwrap();
        let handle = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
        drop(handle);
        let other = File::open(&path).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
    }

    #[test]
    fn exclusive_lock_waits_for_holder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ini");
        fs::write(&path, "").unwrap();
        let released = AtomicBool::new(false);

        let holder = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
        thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let _handle = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
                released.load(Ordering::SeqCst)
            });
            thread::sleep(Duration::from_millis(200));
            released.store(true, Ordering::SeqCst);
            drop(holder);
            assert!(waiter.join().unwrap(), "second writer ran while the first held the lock");
        });
    }

    #[cfg(unix)]
    #[test]
    fn waiter_follows_file_renamed_over_path() {
        use std::os::unix::fs::MetadataExt as _;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ini");
        let next = dir.path().join("a.ini.next");
        fs::write(&path, "old\n").unwrap();

        let holder = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
        thread::scope(|scope| {
            let waiter = scope.spawn(|| {
                let mut handle = locked(LockHandle::acquire(&path, exclusive(false)).unwrap());
                let inode = handle.file.metadata().unwrap().ino();
                (handle.read_to_string().unwrap(), inode)
            });
            thread::sleep(Duration::from_millis(200));
            fs::write(&next, "new\n").unwrap();
            fs::rename(&next, &path).unwrap();
            drop(holder);

            let (content, inode) = waiter.join().unwrap();
            assert_eq!(content, "new\n");
            assert_eq!(inode, fs::metadata(&path).unwrap().ino());
        });
    }
}
