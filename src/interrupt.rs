//! Ctrl-C handling.
//!
//! An interrupt ends the process with status 130. If a replace commit is in
//! flight, its temporary file is removed first so no stray artifact is left
//! next to the target.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Exit status for a run cut short by SIGINT.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

static PENDING_TEMP: Mutex<Option<PathBuf>> = Mutex::new(None);

/// Install the process-wide Ctrl-C handler.
///
/// Installed for every run, whether or not stdin is a terminal; a piped or
/// scripted run interrupted mid-commit must not leave its temporary file.
///
/// # Errors
///
/// Returns an error if a handler was already installed or the signal
/// cannot be hooked.
pub fn install_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        discard_pending();
        std::process::exit(INTERRUPTED_EXIT_CODE);
    })
}

/// Registers a temporary file for removal on interrupt until dropped.
#[derive(Debug)]
pub struct PendingTemp(());

impl PendingTemp {
    /// Track `path` until the returned guard is dropped.
    #[must_use]
    pub fn track(path: &Path) -> Self {
        *PENDING_TEMP.lock().unwrap_or_else(PoisonError::into_inner) = Some(path.to_path_buf());
        Self(())
    }
}

impl Drop for PendingTemp {
    fn drop(&mut self) {
        PENDING_TEMP
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

fn discard_pending() {
    discard(&PENDING_TEMP);
}

fn discard(slot: &Mutex<Option<PathBuf>>) {
    let pending = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(path) = pending {
        fs::remove_file(path).ok();
    }
}
