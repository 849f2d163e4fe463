//! File access for one invocation: locking, change detection and commit.

pub mod checksum;
pub mod commit;
pub mod lock;

pub use checksum::{Checksum, Verdict};
pub use commit::CommitStrategy;
pub use lock::{Acquired, LockHandle, LockMode, LockRequest};
