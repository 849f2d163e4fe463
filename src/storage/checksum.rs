//! Content hashing used to skip writes that would not change the file.

use std::fmt;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// SHA-256 digest of a document's bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Hash `data`.
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Lowercase hex form of the digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut hex = String::with_capacity(64);
        for b in &self.0 {
            write!(hex, "{b:02x}").unwrap_or(());
        }
        hex
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Checksum").field(&self.to_hex()).finish()
    }
}

/// Outcome of comparing the rendered document with what was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The rendered bytes differ and must be committed.
    Changed,
    /// The rendered bytes are identical; no write is needed.
    Unchanged,
}

impl Verdict {
    /// Compare the checksum recorded at parse time with `rendered`.
    #[must_use]
    pub fn compare(original: &Checksum, rendered: &[u8]) -> Self {
        let verdict = if *original == Checksum::of(rendered) {
            Self::Unchanged
        } else {
            Self::Changed
        };
        tracing::debug!("checksum verdict: {}", verdict.as_str());
        verdict
    }

    /// Whether a commit is required.
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed)
    }

    /// Word used in the `--verbose` report.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Changed => "changed",
            Self::Unchanged => "unchanged",
        }
    }
}
