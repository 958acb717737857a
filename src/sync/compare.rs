//! Content comparison between source and replica files.
//!
//! Two files are equal iff their SHA-256 fingerprints match; size is used
//! as a cheap pre-check so differently-sized files are never hashed.
//! Timestamps and other metadata play no part in the decision: a `touch`
//! without a content change must not trigger a copy, and a content change
//! without a timestamp update must still be detected.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::fs::walker::Entry;
use crate::fs::Filesystem;

/// Compute the SHA-256 fingerprint of a file by streaming its contents.
///
/// Returns the lowercase hex digest.
pub fn fingerprint(fs: &dyn Filesystem, path: &Path) -> io::Result<String> {
    let mut reader = fs.open_read(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Decides whether a source file and a replica file at the same relative
/// path are equal enough to skip copying.
///
/// Both entries must be files that exist under their respective roots.
/// Implemented for closures so the planner can be tested against literal
/// inventories without touching any filesystem.
pub trait Comparator {
    fn equal(&self, source: &Entry, replica: &Entry) -> bool;
}

impl<F> Comparator for F
where
    F: Fn(&Entry, &Entry) -> bool,
{
    fn equal(&self, source: &Entry, replica: &Entry) -> bool {
        self(source, replica)
    }
}

/// Fingerprint-based comparator over a [`Filesystem`].
pub struct HashComparator<'a> {
    fs: &'a dyn Filesystem,
    source_root: &'a Path,
    replica_root: &'a Path,
}

impl<'a> HashComparator<'a> {
    pub fn new(fs: &'a dyn Filesystem, source_root: &'a Path, replica_root: &'a Path) -> Self {
        Self {
            fs,
            source_root,
            replica_root,
        }
    }

    fn fingerprint_or_warn(&self, path: &PathBuf) -> Option<String> {
        match fingerprint(self.fs, path) {
            Ok(digest) => Some(digest),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "fingerprint failed, scheduling copy");
                None
            }
        }
    }
}

impl Comparator for HashComparator<'_> {
    fn equal(&self, source: &Entry, replica: &Entry) -> bool {
        if source.size != replica.size {
            return false;
        }

        let source_digest = self.fingerprint_or_warn(&self.source_root.join(&source.path));
        let replica_digest = self.fingerprint_or_warn(&self.replica_root.join(&replica.path));

        // An unreadable side is treated as unequal: copying again is safe,
        // and the executor surfaces any persistent error.
        match (source_digest, replica_digest) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
