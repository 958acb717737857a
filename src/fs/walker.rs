//! Directory traversal producing a point-in-time inventory of a tree.
//!
//! One walk covers one root and yields one [`Entry`] per file and per
//! directory, with paths relative to the root. Symbolic links and special
//! files are skipped with a logged warning; they are never followed and
//! never mirrored. An entry that cannot be read (permission denied, or a
//! file that vanishes mid-walk) is recorded as an error and omitted; the
//! walk itself keeps going.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

use crate::fs::{FileKind, Filesystem};
use crate::utils::errors::SyncError;

/// One filesystem object discovered during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path relative to the walked root. The natural key: two entries from
    /// different trees with equal relative path are the same location.
    pub path: PathBuf,

    /// File or directory. Symlinks never make it into an inventory.
    pub kind: FileKind,

    /// Size in bytes. Zero for directories.
    pub size: u64,

    /// Last modification time (files only).
    pub modified: Option<SystemTime>,
}

/// Snapshot mapping of relative paths to entries for one root at one
/// instant. Built fresh every cycle and never mutated.
#[derive(Debug)]
pub struct Inventory {
    root: PathBuf,
    entries: BTreeMap<PathBuf, Entry>,
    skipped: Vec<SyncError>,
}

impl Inventory {
    /// Build an inventory from literal entries, keyed by relative path.
    /// Used by planner tests; real inventories come from [`walk`].
    pub fn from_entries(root: impl Into<PathBuf>, entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            root: root.into(),
            entries: entries.into_iter().map(|e| (e.path.clone(), e)).collect(),
            skipped: Vec::new(),
        }
    }

    /// The root this inventory was walked from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, path: &Path) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Entries in lexicographic path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &Entry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-entry read errors collected during the walk. Each corresponds to
    /// an entry that was omitted from the inventory.
    pub fn skipped(&self) -> &[SyncError] {
        &self.skipped
    }

    /// Consume the inventory, yielding its per-entry read errors.
    pub fn into_skipped(self) -> Vec<SyncError> {
        self.skipped
    }

    /// Absolute path of a relative entry path under this inventory's root.
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }
}

/// Walk `root` and produce its [`Inventory`].
///
/// Fails with [`SyncError::RootUnavailable`] if the root does not exist or
/// is not a directory. Read-only: the walk never mutates the tree.
pub fn walk(fs: &dyn Filesystem, root: &Path) -> Result<Inventory, SyncError> {
    let root_stat = fs.stat(root).map_err(|source| SyncError::RootUnavailable {
        path: root.to_path_buf(),
        source,
    })?;
    if root_stat.kind != FileKind::Directory {
        return Err(SyncError::RootUnavailable {
            path: root.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let mut entries = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let children = match fs.list_dir(&dir) {
            Ok(children) => children,
            Err(source) => {
                warn!(path = %dir.display(), error = %source, "skipping unreadable directory");
                skipped.push(SyncError::EntryRead {
                    path: dir.clone(),
                    source,
                });
                continue;
            }
        };

        for child in children {
            let stat = match fs.stat(&child) {
                Ok(stat) => stat,
                Err(source) => {
                    warn!(path = %child.display(), error = %source, "skipping unreadable entry");
                    skipped.push(SyncError::EntryRead {
                        path: child.clone(),
                        source,
                    });
                    continue;
                }
            };

            let relative = child.strip_prefix(root).unwrap_or(&child).to_path_buf();
            match stat.kind {
                FileKind::Directory => {
                    entries.insert(
                        relative.clone(),
                        Entry {
                            path: relative,
                            kind: FileKind::Directory,
                            size: 0,
                            modified: None,
                        },
                    );
                    pending.push(child);
                }
                FileKind::File => {
                    entries.insert(
                        relative.clone(),
                        Entry {
                            path: relative,
                            kind: FileKind::File,
                            size: stat.size,
                            modified: stat.modified,
                        },
                    );
                }
                FileKind::Symlink | FileKind::Other => {
                    warn!(path = %child.display(), "skipping symlink or special file");
                }
            }
        }
    }

    Ok(Inventory {
        root: root.to_path_buf(),
        entries,
        skipped,
    })
}
