//! Diff planner: computes the ordered operation list that reconciles the
//! replica tree to the source tree.
//!
//! The planner is pure. It never touches the filesystem itself (content
//! comparison happens through the [`Comparator`] it is given), so it can
//! be tested against literal inventories.

use std::path::{Path, PathBuf};

use crate::fs::walker::{Entry, Inventory};
use crate::fs::FileKind;
use crate::sync::compare::Comparator;

/// One planned filesystem action against the replica tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Remove the replica entry at `path`. For directories, every operation
    /// on a nested path is ordered before this one.
    Delete { path: PathBuf, kind: FileKind },

    /// Create a directory in the replica. Ordered before any operation on a
    /// path nested under it.
    CreateDirectory { path: PathBuf },

    /// Copy the source file at `path` into the replica, creating it or
    /// overwriting it. The executor distinguishes the two at apply time.
    CopyOrUpdate { path: PathBuf },
}

impl Operation {
    pub fn path(&self) -> &Path {
        match self {
            Operation::Delete { path, .. }
            | Operation::CreateDirectory { path }
            | Operation::CopyOrUpdate { path } => path,
        }
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

/// Compute the ordered operations that make `replica` match `source`.
///
/// All deletions come first, deepest-first, so a directory is only deleted
/// once its contents are gone. Creations and updates follow,
/// shallowest-first, so a directory exists before anything is placed in
/// it. A path present in both trees with mismatched kinds is a structural
/// conflict: the replica entry is deleted and the source entry recreated.
pub fn plan(source: &Inventory, replica: &Inventory, comparator: &dyn Comparator) -> Vec<Operation> {
    // Replica-only paths and the replica side of kind mismatches go away.
    let mut deletions: Vec<&Entry> = Vec::new();
    for (path, replica_entry) in replica.iter() {
        match source.get(path) {
            None => deletions.push(replica_entry),
            Some(source_entry) if source_entry.kind != replica_entry.kind => {
                deletions.push(replica_entry)
            }
            Some(_) => {}
        }
    }
    deletions.sort_by(|a, b| {
        depth(&b.path)
            .cmp(&depth(&a.path))
            .then_with(|| b.path.cmp(&a.path))
    });

    // Source-only paths, the source side of kind mismatches, and common
    // files whose content differs.
    let mut additions: Vec<&Entry> = Vec::new();
    for (path, source_entry) in source.iter() {
        match replica.get(path) {
            None => additions.push(source_entry),
            Some(replica_entry) if replica_entry.kind != source_entry.kind => {
                additions.push(source_entry)
            }
            Some(replica_entry) if source_entry.kind == FileKind::File => {
                if !comparator.equal(source_entry, replica_entry) {
                    additions.push(source_entry);
                }
            }
            Some(_) => {}
        }
    }
    additions.sort_by(|a, b| {
        depth(&a.path)
            .cmp(&depth(&b.path))
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut operations = Vec::with_capacity(deletions.len() + additions.len());
    for entry in deletions {
        operations.push(Operation::Delete {
            path: entry.path.clone(),
            kind: entry.kind,
        });
    }
    for entry in additions {
        operations.push(match entry.kind {
            FileKind::Directory => Operation::CreateDirectory {
                path: entry.path.clone(),
            },
            _ => Operation::CopyOrUpdate {
                path: entry.path.clone(),
            },
        });
    }
    operations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size: u64) -> Entry {
        Entry {
            path: PathBuf::from(path),
            kind: FileKind::File,
            size,
            modified: None,
        }
    }

    fn dir(path: &str) -> Entry {
        Entry {
            path: PathBuf::from(path),
            kind: FileKind::Directory,
            size: 0,
            modified: None,
        }
    }

    fn inventory(root: &str, entries: Vec<Entry>) -> Inventory {
        Inventory::from_entries(root, entries)
    }

    /// Comparator that judges files equal iff their sizes match.
    fn size_comparator() -> impl Comparator {
        |a: &Entry, b: &Entry| a.size == b.size
    }

    #[test]
    fn test_identical_trees_plan_nothing() {
        let source = inventory("/src", vec![dir("d"), file("d/a.txt", 3), file("b.txt", 5)]);
        let replica = inventory("/rep", vec![dir("d"), file("d/a.txt", 3), file("b.txt", 5)]);

        assert!(plan(&source, &replica, &size_comparator()).is_empty());
    }

    #[test]
    fn test_reference_scenario() {
        // source = {a.txt:"hi", dir/b.txt:"yo"}, replica = {a.txt:"bye", dir/c.txt:"old"}
        let source = inventory("/src", vec![file("a.txt", 2), dir("dir"), file("dir/b.txt", 2)]);
        let replica = inventory(
            "/rep",
            vec![file("a.txt", 3), dir("dir"), file("dir/c.txt", 3)],
        );

        let operations = plan(&source, &replica, &size_comparator());
        assert_eq!(
            operations,
            vec![
                Operation::Delete {
                    path: PathBuf::from("dir/c.txt"),
                    kind: FileKind::File,
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("a.txt"),
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("dir/b.txt"),
                },
            ]
        );
    }

    #[test]
    fn test_deletions_are_deepest_first() {
        let source = inventory("/src", vec![]);
        let replica = inventory(
            "/rep",
            vec![
                dir("a"),
                dir("a/b"),
                file("a/b/deep.txt", 1),
                file("a/top.txt", 1),
            ],
        );

        let operations = plan(&source, &replica, &size_comparator());
        let paths: Vec<&Path> = operations.iter().map(|op| op.path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("a/b/deep.txt"),
                Path::new("a/b"),
                Path::new("a/top.txt"),
                Path::new("a"),
            ]
        );
        assert!(operations
            .iter()
            .all(|op| matches!(op, Operation::Delete { .. })));
    }

    #[test]
    fn test_creations_are_shallowest_first() {
        let source = inventory(
            "/src",
            vec![
                dir("a"),
                dir("a/b"),
                file("a/b/deep.txt", 1),
                file("a/top.txt", 1),
            ],
        );
        let replica = inventory("/rep", vec![]);

        let operations = plan(&source, &replica, &size_comparator());
        assert_eq!(
            operations,
            vec![
                Operation::CreateDirectory {
                    path: PathBuf::from("a"),
                },
                Operation::CreateDirectory {
                    path: PathBuf::from("a/b"),
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("a/top.txt"),
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("a/b/deep.txt"),
                },
            ]
        );
    }

    #[test]
    fn test_kind_mismatch_file_replaced_by_directory() {
        // Source has a directory where the replica has a file.
        let source = inventory("/src", vec![dir("x"), file("x/child.txt", 4)]);
        let replica = inventory("/rep", vec![file("x", 9)]);

        let operations = plan(&source, &replica, &size_comparator());
        assert_eq!(
            operations,
            vec![
                Operation::Delete {
                    path: PathBuf::from("x"),
                    kind: FileKind::File,
                },
                Operation::CreateDirectory {
                    path: PathBuf::from("x"),
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("x/child.txt"),
                },
            ]
        );
    }

    #[test]
    fn test_kind_mismatch_directory_replaced_by_file() {
        // Source has a file where the replica has a directory with contents.
        let source = inventory("/src", vec![file("x", 9)]);
        let replica = inventory("/rep", vec![dir("x"), file("x/old.txt", 4)]);

        let operations = plan(&source, &replica, &size_comparator());
        assert_eq!(
            operations,
            vec![
                Operation::Delete {
                    path: PathBuf::from("x/old.txt"),
                    kind: FileKind::File,
                },
                Operation::Delete {
                    path: PathBuf::from("x"),
                    kind: FileKind::Directory,
                },
                Operation::CopyOrUpdate {
                    path: PathBuf::from("x"),
                },
            ]
        );
    }

    #[test]
    fn test_equal_files_are_not_copied() {
        let source = inventory("/src", vec![file("same.txt", 5), file("diff.txt", 5)]);
        let replica = inventory("/rep", vec![file("same.txt", 5), file("diff.txt", 5)]);

        // Only diff.txt is judged unequal.
        let comparator =
            |a: &Entry, _b: &Entry| a.path != Path::new("diff.txt");

        let operations = plan(&source, &replica, &comparator);
        assert_eq!(
            operations,
            vec![Operation::CopyOrUpdate {
                path: PathBuf::from("diff.txt"),
            }]
        );
    }
}
