//! Applies planned operations against the replica tree.
//!
//! Operations run strictly in the order given; the planner's ordering
//! invariants make that safe. Each operation produces exactly one journal
//! event: CREATED, UPDATED, or DELETED on success, ERROR on failure. A
//! failed operation is recorded and the batch continues, so one bad file
//! never blocks reconciliation of the rest of the tree.

use std::path::Path;

use crate::fs::{FileKind, Filesystem};
use crate::journal::{EventKind, EventSink, LogEvent};
use crate::sync::planner::Operation;
use crate::sync::SyncCycleResult;
use crate::utils::errors::SyncError;

pub struct Executor<'a> {
    fs: &'a dyn Filesystem,
    source_root: &'a Path,
    replica_root: &'a Path,
    sink: &'a dyn EventSink,
}

impl<'a> Executor<'a> {
    pub fn new(
        fs: &'a dyn Filesystem,
        source_root: &'a Path,
        replica_root: &'a Path,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            fs,
            source_root,
            replica_root,
            sink,
        }
    }

    /// Apply `operations` in order, journaling one event per operation.
    pub fn apply(&self, operations: &[Operation]) -> SyncCycleResult {
        let mut result = SyncCycleResult::default();

        for operation in operations {
            if let Err(error) = self.apply_one(operation, &mut result) {
                self.sink
                    .emit(&LogEvent::new(EventKind::Error, error.to_string()));
                result.errors.push(error);
            }
        }

        result
    }

    fn apply_one(
        &self,
        operation: &Operation,
        result: &mut SyncCycleResult,
    ) -> Result<(), SyncError> {
        match operation {
            Operation::Delete { path, kind } => {
                let target = self.replica_root.join(path);
                let removal = match kind {
                    FileKind::Directory => self.fs.remove_empty_dir(&target),
                    _ => self.fs.remove_file(&target),
                };
                removal.map_err(|source| SyncError::OperationFailed {
                    action: "delete",
                    path: target.clone(),
                    source,
                })?;

                self.sink
                    .emit(&LogEvent::new(EventKind::Deleted, target.display().to_string()));
                result.deleted += 1;
            }

            Operation::CreateDirectory { path } => {
                let target = self.replica_root.join(path);
                self.fs
                    .create_dir(&target)
                    .map_err(|source| SyncError::OperationFailed {
                        action: "create directory",
                        path: target.clone(),
                        source,
                    })?;

                self.sink
                    .emit(&LogEvent::new(EventKind::Created, target.display().to_string()));
                result.created += 1;
            }

            Operation::CopyOrUpdate { path } => {
                let origin = self.source_root.join(path);
                let target = self.replica_root.join(path);

                // Destination existence decides CREATED vs UPDATED, checked
                // before the write.
                let existed = self.fs.exists(&target);

                let mut reader =
                    self.fs
                        .open_read(&origin)
                        .map_err(|source| SyncError::OperationFailed {
                            action: "copy",
                            path: origin.clone(),
                            source,
                        })?;
                self.fs
                    .write_file(&target, reader.as_mut())
                    .map_err(|source| SyncError::OperationFailed {
                        action: "copy",
                        path: target.clone(),
                        source,
                    })?;

                if existed {
                    self.sink
                        .emit(&LogEvent::new(EventKind::Updated, target.display().to_string()));
                    result.updated += 1;
                } else {
                    self.sink
                        .emit(&LogEvent::new(EventKind::Created, target.display().to_string()));
                    result.created += 1;
                }
            }
        }

        Ok(())
    }
}
