//! Synchronization core: one cycle of walk → plan → apply.
//!
//! A cycle walks the source and replica trees, plans the operations that
//! reconcile replica to source, applies them, and journals a summary.
//! Cycles are driven by the [`scheduler`] and never overlap.

pub mod compare;
pub mod executor;
pub mod planner;
pub mod scheduler;

use std::path::PathBuf;
use std::sync::Arc;

use crate::fs::walker::walk;
use crate::fs::Filesystem;
use crate::journal::{EventKind, EventSink, LogEvent};
use crate::sync::compare::HashComparator;
use crate::sync::executor::Executor;
use crate::sync::planner::plan;
use crate::utils::errors::SyncError;

/// Summary of one completed cycle.
#[derive(Debug, Default)]
pub struct SyncCycleResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub errors: Vec<SyncError>,
}

impl SyncCycleResult {
    /// Total number of applied mutations.
    pub fn changed(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} deleted, {} errors",
            self.created,
            self.updated,
            self.deleted,
            self.errors.len()
        )
    }
}

/// Runs the walk → plan → apply pipeline for one source/replica pair.
pub struct SyncEngine {
    fs: Arc<dyn Filesystem>,
    source_root: PathBuf,
    replica_root: PathBuf,
    sink: Arc<dyn EventSink>,
}

impl SyncEngine {
    pub fn new(
        fs: Arc<dyn Filesystem>,
        source_root: impl Into<PathBuf>,
        replica_root: impl Into<PathBuf>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            fs,
            source_root: source_root.into(),
            replica_root: replica_root.into(),
            sink,
        }
    }

    /// Run one synchronization cycle.
    ///
    /// Returns `Err` only for cycle-level failures (a root entirely
    /// unavailable); those are journaled as ERROR here and the scheduler
    /// retries on the next tick. Per-entry and per-operation failures are
    /// contained in the returned [`SyncCycleResult`].
    pub fn run_cycle(&self) -> Result<SyncCycleResult, SyncError> {
        self.sink
            .emit(&LogEvent::new(EventKind::Info, "Started synchronization"));

        let source = match walk(self.fs.as_ref(), &self.source_root) {
            Ok(inventory) => inventory,
            Err(error) => return Err(self.cycle_failure(error)),
        };

        // The replica root can vanish between cycles; recreate it rather
        // than failing every subsequent cycle.
        if !self.fs.exists(&self.replica_root) {
            match self.fs.create_dir(&self.replica_root) {
                Ok(()) => self.sink.emit(&LogEvent::new(
                    EventKind::Created,
                    self.replica_root.display().to_string(),
                )),
                Err(source) => {
                    return Err(self.cycle_failure(SyncError::RootUnavailable {
                        path: self.replica_root.clone(),
                        source,
                    }))
                }
            }
        }

        let replica = match walk(self.fs.as_ref(), &self.replica_root) {
            Ok(inventory) => inventory,
            Err(error) => return Err(self.cycle_failure(error)),
        };

        let comparator = HashComparator::new(self.fs.as_ref(), source.root(), replica.root());
        let operations = plan(&source, &replica, &comparator);

        let executor = Executor::new(
            self.fs.as_ref(),
            source.root(),
            replica.root(),
            self.sink.as_ref(),
        );
        let mut result = executor.apply(&operations);

        // Entries the walks could not read are part of the cycle's errors.
        for inventory in [source, replica] {
            for error in inventory.into_skipped() {
                self.sink
                    .emit(&LogEvent::new(EventKind::Error, error.to_string()));
                result.errors.push(error);
            }
        }

        self.sink.emit(&LogEvent::new(
            EventKind::Info,
            format!("Finished synchronization: {}", result.summary()),
        ));

        Ok(result)
    }

    fn cycle_failure(&self, error: SyncError) -> SyncError {
        self.sink
            .emit(&LogEvent::new(EventKind::Error, error.to_string()));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFs;
    use crate::journal::MemorySink;
    use std::path::Path;

    fn engine(fs: Arc<MemoryFs>, sink: Arc<MemorySink>) -> SyncEngine {
        SyncEngine::new(fs, "/src", "/rep", sink)
    }

    #[test]
    fn test_cycle_converges_replica_to_source() {
        let memfs = Arc::new(MemoryFs::new());
        memfs.add_file("/src/a.txt", b"hi");
        memfs.add_file("/src/dir/b.txt", b"yo");
        memfs.add_file("/rep/a.txt", b"bye");
        memfs.add_file("/rep/dir/c.txt", b"old");
        let sink = Arc::new(MemorySink::new());

        let result = engine(memfs.clone(), sink).run_cycle().unwrap();

        assert_eq!(result.deleted, 1); // dir/c.txt
        assert_eq!(result.updated, 1); // a.txt
        assert_eq!(result.created, 1); // dir/b.txt
        assert!(result.errors.is_empty());

        assert_eq!(memfs.read("/rep/a.txt").unwrap(), b"hi");
        assert_eq!(memfs.read("/rep/dir/b.txt").unwrap(), b"yo");
        assert!(memfs.read("/rep/dir/c.txt").is_none());
    }

    #[test]
    fn test_second_cycle_is_idempotent() {
        let memfs = Arc::new(MemoryFs::new());
        memfs.add_file("/src/a.txt", b"hi");
        memfs.add_file("/src/dir/b.txt", b"yo");
        memfs.add_dir("/rep");
        let sink = Arc::new(MemorySink::new());

        let engine = engine(memfs, sink);
        let first = engine.run_cycle().unwrap();
        assert_eq!(first.changed(), 3);

        let second = engine.run_cycle().unwrap();
        assert_eq!(second.changed(), 0);
        assert!(second.errors.is_empty());
    }

    #[test]
    fn test_missing_source_root_fails_the_cycle() {
        let memfs = Arc::new(MemoryFs::new());
        memfs.add_dir("/rep");
        let sink = Arc::new(MemorySink::new());

        let error = engine(memfs, sink.clone()).run_cycle().unwrap_err();
        assert!(matches!(error, SyncError::RootUnavailable { .. }));
        assert_eq!(sink.count(EventKind::Error), 1);
    }

    #[test]
    fn test_vanished_replica_root_is_recreated() {
        let memfs = Arc::new(MemoryFs::new());
        memfs.add_file("/src/a.txt", b"hi");
        let sink = Arc::new(MemorySink::new());

        let result = engine(memfs.clone(), sink).run_cycle().unwrap();

        assert!(memfs.exists(Path::new("/rep")));
        assert_eq!(memfs.read("/rep/a.txt").unwrap(), b"hi");
        assert_eq!(result.created, 1);
    }

    #[test]
    fn test_no_replica_path_survives_that_is_absent_from_source() {
        let memfs = Arc::new(MemoryFs::new());
        memfs.add_file("/src/keep.txt", b"k");
        memfs.add_file("/rep/keep.txt", b"k");
        memfs.add_file("/rep/extra/one.txt", b"1");
        memfs.add_file("/rep/extra/two.txt", b"2");
        let sink = Arc::new(MemorySink::new());

        engine(memfs.clone(), sink).run_cycle().unwrap();

        let survivors: Vec<_> = memfs
            .paths()
            .into_iter()
            .filter(|p| p.starts_with("/rep"))
            .collect();
        assert_eq!(survivors, vec![Path::new("/rep"), Path::new("/rep/keep.txt")]);
    }
}
