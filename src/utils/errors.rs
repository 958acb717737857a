//! Custom error types for the sync agent.
//!
//! Errors are contained at the smallest scope that preserves forward
//! progress: a single unreadable entry never aborts a walk, a single failed
//! operation never aborts a cycle, and a single bad cycle never stops the
//! scheduler.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// A configured root does not exist or is not traversable.
    /// Recoverable: the scheduler retries on the next cycle.
    #[error("root unavailable: {}: {source}", path.display())]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One entry could not be read during a walk. The entry is skipped
    /// and the walk continues.
    #[error("failed to read {}: {source}", path.display())]
    EntryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One planned operation failed at apply time. Logged as ERROR,
    /// the batch continues.
    #[error("{action} failed for {}: {source}", path.display())]
    OperationFailed {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The logging destination itself failed.
    #[error("log destination unavailable: {}: {source}", path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
