//! Sync Agent Library
//!
//! One-way periodic folder synchronization: the replica folder is
//! reconciled to match the source folder on a fixed interval, and every
//! create, update, and delete is journaled to a log file and the console.

pub mod config;
pub mod daemon;
pub mod fs;
pub mod journal;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
