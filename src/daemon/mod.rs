//! Process lifecycle handling for the sync agent.

pub mod shutdown;

pub use shutdown::ShutdownCoordinator;
