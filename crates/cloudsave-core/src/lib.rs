//! Timestamped multi-backend directory backups with keep-last-N retention.
//!
//! Archives are named `<timestamp>_<directory>.zip`; archives sharing a
//! timestamp form one revision. A [`orchestrator::BackupOrchestrator`] drives
//! one backend through initialize, store, restore and cleanup.

pub mod backend;
pub mod config;
pub mod error;
pub mod fleet;
pub mod grouping;
pub mod naming;
pub mod orchestrator;
pub mod packer;
pub mod retention;
pub mod state;
pub mod types;
