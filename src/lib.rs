//! Database restore orchestration for the deployment platform.
//!
//! Restores each platform database from a backup archive while keeping the
//! service containers, host units and post-restore invariants consistent.
//! The driver (see `main.rs`) builds an [`restore::Archivator`] per database
//! and hands it to [`restore::perform_restore`].

pub mod api;
pub mod archive;
pub mod config;
pub mod container;
pub mod errors;
pub mod restore;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{RestoreError, Result};
