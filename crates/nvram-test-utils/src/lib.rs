//! Shared test utilities for the nvram-tweak workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`fixtures`] - sample AMISCE dumps as string constants
//! - [`dump`] - [`TempDump`](dump::TempDump) for tests that need a file on disk

pub mod dump;
pub mod fixtures;
