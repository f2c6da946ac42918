//! taskdeck library
//!
//! This module exports the core components for testing and integration:
//! the ordered collection manager and its storage seam, the SQLite-backed
//! task store, and the CLI command layer.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod manager;
pub mod ordering;
pub mod store;
pub mod types;
