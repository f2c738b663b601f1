//! tunelog-core - Core library for tunelog
//!
//! This crate contains the play models, the reconciliation pipeline that turns
//! recently played tracks into a daily Markdown log, and the Spotify and
//! document store clients used by the CLI and the API.

pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod spotify;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use sync::{SyncOptions, SyncReport, SyncService, SyncSettings, SyncStatus};
