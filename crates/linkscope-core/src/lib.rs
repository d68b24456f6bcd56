//! Core types and traits for linkscope.
//!
//! This crate provides the fundamental data structures shared by the scan
//! and operations crates: file identity records, classification results,
//! the error taxonomy, and configuration.

mod config;
mod error;
pub mod lossy;
mod record;
mod result;
mod settings;

pub use config::{ScanConfig, ScanConfigBuilder, depth_limit};
pub use error::{ConfigError, PathError, ScanError};
pub use record::{Column, ColumnSelector, FileRecord, InodeKey, PerColumn};
pub use result::{ConflictEntry, ScanResult, SyncedFolders, SyncedPair};
pub use settings::{AppSettings, ScanMode, TabConfig, default_settings_path};
