//! # Storage Layer
//!
//! Persistence for the contact directory.
//!
//! | Data | Format | Component |
//! |------|--------|-----------|
//! | Contacts + addresses | SQLite (source of truth) | [`ContactStore`] |
//! | Snapshot | Pretty-printed JSON, full replace | [`SnapshotStore`] |
//! | Config | TOML | [`Config`] |
//!
//! The relational store is authoritative; the snapshot is a manually
//! refreshed point-in-time artifact for offline reads. Snapshot writes are
//! atomic (temp file + rename) and file-locked.

mod config;
mod db;
mod snapshot;

pub use config::{Config, ConfigError};
pub use db::{ContactStore, StoreError};
pub use snapshot::SnapshotStore;
