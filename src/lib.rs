//! Rolodex - a contact directory with a SQLite source of truth
//!
//! Contacts (each owning an ordered sequence of postal addresses) are
//! identified by stable opaque pids, searchable by name, phone, zip and
//! city with `*` wildcards, and persisted to SQLite with an optional
//! flat-file JSON snapshot for offline reads. [`Directory`] is the entry
//! point: it owns identity semantics, the update-as-replace protocol and
//! the snapshot save/load operations.

pub mod cli;
pub mod directory;
pub mod domain;
pub mod format;
pub mod search;
pub mod storage;

pub use directory::{Directory, DirectoryError};
pub use domain::{Address, Contact, Country, Gender, Pid, State};
pub use search::{SearchField, SearchQuery};
