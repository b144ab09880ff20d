//! Directory mediator
//!
//! [`Directory`] is the single entry point for mutating and querying the
//! contact set. It owns identity semantics (idempotent adds, the sentinel
//! identity), the update-as-replace protocol against the store, search
//! translation, and the explicit snapshot save/load operations.
//!
//! The relational store is the source of truth. The snapshot file is a
//! secondary artifact refreshed only on request; nothing here keeps the
//! two in sync automatically.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, error};

use crate::domain::{Contact, Pid};
use crate::search::{SearchError, SearchField, SearchQuery};
use crate::storage::{ContactStore, SnapshotStore, StoreError};

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Malformed contact supplied to a mutating operation. Programmer
    /// error: raised immediately, never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unrecognized search field. Programmer error, like `InvalidInput`.
    #[error(transparent)]
    InvalidSearchField(#[from] SearchError),

    /// The requested identity does not exist in the store.
    #[error("No contact with id {0}")]
    NotFound(Pid),

    /// An insert/delete reported zero affected rows where one or more was
    /// expected.
    #[error("Store command failed: {0}")]
    CommandFailed(String),

    /// The replace transaction behind an update failed. The store rolled
    /// the record back to its previous version; the update was NOT
    /// applied and the caller should verify before retrying.
    #[error("Update of contact {pid} failed and was rolled back: {reason}")]
    UpdateInconsistent { pid: Pid, reason: String },

    /// Connectivity/transport failure from the underlying store client.
    #[error("Store unavailable: {0}")]
    Store(#[from] rusqlite::Error),

    /// Snapshot file could not be read or written.
    #[error("Snapshot error: {0:#}")]
    Snapshot(anyhow::Error),
}

impl From<StoreError> for DirectoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoRowsAffected(what) => DirectoryError::CommandFailed(what),
            StoreError::Sqlite(e) => DirectoryError::Store(e),
        }
    }
}

/// The directory mediator: owns the store and the snapshot
pub struct Directory {
    store: ContactStore,
    snapshot: SnapshotStore,
}

impl Directory {
    /// Opens a directory backed by the given database and snapshot paths
    pub fn open(db_path: &Path, snapshot_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            store: ContactStore::open(db_path)?,
            snapshot: SnapshotStore::new(snapshot_path),
        })
    }

    /// Adds a contact and all of its addresses
    ///
    /// Re-adding an existing identity is a no-op returning
    /// [`Pid::sentinel`]; the stored record is left untouched.
    pub fn add(&mut self, contact: &Contact) -> Result<Pid, DirectoryError> {
        contact
            .validate()
            .map_err(DirectoryError::InvalidInput)?;

        if self.store.contact_exists(&contact.pid)? {
            debug!(pid = %contact.pid, "duplicate add skipped");
            return Ok(Pid::sentinel());
        }

        self.store.insert_contact(contact)?;
        Ok(contact.pid.clone())
    }

    /// Adds a batch of contacts, in input order, returning the resulting
    /// identity for each element (sentinels included)
    pub fn add_all(&mut self, contacts: &[Contact]) -> Result<Vec<Pid>, DirectoryError> {
        contacts.iter().map(|c| self.add(c)).collect()
    }

    /// Deletes a contact and its addresses by identity
    ///
    /// Returns false if the identity does not exist. Partial failure
    /// (address rows without a contact row, or a mismatched address count)
    /// surfaces as [`DirectoryError::CommandFailed`].
    pub fn delete(&mut self, pid: &Pid) -> Result<bool, DirectoryError> {
        Ok(self.store.delete_contact(pid)?)
    }

    /// Replaces an existing contact with a new version
    ///
    /// Returns false if the identity does not exist. The whole
    /// delete-then-reinsert runs as one store transaction; a mid-flight
    /// failure rolls back. A zero-affected-rows anomaly surfaces as
    /// [`DirectoryError::UpdateInconsistent`]; transport failures keep
    /// their [`DirectoryError::Store`] classification.
    pub fn update(&mut self, contact: &Contact) -> Result<bool, DirectoryError> {
        contact
            .validate()
            .map_err(DirectoryError::InvalidInput)?;

        match self.store.fetch_contact(&contact.pid)? {
            None => return Ok(false),
            Some(existing) if existing == *contact => {
                // Deep-equal to the persisted record: nothing to replace.
                debug!(pid = %contact.pid, "update skipped, record unchanged");
                return Ok(true);
            }
            Some(_) => {}
        }

        match self.store.replace_contact(contact) {
            Ok(replaced) => Ok(replaced),
            Err(StoreError::NoRowsAffected(reason)) => Err(DirectoryError::UpdateInconsistent {
                pid: contact.pid.clone(),
                reason,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Searches by a typed field; `*` in the term is a wildcard
    pub fn search(&self, field: SearchField, term: &str) -> Result<Vec<Contact>, DirectoryError> {
        let query = SearchQuery::translate(field, term);
        debug!(field = %field, wildcard = query.is_wildcard(), "search");
        Ok(self.store.search(&query)?)
    }

    /// Searches by field name, raising `InvalidSearchField` for names
    /// outside the field table
    pub fn search_named(&self, field: &str, term: &str) -> Result<Vec<Contact>, DirectoryError> {
        let field: SearchField = field.parse()?;
        self.search(field, term)
    }

    /// Fetches one contact by identity
    pub fn get(&self, pid: &Pid) -> Result<Option<Contact>, DirectoryError> {
        Ok(self.store.fetch_contact(pid)?)
    }

    /// Like [`Directory::get`], but a missing identity is an error (the
    /// query surface's "not found" classification)
    pub fn require(&self, pid: &Pid) -> Result<Contact, DirectoryError> {
        self.get(pid)?
            .ok_or_else(|| DirectoryError::NotFound(pid.clone()))
    }

    /// Returns every contact with its addresses
    ///
    /// Degraded-read behavior: on store failure this returns an empty
    /// sequence and records the failure, rather than propagating.
    pub fn get_all(&self) -> Vec<Contact> {
        match self.store.fetch_all() {
            Ok(contacts) => contacts,
            Err(e) => {
                error!(error = %e, "degraded read: get_all returning empty set");
                Vec::new()
            }
        }
    }

    /// Number of contacts in the store; 0 on store failure (degraded,
    /// recorded like `get_all`)
    pub fn count(&self) -> usize {
        match self.store.count() {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "degraded read: count returning 0");
                0
            }
        }
    }

    /// Writes the full contact set to the snapshot file, replacing its
    /// contents; returns how many contacts were written
    pub fn save_snapshot(&self) -> Result<usize, DirectoryError> {
        let contacts = self.store.fetch_all()?;
        self.snapshot
            .write_all(&contacts)
            .map_err(DirectoryError::Snapshot)?;
        Ok(contacts.len())
    }

    /// Replaces the working set with the snapshot's contents: clears the
    /// store, then repopulates it from the file (never a merge); returns
    /// how many contacts were loaded
    pub fn load_snapshot(&mut self) -> Result<usize, DirectoryError> {
        let contacts = self
            .snapshot
            .read_all()
            .map_err(DirectoryError::Snapshot)?;

        self.store.clear()?;
        for contact in &contacts {
            self.store.insert_contact(contact)?;
        }

        Ok(contacts.len())
    }

    /// Path of the snapshot file
    pub fn snapshot_path(&self) -> &Path {
        self.snapshot.path()
    }
}
