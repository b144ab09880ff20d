//! Flat-file snapshot of the contact set
//!
//! The snapshot is a single pretty-printed JSON array of contacts
//! (addresses nested) at a configurable path. It is a secondary,
//! non-authoritative artifact: every write replaces the whole file, every
//! read replaces the caller's working set. Nothing here keeps it in sync
//! with the relational store; refreshing is the caller's job.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::Contact;

/// Store for full-set contact snapshots
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    /// Creates a snapshot store at the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if a snapshot file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the full contact set from the snapshot file
    ///
    /// The returned set is a replacement for whatever the caller currently
    /// holds, never something to merge.
    pub fn read_all(&self) -> Result<Vec<Contact>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open snapshot: {}", self.path.display()))?;

        file.lock_shared()
            .context("Failed to acquire read lock on snapshot")?;

        let reader = BufReader::new(&file);
        let contacts: Vec<Contact> = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse snapshot: {}", self.path.display()))?;

        // Lock is released when file is dropped
        Ok(contacts)
    }

    /// Writes the full contact set to the snapshot file (full replace)
    pub fn write_all(&self, contacts: &[Contact]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        // Write to temp file first
        let temp_path = self.path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            file.lock_exclusive()
                .context("Failed to acquire write lock on snapshot")?;

            let mut writer = BufWriter::new(&file);
            serde_json::to_writer_pretty(&mut writer, contacts)
                .context("Failed to serialize snapshot")?;
            writeln!(writer).context("Failed to write snapshot")?;

            writer.flush().context("Failed to flush snapshot")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }
}
