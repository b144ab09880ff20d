//! SQLite store adapter
//!
//! [`ContactStore`] owns the database connection and every piece of SQL in
//! the crate. Contacts and addresses live in two related tables; country
//! and state lookup tables are read-only reference data seeded at schema
//! creation.
//!
//! Write operations run inside a transaction. The `*_tx` associated
//! functions take a caller-supplied [`Transaction`] so the mediator can
//! compose delete + insert into one atomic replace; the inherent methods
//! open and own the transaction for a single call.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Transaction};
use thiserror::Error;

use crate::domain::{Address, Contact, Country, Gender, Pid, State};
use crate::search::{FieldTarget, Matcher, SearchQuery};

#[derive(Debug, Error)]
pub enum StoreError {
    /// An insert/delete reported zero affected rows where one or more was
    /// expected. The enclosing transaction has been rolled back.
    #[error("Store command affected no rows: {0}")]
    NoRowsAffected(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// The relational store adapter
pub struct ContactStore {
    db_path: PathBuf,
    conn: Connection,
}

impl ContactStore {
    /// Schema version - bump when schema changes to force rebuild
    const SCHEMA_VERSION: i32 = 1;

    /// Opens (creating if needed) the store at the given path
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open store database: {}", db_path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA foreign_keys=ON;",
        )?;

        let mut store = Self {
            db_path: db_path.to_path_buf(),
            conn,
        };

        store.ensure_schema()?;

        Ok(store)
    }

    /// Returns the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Opens a transaction for callers that need to compose several store
    /// operations into one atomic unit (see the `*_tx` functions)
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        Ok(self.conn.transaction()?)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        let current_version = self.get_schema_version()?;

        if current_version != Self::SCHEMA_VERSION {
            self.create_schema()?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: Option<i32> = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(result.unwrap_or(0))
    }

    fn create_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS addresses;
            DROP TABLE IF EXISTS contacts;
            DROP TABLE IF EXISTS countries;
            DROP TABLE IF EXISTS states;

            CREATE TABLE countries (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE states (
                code TEXT PRIMARY KEY,
                name TEXT NOT NULL
            );

            CREATE TABLE contacts (
                pid TEXT PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                phone TEXT NOT NULL,
                gender INTEGER NOT NULL
            );

            CREATE TABLE addresses (
                pid TEXT PRIMARY KEY,
                contact_pid TEXT NOT NULL REFERENCES contacts(pid),
                street TEXT NOT NULL,
                house_num TEXT NOT NULL,
                city TEXT NOT NULL,
                zip TEXT NOT NULL,
                state TEXT NOT NULL REFERENCES states(code),
                country TEXT NOT NULL REFERENCES countries(code),
                position INTEGER NOT NULL
            );

            CREATE INDEX idx_addresses_contact ON addresses(contact_pid);
            CREATE INDEX idx_contacts_last_name ON contacts(last_name);
            CREATE INDEX idx_addresses_zip ON addresses(zip);
            CREATE INDEX idx_addresses_city ON addresses(city);
            ",
        )?;

        self.seed_lookups()?;

        self.conn.execute(
            &format!("PRAGMA user_version = {}", Self::SCHEMA_VERSION),
            [],
        )?;

        Ok(())
    }

    /// Seeds the read-only country/state lookup tables
    fn seed_lookups(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO countries (code, name) VALUES (?1, ?2)")?;
            for country in Country::all() {
                stmt.execute(params![country.code(), country.name()])?;
            }
        }

        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO states (code, name) VALUES (?1, ?2)")?;
            for state in State::all() {
                stmt.execute(params![state.code(), state.name()])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Checks whether a contact with this identity exists
    pub fn contact_exists(&self, pid: &Pid) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM contacts WHERE pid = ?1",
                params![pid.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    /// Inserts a contact and all of its addresses in one transaction
    pub fn insert_contact(&mut self, contact: &Contact) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        Self::insert_contact_tx(&tx, contact)?;
        tx.commit()?;
        Ok(())
    }

    /// Inserts under a caller-supplied transaction; the contact row goes in
    /// first, then the address rows that reference it
    pub fn insert_contact_tx(tx: &Transaction, contact: &Contact) -> Result<(), StoreError> {
        let inserted = tx.execute(
            "INSERT INTO contacts (pid, first_name, last_name, phone, gender)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                contact.pid.to_string(),
                contact.first_name,
                contact.last_name,
                contact.phone,
                contact.gender.index(),
            ],
        )?;

        if inserted == 0 {
            return Err(StoreError::NoRowsAffected(format!(
                "insert of contact {}",
                contact.pid
            )));
        }

        let mut stmt = tx.prepare(
            "INSERT INTO addresses (pid, contact_pid, street, house_num, city, zip, state, country, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for (position, address) in contact.addresses.iter().enumerate() {
            let inserted = stmt.execute(params![
                address.pid.to_string(),
                address.contact_pid.to_string(),
                address.street,
                address.house_num,
                address.city,
                address.zip,
                address.state.code(),
                address.country.code(),
                position as i64,
            ])?;

            if inserted == 0 {
                return Err(StoreError::NoRowsAffected(format!(
                    "insert of address {}",
                    address.pid
                )));
            }
        }

        Ok(())
    }

    /// Deletes a contact and its addresses; returns false if the identity
    /// does not exist
    pub fn delete_contact(&mut self, pid: &Pid) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = Self::delete_contact_tx(&tx, pid)?;
        tx.commit()?;
        Ok(deleted)
    }

    /// Deletes under a caller-supplied transaction; address rows go first
    /// (they hold the foreign key), then the contact row
    pub fn delete_contact_tx(tx: &Transaction, pid: &Pid) -> Result<bool, StoreError> {
        let owned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM addresses WHERE contact_pid = ?1",
            params![pid.to_string()],
            |row| row.get(0),
        )?;

        let addresses_deleted = tx.execute(
            "DELETE FROM addresses WHERE contact_pid = ?1",
            params![pid.to_string()],
        )?;

        let contacts_deleted = tx.execute(
            "DELETE FROM contacts WHERE pid = ?1",
            params![pid.to_string()],
        )?;

        if contacts_deleted == 0 {
            if addresses_deleted > 0 {
                // Orphaned address rows were removed for a contact that no
                // longer exists. Surface it; callers must not see this as
                // a clean miss.
                return Err(StoreError::NoRowsAffected(format!(
                    "delete of contact {} removed {} address rows but no contact row",
                    pid, addresses_deleted
                )));
            }
            return Ok(false);
        }

        if addresses_deleted as i64 != owned {
            return Err(StoreError::NoRowsAffected(format!(
                "delete of contact {} removed {} of {} address rows",
                pid, addresses_deleted, owned
            )));
        }

        Ok(true)
    }

    /// Atomically replaces an existing contact (delete-then-reinsert as one
    /// transaction); returns false without writing if the identity does not
    /// exist
    pub fn replace_contact(&mut self, contact: &Contact) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;

        if !Self::delete_contact_tx(&tx, &contact.pid)? {
            return Ok(false);
        }
        Self::insert_contact_tx(&tx, contact)?;

        tx.commit()?;
        Ok(true)
    }

    /// Fetches one contact with its full address sequence
    pub fn fetch_contact(&self, pid: &Pid) -> Result<Option<Contact>, StoreError> {
        let contact = self
            .conn
            .query_row(
                "SELECT pid, first_name, last_name, phone, gender
                 FROM contacts WHERE pid = ?1",
                params![pid.to_string()],
                row_to_contact,
            )
            .optional()?;

        match contact {
            Some(mut contact) => {
                contact.addresses = self.fetch_addresses(&contact.pid)?;
                Ok(Some(contact))
            }
            None => Ok(None),
        }
    }

    /// Fetches every contact, each with its addresses, ordered by last
    /// name, first name, then pid
    pub fn fetch_all(&self) -> Result<Vec<Contact>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pid, first_name, last_name, phone, gender
             FROM contacts ORDER BY last_name, first_name, pid",
        )?;

        let mut contacts = stmt
            .query_map([], row_to_contact)?
            .collect::<Result<Vec<_>, _>>()?;

        for contact in &mut contacts {
            contact.addresses = self.fetch_addresses(&contact.pid)?;
        }

        Ok(contacts)
    }

    /// Fetches the contacts matching a sequence of identities (same order
    /// guarantees as `fetch_all`)
    pub fn fetch_by_pids(&self, pids: &[Pid]) -> Result<Vec<Contact>, StoreError> {
        if pids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; pids.len()].join(", ");
        let sql = format!(
            "SELECT pid, first_name, last_name, phone, gender
             FROM contacts WHERE pid IN ({})
             ORDER BY last_name, first_name, pid",
            placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut contacts = stmt
            .query_map(
                params_from_iter(pids.iter().map(|p| p.to_string())),
                row_to_contact,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        for contact in &mut contacts {
            contact.addresses = self.fetch_addresses(&contact.pid)?;
        }

        Ok(contacts)
    }

    /// Executes a translated search query and returns the matching
    /// contacts with their full address sequences
    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Contact>, StoreError> {
        let column = query.field.column();

        // Both arms are case-insensitive: `COLLATE NOCASE` for exact
        // matches, and SQLite's default ASCII-insensitive LIKE for
        // patterns.
        let (sql, term) = match (&query.matcher, query.field.target()) {
            (Matcher::Exact(term), FieldTarget::Contact) => (
                format!("SELECT pid FROM contacts WHERE {} = ?1 COLLATE NOCASE", column),
                term,
            ),
            (Matcher::Like(pattern), FieldTarget::Contact) => (
                format!(
                    "SELECT pid FROM contacts WHERE {} LIKE ?1 ESCAPE '\\'",
                    column
                ),
                pattern,
            ),
            (Matcher::Exact(term), FieldTarget::Address) => (
                format!(
                    "SELECT DISTINCT contact_pid FROM addresses WHERE {} = ?1 COLLATE NOCASE",
                    column
                ),
                term,
            ),
            (Matcher::Like(pattern), FieldTarget::Address) => (
                format!(
                    "SELECT DISTINCT contact_pid FROM addresses WHERE {} LIKE ?1 ESCAPE '\\'",
                    column
                ),
                pattern,
            ),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let pids = stmt
            .query_map(params![term], |row| {
                let raw: String = row.get(0)?;
                raw.parse::<Pid>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        self.fetch_by_pids(&pids)
    }

    /// Number of contacts currently in the store
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM contacts", [], |row| row.get(0))?;

        Ok(count as usize)
    }

    /// Removes every contact and address row (lookup tables are untouched)
    pub fn clear(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM addresses", [])?;
        tx.execute("DELETE FROM contacts", [])?;
        tx.commit()?;
        Ok(())
    }

    fn fetch_addresses(&self, contact_pid: &Pid) -> Result<Vec<Address>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pid, contact_pid, street, house_num, city, zip, state, country
             FROM addresses WHERE contact_pid = ?1 ORDER BY position",
        )?;

        let addresses = stmt
            .query_map(params![contact_pid.to_string()], row_to_address)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(addresses)
    }
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_contact(row: &rusqlite::Row) -> rusqlite::Result<Contact> {
    let pid: String = row.get(0)?;
    let gender: u8 = row.get(4)?;

    Ok(Contact {
        pid: pid.parse().map_err(|e| conversion_error(0, e))?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        phone: row.get(3)?,
        gender: Gender::try_from(gender).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Integer,
                e.into(),
            )
        })?,
        addresses: Vec::new(),
    })
}

fn row_to_address(row: &rusqlite::Row) -> rusqlite::Result<Address> {
    let pid: String = row.get(0)?;
    let contact_pid: String = row.get(1)?;
    let state: String = row.get(6)?;
    let country: String = row.get(7)?;

    Ok(Address {
        pid: pid.parse().map_err(|e| conversion_error(0, e))?,
        contact_pid: contact_pid.parse().map_err(|e| conversion_error(1, e))?,
        street: row.get(2)?,
        house_num: row.get(3)?,
        city: row.get(4)?,
        zip: row.get(5)?,
        state: state.parse().map_err(|e| conversion_error(6, e))?,
        country: country.parse().map_err(|e| conversion_error(7, e))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchField;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, ContactStore) {
        let dir = TempDir::new().unwrap();
        let store = ContactStore::open(&dir.path().join("directory.db")).unwrap();
        (dir, store)
    }

    fn sample_contact(first: &str, last: &str, zip: &str) -> Contact {
        Contact::new(first, last, "555-0123", Gender::Male).with_address(
            "Main Street",
            "123",
            "New City",
            zip,
            Country::UnitedStates,
            State::NY,
        )
    }

    #[test]
    fn store_creation() {
        let (_dir, store) = open_store();
        assert!(store.path().exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn lookup_tables_are_seeded() {
        let (_dir, store) = open_store();

        let countries: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM countries", [], |row| row.get(0))
            .unwrap();
        let states: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM states", [], |row| row.get(0))
            .unwrap();

        assert_eq!(countries as usize, Country::all().len());
        assert_eq!(states as usize, State::all().len());
    }

    #[test]
    fn insert_and_fetch_roundtrip() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");

        store.insert_contact(&contact).unwrap();

        let fetched = store.fetch_contact(&contact.pid).unwrap().unwrap();
        assert_eq!(fetched, contact); // deep equality, addresses included
    }

    #[test]
    fn exists_check() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");

        assert!(!store.contact_exists(&contact.pid).unwrap());
        store.insert_contact(&contact).unwrap();
        assert!(store.contact_exists(&contact.pid).unwrap());
    }

    #[test]
    fn delete_removes_contact_and_addresses() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");
        store.insert_contact(&contact).unwrap();

        assert!(store.delete_contact(&contact.pid).unwrap());
        assert_eq!(store.count().unwrap(), 0);

        let orphans: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM addresses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn delete_missing_contact_returns_false() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");

        assert!(!store.delete_contact(&contact.pid).unwrap());
    }

    #[test]
    fn replace_swaps_the_whole_graph() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");
        store.insert_contact(&contact).unwrap();

        let mut updated = contact.clone();
        updated.first_name = "Jane".to_string();
        updated.addresses[0].city = "Old City".to_string();

        assert!(store.replace_contact(&updated).unwrap());

        let fetched = store.fetch_contact(&contact.pid).unwrap().unwrap();
        assert_eq!(fetched, updated);
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn replace_missing_contact_returns_false() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");

        assert!(!store.replace_contact(&contact).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn fetch_all_orders_by_name() {
        let (_dir, mut store) = open_store();
        store
            .insert_contact(&sample_contact("Zoe", "Young", "11111"))
            .unwrap();
        store
            .insert_contact(&sample_contact("Adam", "Abbott", "22222"))
            .unwrap();

        let all = store.fetch_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].last_name, "Abbott");
        assert_eq!(all[1].last_name, "Young");
    }

    #[test]
    fn search_exact_contact_column() {
        let (_dir, mut store) = open_store();
        store
            .insert_contact(&sample_contact("John", "Smith", "12345"))
            .unwrap();
        store
            .insert_contact(&sample_contact("Johnny", "Smith", "12345"))
            .unwrap();

        let query = SearchQuery::translate(SearchField::FirstName, "John");
        let results = store.search(&query).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first_name, "John");
    }

    #[test]
    fn search_exact_is_case_insensitive() {
        let (_dir, mut store) = open_store();
        store
            .insert_contact(&sample_contact("John", "Smith", "12345"))
            .unwrap();

        let query = SearchQuery::translate(SearchField::FirstName, "john");
        assert_eq!(store.search(&query).unwrap().len(), 1);
    }

    #[test]
    fn search_wildcard_address_column() {
        let (_dir, mut store) = open_store();
        store
            .insert_contact(&sample_contact("John", "Smith", "12345"))
            .unwrap();
        store
            .insert_contact(&sample_contact("Jane", "Doe", "12399"))
            .unwrap();
        store
            .insert_contact(&sample_contact("Jim", "Beam", "99999"))
            .unwrap();

        let query = SearchQuery::translate(SearchField::Zip, "123*");
        let results = store.search(&query).unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.addresses[0].zip.starts_with("123")));
    }

    #[test]
    fn clear_empties_both_tables() {
        let (_dir, mut store) = open_store();
        store
            .insert_contact(&sample_contact("John", "Smith", "12345"))
            .unwrap();

        store.clear().unwrap();

        assert_eq!(store.count().unwrap(), 0);
        let addresses: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM addresses", [], |row| row.get(0))
            .unwrap();
        assert_eq!(addresses, 0);
    }

    #[test]
    fn tx_composition_rolls_back_on_drop() {
        let (_dir, mut store) = open_store();
        let contact = sample_contact("John", "Smith", "12345");

        {
            let tx = store.transaction().unwrap();
            ContactStore::insert_contact_tx(&tx, &contact).unwrap();
            // dropped without commit
        }

        assert!(!store.contact_exists(&contact.pid).unwrap());
    }

    #[test]
    fn schema_version() {
        let (_dir, store) = open_store();
        assert_eq!(store.get_schema_version().unwrap(), ContactStore::SCHEMA_VERSION);
    }
}
