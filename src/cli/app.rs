//! Main CLI application structure

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use crate::directory::{Directory, DirectoryError};
use crate::domain::{Contact, Country, Gender, Pid, State};
use crate::format;
use crate::storage::Config;

#[derive(Parser)]
#[command(name = "rolodex")]
#[command(author, version, about = "Contact directory with a SQLite source of truth")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data root holding the database and snapshot (defaults to the
    /// platform data directory)
    #[arg(long, global = true, env = "ROLODEX_DIR")]
    pub dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the data root (database schema and default config)
    Init,

    /// Add a contact with one address
    Add {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long)]
        phone: String,

        /// Gender lookup index (0 unspecified, 1 female, 2 male, 3 nonbinary)
        #[arg(long, default_value = "0")]
        gender: u8,

        #[arg(long)]
        street: String,

        #[arg(long)]
        house: String,

        #[arg(long)]
        city: String,

        #[arg(long)]
        zip: String,

        /// Country code (e.g. US, CA, DE)
        #[arg(long, default_value = "US")]
        country: String,

        /// State code for US addresses (NA otherwise)
        #[arg(long, default_value = "NA")]
        state: String,
    },

    /// List every contact as a table
    List {
        /// Prepend a 1-based selection column
        #[arg(long)]
        select: bool,
    },

    /// Fetch one contact by id
    Get {
        /// Contact id (c-...)
        pid: String,
    },

    /// Search contacts by field; '*' in the term matches any characters
    Search {
        /// Field: first-name, last-name, phone, zip or city
        field: String,

        /// Term, exact unless it contains '*'
        term: String,
    },

    /// Delete a contact by id
    Delete {
        /// Contact id (c-...)
        pid: String,
    },

    /// Show how many contacts the store holds
    Count,

    /// Manage the flat-file snapshot
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Write the full contact set to the snapshot file
    Save,

    /// Replace the store contents with the snapshot's
    Load,
}

fn data_root(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(root) => Ok(root),
        None => Config::default_root(),
    }
}

fn open_directory(dir: Option<PathBuf>) -> Result<Directory> {
    let root = data_root(dir)?;
    let config = Config::load(&root)?;
    Directory::open(&config.db_path(&root), config.snapshot_path(&root))
}

fn parse_pid(raw: &str) -> Result<Pid> {
    Pid::from_str(raw).with_context(|| format!("'{}' is not a contact id", raw))
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(cli.format, cli.verbose);

    match cli.command {
        Commands::Init => {
            let root = data_root(cli.dir)?;
            let config = Config::load(&root)?;
            config.save(&root)?;

            // Opening creates the schema and seeds the lookup tables
            let directory = open_directory(Some(root.clone()))?;
            output.verbose(&format!("snapshot path: {}", directory.snapshot_path().display()));
            output.success(&format!("Initialized directory at {}", root.display()));
        }

        Commands::Add {
            first,
            last,
            phone,
            gender,
            street,
            house,
            city,
            zip,
            country,
            state,
        } => {
            let gender = Gender::try_from(gender).map_err(anyhow::Error::msg)?;
            let country: Country = country.parse()?;
            let state: State = state.parse()?;

            let contact = Contact::new(first, last, phone, gender)
                .with_address(street, house, city, zip, country, state);

            let mut directory = open_directory(cli.dir)?;
            let pid = directory.add(&contact).map_err(classify)?;

            if pid.is_sentinel() {
                output.success("Contact already exists, nothing added");
            } else if output.is_json() {
                output.data(&serde_json::json!({ "pid": pid.to_string() }));
            } else {
                output.success(&format!("Added contact {}", pid));
            }
        }

        Commands::List { select } => {
            let directory = open_directory(cli.dir)?;
            let contacts = directory.get_all();

            if output.is_json() {
                output.data(&contacts);
            } else {
                output.text(&format::render_table(&contacts, select));
            }
        }

        Commands::Get { pid } => {
            let directory = open_directory(cli.dir)?;
            let contact = directory.require(&parse_pid(&pid)?).map_err(classify)?;

            if output.is_json() {
                output.data(&contact);
            } else {
                output.text(&format::render_one(&contact));
            }
        }

        Commands::Search { field, term } => {
            let directory = open_directory(cli.dir)?;
            let results = directory.search_named(&field, &term).map_err(classify)?;

            output.verbose(&format!("{} match(es)", results.len()));
            if output.is_json() {
                output.data(&results);
            } else {
                output.text(&format::render_table(&results, false));
            }
        }

        Commands::Delete { pid } => {
            let pid = parse_pid(&pid)?;
            let mut directory = open_directory(cli.dir)?;
            let deleted = directory.delete(&pid).map_err(classify)?;

            if !deleted {
                return Err(classify(DirectoryError::NotFound(pid)));
            }
            output.success(&format!("Deleted contact {}", pid));
        }

        Commands::Count => {
            let directory = open_directory(cli.dir)?;
            let count = directory.count();

            if output.is_json() {
                output.data(&serde_json::json!({ "count": count }));
            } else {
                output.success(&count.to_string());
            }
        }

        Commands::Snapshot(cmd) => {
            let mut directory = open_directory(cli.dir)?;
            match cmd {
                SnapshotCommands::Save => {
                    let written = directory.save_snapshot().map_err(classify)?;
                    output.success(&format!(
                        "Saved {} contact(s) to {}",
                        written,
                        directory.snapshot_path().display()
                    ));
                }
                SnapshotCommands::Load => {
                    let loaded = directory.load_snapshot().map_err(classify)?;
                    output.success(&format!("Loaded {} contact(s) from snapshot", loaded));
                }
            }
        }
    }

    Ok(())
}

/// Maps the mediator's error taxonomy onto the client-facing classes the
/// query surface exposes ("bad request" vs "not found" vs plain failure)
fn classify(err: DirectoryError) -> anyhow::Error {
    match &err {
        DirectoryError::InvalidInput(_) | DirectoryError::InvalidSearchField(_) => {
            anyhow::Error::from(err).context("bad request")
        }
        DirectoryError::NotFound(_) => anyhow::Error::from(err).context("not found"),
        _ => anyhow::Error::from(err),
    }
}
