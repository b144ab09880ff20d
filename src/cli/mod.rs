//! # Command-Line Interface
//!
//! The caller-facing query surface: thin pass-throughs to the directory
//! mediator plus output formatting.
//!
//! All commands support `--format text|json` and `--verbose`; the data
//! root comes from `--dir` (or `ROLODEX_DIR`), defaulting to the platform
//! data directory.
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod output;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
