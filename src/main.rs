//! Rolodex CLI - contact directory management

use std::process::ExitCode;

fn main() -> ExitCode {
    // Library logging (degraded reads, search tracing) goes to stderr;
    // filter with RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = rolodex::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
