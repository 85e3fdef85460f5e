use std::process::ExitCode;

use clap::Parser;
use doxygen_search::index::{LoadError, MalformedIndexError};
use doxygen_search::{Cli, Outcome};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    match doxygen_search::run(cli) {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::NoHits) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// 2 for a malformed index, 3 for anything else.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    let malformed = err.downcast_ref::<MalformedIndexError>().is_some()
        || err
            .downcast_ref::<LoadError>()
            .is_some_and(|e| e.as_malformed().is_some());
    if malformed { 2 } else { 3 }
}
