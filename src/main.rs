//! kvdn-pillar - KVDN secrets as per-minion pillar data.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kvdn_pillar::cli::output;
use kvdn_pillar::cli::{execute, Cli};
use kvdn_pillar::core::constants;
use kvdn_pillar::error::{ConfigError, Error, StoreError};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env(constants::LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("kvdn_pillar=debug")
        } else {
            EnvFilter::new("kvdn_pillar=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli.command, &cli.settings) {
        let error_msg = e.to_string();
        let suggestion = match &e {
            Error::Config(ConfigError::MissingUrl) => Some("pass --url or set url in the settings file"),
            Error::Config(ConfigError::TokenFile { .. }) => Some("check --token-path or set KVDN_TOKEN"),
            Error::Store(StoreError::Connection(_)) => Some("check that KVDN is reachable at --url"),
            _ => None,
        };

        output::error(&error_msg);
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
