//! nvram-tweak CLI
//!
//! Edits options and values in AMISCE Setup Question dumps.

mod cli;
mod commands;
mod error;
mod interactive;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use commands::EditArgs;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config = commands::load_config(cli.config.as_deref())?;
    tracing::debug!(?config, "Resolved config");

    match cli.command {
        Commands::Edit {
            file,
            query,
            value,
            mode,
            select,
            all,
            dry_run,
            yes,
            diff,
            crc,
            force_unsafe_crc,
        } => {
            let args = EditArgs {
                file,
                query,
                value,
                mode,
                select,
                all,
                dry_run,
                yes,
                diff,
                crc: crc.into(),
                force_unsafe_crc,
            };
            commands::run_edit(&args, config)
        }
        Commands::List {
            file,
            query,
            select,
            json,
        } => commands::run_list(&file, query.as_deref(), &select, json, &config),
        Commands::Restore { file } => commands::run_restore(&file, &config),
    }
}
