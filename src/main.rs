//! Bugledger - local-first defect ledger
//!
//! Ingests spreadsheets of reported defects into a local store, rotates the
//! weekly record sets on each upload, and exports an open-defect summary.

use anyhow::Result;
use bugledger::cli::{self, Cli, Commands};
use bugledger::config::resolve_data_dir;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let data_dir = resolve_data_dir(cli.data_dir.as_deref());

    // Execute command
    match cli.command {
        Commands::Import(args) => {
            cli::import(&data_dir, &args.file, cli.format)?;
        }

        Commands::Export(args) => {
            cli::export(&data_dir, args.output.as_deref())?;
        }

        Commands::List(args) => {
            cli::list(
                &data_dir,
                args.week,
                args.owner.as_deref(),
                args.open,
                cli.format,
            )?;
        }

        Commands::Show(args) => {
            cli::show(&data_dir, &args.incident_id, cli.format)?;
        }

        Commands::Edit(args) => {
            cli::edit(&data_dir, &args, cli.format)?;
        }

        Commands::Comment(args) => {
            cli::comment(&data_dir, &args.incident_id, &args.text, cli.format)?;
        }

        Commands::Attach(args) => {
            cli::attach(&data_dir, &args.action, cli.format)?;
        }

        Commands::Delete(args) => {
            cli::delete(&data_dir, &args.incident_id, args.yes)?;
        }

        Commands::Clear(args) => {
            cli::clear(&data_dir, args.yes)?;
        }

        Commands::Options(args) => {
            cli::options(
                &data_dir,
                args.field.as_deref(),
                args.add.as_deref(),
                args.remove.as_deref(),
                cli.format,
            )?;
        }

        Commands::Status(args) => {
            cli::status(&data_dir, args.by_owner, cli.format)?;
        }
    }

    Ok(())
}
