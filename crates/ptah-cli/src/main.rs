//! `ptah` -- entry point for the schema-migration CLI.
//!
//! Parses arguments with clap, sets up logging, dispatches to the
//! `migrate` subcommand tree, and translates the result into one of
//! the three exit codes the spec's CLI surface promises: `0` success,
//! `1` error, `2` nothing to do.

mod cli;
mod commands;
mod config;
mod exit;

use clap::Parser;
use cli::{Cli, MigrateCommand, TopCommand};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.global.verbose { "ptah=debug,ptah_cli=debug" } else { "ptah=info,ptah_cli=info" };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let TopCommand::Migrate(migrate_args) = cli.command;
    let result = match &migrate_args.action {
        MigrateCommand::Up(args) => commands::up::run(args).await,
        MigrateCommand::Down(args) => commands::down::run(args).await,
        MigrateCommand::Status(args) => commands::status::run(args).await,
        MigrateCommand::Drop(args) => commands::drop_cmd::run(args).await,
        MigrateCommand::Reset(args) => commands::reset::run(args).await,
        MigrateCommand::Generate(args) => commands::generate::run(args).await
    };

    match result {
        Ok(outcome) => std::process::exit(outcome.code()),
        Err(err) => {
            eprintln!("error: {err}");
            let is_policy_refusal = err.downcast_ref::<ptah::Error>().is_some_and(ptah::Error::is_policy_refusal);
            if cli.global.verbose && !is_policy_refusal {
                for cause in err.chain().skip(1) {
                    eprintln!("  caused by: {cause}");
                }
            }
            std::process::exit(1);
        }
    }
}
