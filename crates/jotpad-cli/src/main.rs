//! Jotpad CLI - short text notes from the terminal
//!
//! Runs against the offline demo store by default, or the hosted notes API
//! with `--online --user <UID>`.

mod cli;
mod commands;
mod config;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;
use tracing_subscriber::filter::Directive;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{open_workspace, AppOptions};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::list::run_list;
use crate::commands::reset::run_reset;
use crate::commands::search::run_search;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "jotpad=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let options = AppOptions {
        online: cli.online,
        user: cli.user,
        data_dir: cli.data_dir,
        config: cli.config,
    };
    let workspace = open_workspace(&options).await?;

    match cli.command {
        Commands::Add { title, content } => run_add(&workspace, &title, &content).await?,
        Commands::List { limit, json } => run_list(&workspace, limit, json)?,
        Commands::Search { query, limit, json } => run_search(&workspace, &query, limit, json)?,
        Commands::Edit { id, title, content } => {
            run_edit(&workspace, &id, title, content).await?;
        }
        Commands::Delete { id } => run_delete(&workspace, &id).await?,
        Commands::Reset => run_reset(&workspace)?,
        Commands::Watch => run_watch(&workspace).await?,
    }

    Ok(())
}
