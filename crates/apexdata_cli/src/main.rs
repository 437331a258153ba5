//! ApexData command-line entry point.
//!
//! Prints one JSON envelope per invocation and exits `0` for 2xx outcomes,
//! `1` otherwise.

mod commands;

use anyhow::{Context, Result};
use apexdata_core::{init_from_config, open_db, CoreConfig};
use clap::Parser;
use commands::{Command, Reply};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "apexdata")]
#[command(version)]
#[command(about = "Formula 1 historical data store", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "APEXDATA_DB_PATH")]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true, env = "APEXDATA_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "APEXDATA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(reply) => match serde_json::to_string_pretty(&reply.body) {
            Ok(text) => {
                println!("{text}");
                if reply.is_success() {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(err) => {
                eprintln!("error: failed to print response: {err}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Reply> {
    let mut config = CoreConfig::from_env().context("failed to load configuration")?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(dir) = cli.log_dir {
        config.log_dir = Some(dir);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_from_config(&config).context("failed to initialize logging")?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;

    let name = cli.command.name();
    let reply = commands::execute(&conn, &config, cli.command);
    info!(
        "event=cli_command module=cli status={} command={name} code={}",
        if reply.is_success() { "ok" } else { "error" },
        reply.status
    );
    Ok(reply)
}
