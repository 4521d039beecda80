#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Drop the migration version table so the next `migrate up` starts over.
//!
//! Schema objects are left in place.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

use recruit_db::cli::{DatabaseUrlArg, init_tracing};
use recruit_db::config::DatabaseSettings;
use recruit_db::domain::{MigrationStateResetService, ResetOutcome};
use recruit_db::outbound::persistence::PostgresAdminRepository;

#[derive(Debug, Parser)]
#[command(
    name = "reset-migrations",
    about = "Drop the migration version-tracking table",
    version
)]
struct CliArgs {
    #[command(flatten)]
    database: DatabaseUrlArg,
    /// Version table to drop instead of the configured one.
    #[arg(long, value_name = "name")]
    table: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = CliArgs::parse();
    let settings = DatabaseSettings::load_settings().wrap_err("load settings")?;
    let table = settings.reset_target(args.table.as_deref());
    let config = args
        .database
        .connection()
        .wrap_err_with(|| format!("resolve database URL ({})", DatabaseUrlArg::env_name()))?;
    println!("Database: {}", config.redacted());

    let mut repository =
        PostgresAdminRepository::connect(config.database_url()).wrap_err("connect to database")?;
    let outcome = MigrationStateResetService::new(table)
        .reset(&mut repository)
        .wrap_err("reset migration state")?;

    match outcome {
        ResetOutcome::Dropped => println!("Dropped the version table; migration state cleared."),
        ResetOutcome::AlreadyAbsent => println!("No version table found; nothing to reset."),
    }
    Ok(())
}
