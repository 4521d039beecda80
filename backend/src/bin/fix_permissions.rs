#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Grant the connected role the privileges the migrations need.
//!
//! Each grant runs on its own; failures are reported together with the
//! statements a privileged role can run instead.

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};

use recruit_db::cli::{DatabaseUrlArg, init_tracing};
use recruit_db::config::DatabaseSettings;
use recruit_db::domain::{GrantOutcome, PermissionRepairReport, PermissionRepairService};
use recruit_db::outbound::persistence::PostgresAdminRepository;

#[derive(Debug, Parser)]
#[command(
    name = "fix-permissions",
    about = "Grant the connected role privileges on the recruiting schema",
    version
)]
struct CliArgs {
    #[command(flatten)]
    database: DatabaseUrlArg,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = CliArgs::parse();
    let settings = DatabaseSettings::load_settings().wrap_err("load settings")?;
    let config = args
        .database
        .connection()
        .wrap_err_with(|| format!("resolve database URL ({})", DatabaseUrlArg::env_name()))?;
    println!("Database: {}", config.redacted());

    let mut repository = PostgresAdminRepository::connect(config.database_url())
        .and_then(|mut repository| repository.probe().map(|()| repository))
        .wrap_err("cannot connect to the database; check the URL and that the server is running")?;

    let report = PermissionRepairService::new(settings.schema()).repair(&mut repository);
    drop(repository);

    if args.json {
        let rendered = serde_json::to_string_pretty(&report).wrap_err("serialize report")?;
        println!("{rendered}");
    } else {
        print_report(&report);
    }

    match report.failure_summary() {
        None => {
            println!("Permissions fixed. Run `migrate up` to apply the schema.");
            Ok(())
        }
        Some(summary) => Err(eyre!(summary)),
    }
}

fn print_report(report: &PermissionRepairReport) {
    match (&report.identity, &report.identity_error) {
        (Some(identity), _) => println!(
            "Granting privileges on schema {} to role {} in database {}",
            report.schema, identity.role, identity.database
        ),
        (None, Some(error)) => println!("✗ {error}"),
        (None, None) => {}
    }

    for result in &report.results {
        match &result.outcome {
            GrantOutcome::Applied => println!("  ✓ {}", result.statement),
            GrantOutcome::Failed { reason } => {
                println!("  ✗ {}", result.statement);
                println!("      {reason}");
            }
        }
    }

    if let Some(statements) = report.manual_remediation() {
        println!();
        println!("Run these statements as a superuser or the schema owner:");
        for statement in statements {
            println!("  {statement}");
        }
    }
}
