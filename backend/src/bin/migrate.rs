#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), forbid(clippy::expect_used))]
//! Apply, revert and inspect the recruiting schema migrations.
//!
//! # Examples
//! ```sh
//! cargo run --bin migrate -- --database-url postgres://localhost/recruit up
//! cargo run --bin migrate -- status --json
//! cargo run --bin migrate -- sql --reverse
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::Serialize;

use recruit_db::cli::{DatabaseUrlArg, init_tracing};
use recruit_db::config::{ConnectionConfig, DatabaseSettings};
use recruit_db::domain::schema::initial_schema;
use recruit_db::domain::{
    MigrationStatus, RevisionChain, SchemaAuditReport, SchemaMigrationService, audit_schema,
    registered_migrations,
};
use recruit_db::er_snapshots::{SnapshotRequest, generate_from_definition};
use recruit_db::outbound::persistence::{DieselMigrationRunner, PostgresSchemaSnapshotRepository};

#[derive(Debug, Parser)]
#[command(
    name = "migrate",
    about = "Apply, revert and inspect the recruiting schema migrations",
    version
)]
struct Cli {
    #[command(flatten)]
    database: DatabaseUrlArg,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply every pending revision.
    Up,
    /// Revert the most recently applied revision.
    Down {
        /// Revert every applied revision.
        #[arg(long)]
        all: bool,
    },
    /// Show applied and pending revisions and audit the live schema.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Print migration SQL without connecting.
    Sql {
        /// Print the downgrade script instead.
        #[arg(long)]
        reverse: bool,
    },
    /// Write a Mermaid ER diagram of the schema descriptor.
    Diagram {
        #[arg(long = "output-dir", value_name = "path", default_value = "docs/diagrams/er")]
        output_dir: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct StatusReport {
    migrations: MigrationStatus,
    audit: SchemaAuditReport,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let chain = registered_migrations().wrap_err("registered migrations are invalid")?;

    match cli.command {
        Command::Up => upgrade(&cli.database, &chain),
        Command::Down { all } => downgrade(&cli.database, &chain, all),
        Command::Status { json } => status(&cli.database, &chain, json),
        Command::Sql { reverse } => {
            print_sql(&chain, reverse);
            Ok(())
        }
        Command::Diagram { output_dir } => {
            let artifacts =
                generate_from_definition(&initial_schema(), &SnapshotRequest { output_dir })
                    .wrap_err("write ER diagram")?;
            println!("Wrote Mermaid diagram: {}", artifacts.mermaid_path.display());
            Ok(())
        }
    }
}

fn connect(
    database: &DatabaseUrlArg,
    chain: &RevisionChain,
) -> Result<(ConnectionConfig, DieselMigrationRunner)> {
    let config = database
        .connection()
        .wrap_err_with(|| format!("resolve database URL ({})", DatabaseUrlArg::env_name()))?;
    println!("Database: {}", config.redacted());
    let runner = DieselMigrationRunner::connect(config.database_url(), chain)
        .wrap_err("connect to database")?;
    Ok((config, runner))
}

fn upgrade(database: &DatabaseUrlArg, chain: &RevisionChain) -> Result<()> {
    let (_, mut runner) = connect(database, chain)?;
    let applied = SchemaMigrationService::new(chain)
        .upgrade(&mut runner)
        .wrap_err("apply migrations")?;
    if applied.is_empty() {
        println!("Already up to date.");
    }
    for revision in applied {
        println!("Applied {revision}");
    }
    Ok(())
}

fn downgrade(database: &DatabaseUrlArg, chain: &RevisionChain, all: bool) -> Result<()> {
    let (_, mut runner) = connect(database, chain)?;
    let reverted = SchemaMigrationService::new(chain)
        .downgrade(&mut runner, all)
        .wrap_err("revert migrations")?;
    if reverted.is_empty() {
        println!("Nothing to revert.");
    }
    for revision in reverted {
        println!("Reverted {revision}");
    }
    Ok(())
}

fn status(database: &DatabaseUrlArg, chain: &RevisionChain, json: bool) -> Result<()> {
    let settings = DatabaseSettings::load_settings().wrap_err("load settings")?;
    let (config, mut runner) = connect(database, chain)?;
    let migrations = SchemaMigrationService::new(chain)
        .status(&mut runner)
        .wrap_err("read applied revisions")?;
    drop(runner);

    let repository =
        PostgresSchemaSnapshotRepository::new(config.database_url(), settings.schema());
    let audit = audit_schema(&repository, &initial_schema()).wrap_err("audit live schema")?;
    let report = StatusReport { migrations, audit };

    if json {
        let rendered = serde_json::to_string_pretty(&report).wrap_err("serialize status")?;
        println!("{rendered}");
    } else {
        print_status(&report);
    }

    if report.migrations.unknown.is_empty() {
        Ok(())
    } else {
        Err(eyre!(
            "database records revisions this build does not know: {}",
            report.migrations.unknown.join(", ")
        ))
    }
}

fn print_status(report: &StatusReport) {
    let migrations = &report.migrations;
    println!(
        "Head: {}",
        migrations.head.as_deref().unwrap_or("<no revisions>")
    );
    for revision in &migrations.applied {
        println!("  [applied] {revision}");
    }
    for revision in &migrations.pending {
        println!("  [pending] {revision}");
    }
    for revision in &migrations.unknown {
        println!("  [unknown] {revision}");
    }

    let audit = &report.audit;
    println!(
        "Schema: {} ({}/{} objects present)",
        audit.state, audit.present_objects, audit.expected_objects
    );
    for finding in &audit.findings {
        println!("  - {finding}");
    }
}

fn print_sql(chain: &RevisionChain, reverse: bool) {
    let mut units: Vec<_> = chain.units().iter().collect();
    if reverse {
        units.reverse();
    }
    for unit in units {
        println!("-- {}: {}", unit.revision.id, unit.revision.description);
        if reverse {
            print!("{}", unit.downgrade_sql());
        } else {
            print!("{}", unit.upgrade_sql());
        }
        println!();
    }
}
