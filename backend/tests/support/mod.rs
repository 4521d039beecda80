//! Helpers shared by the integration test crates.

#![allow(dead_code)]

pub mod cluster;
pub mod cluster_skip;

use postgres::{Client, NoTls};

pub use cluster::{ScratchDatabase, scratch_database};
pub use cluster_skip::{handle_cluster_setup_failure, resolve_cluster_setup_failure};
pub use recruit_db::outbound::persistence::format_postgres_error;

/// Connect a `postgres` client, panicking with the rendered driver error.
pub fn connect(database_url: &str) -> Client {
    Client::connect(database_url, NoTls)
        .unwrap_or_else(|error| panic!("connect: {}", format_postgres_error(&error)))
}

/// Names of the base tables in `schema`.
pub fn table_names(client: &mut Client, schema: &str) -> Vec<String> {
    client
        .query(
            "SELECT tablename::text FROM pg_tables WHERE schemaname = $1 ORDER BY tablename",
            &[&schema],
        )
        .unwrap_or_else(|error| panic!("list tables: {}", format_postgres_error(&error)))
        .into_iter()
        .map(|row| row.get(0))
        .collect()
}

/// Names of the enum types in `schema`.
pub fn enum_names(client: &mut Client, schema: &str) -> Vec<String> {
    client
        .query(
            concat!(
                "SELECT typ.typname::text FROM pg_type typ ",
                "JOIN pg_namespace ns ON ns.oid = typ.typnamespace ",
                "WHERE ns.nspname = $1 AND typ.typtype = 'e' ORDER BY typ.typname"
            ),
            &[&schema],
        )
        .unwrap_or_else(|error| panic!("list enums: {}", format_postgres_error(&error)))
        .into_iter()
        .map(|row| row.get(0))
        .collect()
}

/// SQLSTATE of a failed statement, if the server reported one.
pub fn sqlstate(error: &postgres::Error) -> Option<String> {
    error.code().map(|code| code.code().to_owned())
}
