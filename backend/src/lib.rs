//! Schema store, migrations and administration tooling for the recruiting
//! platform database.

pub mod cli;
pub mod config;
pub mod domain;
pub mod er_snapshots;
pub mod outbound;
