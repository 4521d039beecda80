//! Outbound adapters implementing domain ports against PostgreSQL.
//!
//! Adapters translate between catalog rows or driver errors and domain
//! types. They contain no administration logic of their own.

pub mod persistence;
