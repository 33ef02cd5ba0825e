//! Infrastructure adapters for the order engine.
//!
//! In-memory implementations back dev/test wiring; Postgres implementations
//! back production. Both honor the same contracts: read-only catalog lookups
//! and version-checked order updates.

pub mod in_memory;
pub mod postgres;

#[cfg(test)]
mod integration_tests;

pub use in_memory::{InMemoryCatalog, InMemoryOrderStore};
pub use postgres::{PostgresCatalog, PostgresOrderStore};
