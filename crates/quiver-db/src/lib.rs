//! Database layer for quiver: connection pooling, embedded migrations, row
//! models, per-table query functions, and the schema guard that upgrades
//! legacy databases in place.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;
