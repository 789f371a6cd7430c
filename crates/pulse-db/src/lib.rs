//! Database layer for the Pulse services.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! and the embedded SQL migrations that create the `events_history` and
//! `connections` tables.
//!
//! Each table is accessed with single-statement, single-key operations only,
//! so the per-statement atomicity SQLite provides is all the coordination
//! the services need.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
