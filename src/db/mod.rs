//! Storage collaborator: connection setup, migrations, and typed query functions.
//!
//! Query functions are generic over [`sqlx::SqliteExecutor`] so callers can run them
//! against the pool or inside a transaction.

pub mod tasks;
pub mod users;

use std::str::FromStr;

use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Opens a pool, creating the database file if it does not exist.
///
/// An in-memory URL (`sqlite::memory:`) gives every connection its own database,
/// so callers using one should pass `max_connections = 1`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
