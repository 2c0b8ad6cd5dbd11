use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Executor, SqlitePool};

/// Schema files applied in order at startup. Embedded so the binary (and the
/// test suite) needs no migrations directory on disk.
const MIGRATIONS: &[&str] = &[include_str!("../../migrations/0001_initial.sql")];

pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for sql in MIGRATIONS {
        pool.execute(*sql).await?;
    }
    Ok(())
}
