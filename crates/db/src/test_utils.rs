//! Test utilities for database operations.
//!
//! Provides a throwaway, fully migrated SQLite database. The SQLite driver
//! is only linked when the `test-utils` feature (or a dev-dependency on
//! `sea-orm/sqlx-sqlite`) is enabled.

use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::migrations::Migrator;

/// A migrated in-memory database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
}

impl TestDatabase {
    /// Connect to a fresh in-memory SQLite database and run all migrations.
    ///
    /// The pool holds a single connection: every `sqlite::memory:`
    /// connection is its own database.
    pub async fn sqlite() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Migrated in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
        })
    }

    /// Shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.conn.clone()
    }
}
