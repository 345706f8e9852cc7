//! Scratch PostgreSQL databases for the integration tests in `tests/`.
//!
//! Point them at a server with the `TEST_DB_*` environment variables.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::migrations::Migrator;

/// Connection settings for the scratch server.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Name of the per-test database.
    pub database: String,
}

fn env_or(key: &str, fallback: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| fallback.to_string())
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: env_or("TEST_DB_HOST", "localhost"),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: env_or("TEST_DB_USER", "atelier_test"),
            password: env_or("TEST_DB_PASSWORD", "atelier_test"),
            database: env_or("TEST_DB_NAME", "atelier_test"),
        }
    }
}

impl TestDbConfig {
    fn url_for(&self, database: &str) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{database}",
            self.username, self.password, self.host, self.port
        )
    }

    #[must_use]
    pub fn database_url(&self) -> String {
        self.url_for(&self.database)
    }

    /// Maintenance database used to create and drop per-test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        self.url_for("postgres")
    }
}

/// A migrated database owned by one test.
pub struct TestDatabase {
    conn: Arc<DatabaseConnection>,
    config: TestDbConfig,
}

impl TestDatabase {
    /// Create a freshly named database and run every migration on it.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("atelier_test_{}", &suffix[..8]);

        let admin = Database::connect(&config.postgres_url()).await?;
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Created test database");
        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Shared handle to the pool, in the form repositories take it.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Close the connection and drop the database.
    ///
    /// Handles from [`Self::connection`] should be dropped first; otherwise the
    /// pool is left open and its sessions are terminated server-side.
    pub async fn drop_database(self) -> Result<(), DbErr> {
        let Self { conn, config } = self;
        match Arc::try_unwrap(conn) {
            Ok(conn) => conn.close().await?,
            Err(_) => warn!(database = %config.database, "Test connection still shared"),
        }

        let admin = Database::connect(&config.postgres_url()).await?;
        let terminate = format!(
            "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
            config.database
        );
        if let Err(e) = admin
            .execute(Statement::from_string(DatabaseBackend::Postgres, terminate))
            .await
        {
            warn!(database = %config.database, error = %e, "Failed to terminate test connections");
        }
        admin
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", config.database),
            ))
            .await?;
        admin.close().await?;

        info!(database = %config.database, "Dropped test database");
        Ok(())
    }
}
