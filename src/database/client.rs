// file: src/database/client.rs
// description: SQLite connection pool with explicit lifetime
// reference: https://docs.rs/sqlx

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

/// Owns the pool. Every statement checks out its own connection, so
/// concurrent writers never share a session.
#[derive(Clone)]
pub struct DatabaseClient {
    pool: SqlitePool,
}

impl DatabaseClient {
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        info!("Opening SQLite database at {}", config.path.display());

        if let Some(parent) = config.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn ping(&self) -> Result<bool> {
        debug!("Checking SQLite connection");
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(one == 1)
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_database_file_and_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/insight.db");

        let client = DatabaseClient::new(DatabaseConfig {
            path: path.clone(),
            max_connections: 2,
        })
        .await
        .unwrap();

        assert!(client.ping().await.unwrap());
        assert!(path.exists());
        assert!(!client.table_exists("repositories").await.unwrap());
        client.close().await;
    }
}
