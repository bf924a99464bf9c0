// file: src/database/schema.rs
// description: relational schema for repositories, files, tasks and file scores
// reference: https://www.sqlite.org/lang_createtable.html

use crate::database::client::DatabaseClient;
use crate::error::Result;
use tracing::{info, warn};

pub const TABLES: [&str; 4] = ["repositories", "files", "tasks", "file_scores"];

const CREATE_STATEMENTS: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS repositories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS files (
        id TEXT PRIMARY KEY,
        path TEXT NOT NULL,
        repository_id TEXT NOT NULL,
        FOREIGN KEY (repository_id) REFERENCES repositories(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL
            CHECK (category IN ('documentation', 'bugs', 'security', 'performance')),
        priority TEXT NOT NULL CHECK (priority IN ('low', 'medium', 'high')),
        prompt TEXT NOT NULL,
        file_id TEXT NOT NULL,
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS file_scores (
        id TEXT PRIMARY KEY,
        file_id TEXT NOT NULL,
        score_kind TEXT NOT NULL
            CHECK (score_kind IN ('documentation', 'bugs', 'security', 'performance')),
        score REAL NOT NULL CHECK (score >= 0 AND score <= 100),
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_files_repository_id ON files(repository_id)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_file_id ON tasks(file_id)",
    "CREATE INDEX IF NOT EXISTS idx_file_scores_file_id ON file_scores(file_id)",
];

pub struct SchemaManager<'a> {
    client: &'a DatabaseClient,
}

impl<'a> SchemaManager<'a> {
    pub fn new(client: &'a DatabaseClient) -> Self {
        Self { client }
    }

    pub async fn initialize(&self) -> Result<()> {
        info!("Initializing relational schema");

        for statement in CREATE_STATEMENTS {
            sqlx::query(statement).execute(self.client.pool()).await?;
        }

        info!("Schema initialized ({} tables)", TABLES.len());
        Ok(())
    }

    /// Returns the tables that are missing; empty means the schema is complete.
    pub async fn missing_tables(&self) -> Result<Vec<&'static str>> {
        let mut missing = Vec::new();
        for table in TABLES {
            if !self.client.table_exists(table).await? {
                missing.push(table);
            }
        }
        Ok(missing)
    }

    pub async fn verify_schema(&self) -> Result<bool> {
        let missing = self.missing_tables().await?;
        if missing.is_empty() {
            info!("All {} tables present", TABLES.len());
            return Ok(true);
        }

        for table in &missing {
            warn!("Table '{}' does not exist", table);
        }
        Ok(false)
    }

    pub async fn drop_all_tables(&self) -> Result<()> {
        warn!("Dropping all tables");

        // Children first so foreign keys never dangle.
        for table in TABLES.iter().rev() {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(self.client.pool())
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use tempfile::TempDir;

    async fn client(temp: &TempDir) -> DatabaseClient {
        DatabaseClient::new(DatabaseConfig {
            path: temp.path().join("schema.db"),
            max_connections: 1,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let schema = SchemaManager::new(&client);

        assert!(!schema.verify_schema().await.unwrap());
        schema.initialize().await.unwrap();
        schema.initialize().await.unwrap();
        assert!(schema.verify_schema().await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_all_tables() {
        let temp = TempDir::new().unwrap();
        let client = client(&temp).await;
        let schema = SchemaManager::new(&client);

        schema.initialize().await.unwrap();
        schema.drop_all_tables().await.unwrap();

        assert_eq!(schema.missing_tables().await.unwrap(), TABLES.to_vec());
    }
}
