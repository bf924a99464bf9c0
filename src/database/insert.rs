// file: src/database/insert.rs
// description: independent inserts and read helpers for analysis records
// reference: https://docs.rs/sqlx/latest/sqlx/fn.query.html

use crate::error::{PipelineError, Result};
use crate::models::{FileRecord, FileScoreRecord, Repository, ScoreKind, TaskRecord};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub repositories: i64,
    pub files: i64,
    pub tasks: i64,
    pub file_scores: i64,
}

/// Cheap to clone; each clone shares the pool and every call checks out its
/// own connection. Inserts autocommit one by one, with no shared transaction.
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_repository(&self, repository: &Repository) -> Result<()> {
        sqlx::query("INSERT INTO repositories (id, name) VALUES (?, ?)")
            .bind(repository.id.to_string())
            .bind(&repository.name)
            .execute(&self.pool)
            .await?;
        debug!("Inserted repository {} ({})", repository.name, repository.id);
        Ok(())
    }

    pub async fn insert_file(&self, file: &FileRecord) -> Result<()> {
        sqlx::query("INSERT INTO files (id, path, repository_id) VALUES (?, ?, ?)")
            .bind(file.id.to_string())
            .bind(&file.path)
            .bind(file.repository_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_score(&self, score: &FileScoreRecord) -> Result<()> {
        sqlx::query("INSERT INTO file_scores (id, file_id, score_kind, score) VALUES (?, ?, ?, ?)")
            .bind(score.id.to_string())
            .bind(score.file_id.to_string())
            .bind(score.kind.as_str())
            .bind(score.score)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_task(&self, task: &TaskRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, category, priority, prompt, file_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.category.as_str())
        .bind(task.priority.as_str())
        .bind(&task.prompt)
        .bind(task.file_id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn counts(&self) -> Result<RecordCounts> {
        Ok(RecordCounts {
            repositories: self.count("repositories").await?,
            files: self.count("files").await?,
            tasks: self.count("tasks").await?,
            file_scores: self.count("file_scores").await?,
        })
    }

    async fn count(&self, table: &'static str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn repository_by_name(&self, name: &str) -> Result<Vec<Repository>> {
        let rows = sqlx::query("SELECT id, name FROM repositories WHERE name = ?")
            .bind(name)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Repository {
                    id: parse_uuid(row, "id")?,
                    name: row.get("name"),
                })
            })
            .collect()
    }

    pub async fn files_for_repository(&self, repository_id: Uuid) -> Result<Vec<FileRecord>> {
        let rows = sqlx::query(
            "SELECT id, path, repository_id FROM files WHERE repository_id = ? ORDER BY path",
        )
        .bind(repository_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FileRecord {
                    id: parse_uuid(row, "id")?,
                    path: row.get("path"),
                    repository_id: parse_uuid(row, "repository_id")?,
                })
            })
            .collect()
    }

    pub async fn tasks_for_file(&self, file_id: Uuid) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, category, priority, prompt, file_id
            FROM tasks WHERE file_id = ?
            "#,
        )
        .bind(file_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TaskRecord {
                    id: parse_uuid(row, "id")?,
                    title: row.get("title"),
                    description: row.get("description"),
                    category: parse_column(row, "category")?,
                    priority: parse_column(row, "priority")?,
                    prompt: row.get("prompt"),
                    file_id: parse_uuid(row, "file_id")?,
                })
            })
            .collect()
    }

    pub async fn scores_for_file(&self, file_id: Uuid) -> Result<Vec<FileScoreRecord>> {
        let rows =
            sqlx::query("SELECT id, file_id, score_kind, score FROM file_scores WHERE file_id = ?")
                .bind(file_id.to_string())
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| {
                Ok(FileScoreRecord {
                    id: parse_uuid(row, "id")?,
                    file_id: parse_uuid(row, "file_id")?,
                    kind: parse_column::<ScoreKind>(row, "score_kind")?,
                    score: row.get("score"),
                })
            })
            .collect()
    }
}

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let raw: String = row.try_get(column)?;
    Uuid::parse_str(&raw).map_err(|e| decode_error(column, e.to_string()))
}

fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| decode_error(column, e))
}

fn decode_error(column: &str, message: String) -> PipelineError {
    PipelineError::Database(sqlx::Error::Decode(
        format!("column {}: {}", column, message).into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::{DatabaseClient, SchemaManager};
    use crate::models::{ReportTask, Score, TaskCategory, TaskPriority};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    async fn store(temp: &TempDir) -> RecordStore {
        let client = DatabaseClient::new(DatabaseConfig {
            path: temp.path().join("records.db"),
            max_connections: 4,
        })
        .await
        .unwrap();
        SchemaManager::new(&client).initialize().await.unwrap();
        RecordStore::new(client.pool().clone())
    }

    fn task() -> ReportTask {
        ReportTask {
            title: "Validate input".to_string(),
            description: "User input reaches the shell unchecked".to_string(),
            category: TaskCategory::Security,
            priority: TaskPriority::High,
            prompt: "Add validation before calling subprocess.run".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_round_trip_through_sqlite() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let repository = Repository::new("octo_app");
        store.insert_repository(&repository).await.unwrap();

        let file = FileRecord::new("src/app.py", repository.id);
        store.insert_file(&file).await.unwrap();

        let record = TaskRecord::from_report(&task(), file.id);
        store.insert_task(&record).await.unwrap();

        let score = FileScoreRecord::new(file.id, ScoreKind::Security, Score::new(35).unwrap());
        store.insert_score(&score).await.unwrap();

        assert_eq!(store.files_for_repository(repository.id).await.unwrap(), vec![file.clone()]);
        assert_eq!(store.tasks_for_file(file.id).await.unwrap(), vec![record]);
        assert_eq!(store.scores_for_file(file.id).await.unwrap(), vec![score]);
        assert_eq!(store.repository_by_name("octo_app").await.unwrap(), vec![repository]);
        assert_eq!(
            store.counts().await.unwrap(),
            RecordCounts {
                repositories: 1,
                files: 1,
                tasks: 1,
                file_scores: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_insert_does_not_affect_siblings() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let repository = Repository::new("octo_app");
        store.insert_repository(&repository).await.unwrap();
        let file = FileRecord::new("src/app.py", repository.id);
        store.insert_file(&file).await.unwrap();

        let first = TaskRecord::from_report(&task(), file.id);
        store.insert_task(&first).await.unwrap();

        // Same primary key again.
        assert!(store.insert_task(&first).await.is_err());

        let second = TaskRecord::from_report(&task(), file.id);
        store.insert_task(&second).await.unwrap();

        assert_eq!(store.tasks_for_file(file.id).await.unwrap().len(), 2);
        assert_eq!(store.counts().await.unwrap().files, 1);
    }

    #[tokio::test]
    async fn test_file_requires_existing_repository() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let orphan = FileRecord::new("a.py", Uuid::new_v4());
        assert!(matches!(
            store.insert_file(&orphan).await,
            Err(PipelineError::Database(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_use_separate_connections() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp).await;

        let repository = Repository::new("octo_app");
        store.insert_repository(&repository).await.unwrap();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                let file = FileRecord::new(format!("src/file_{}.py", i), repository.id);
                tokio::spawn(async move { store.insert_file(&file).await })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.counts().await.unwrap().files, 20);
    }
}
