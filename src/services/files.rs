use sqlx::PgPool;
use uuid::Uuid;

use crate::db::PersistenceError;
use crate::models::file::FileRecord;

const FILE_COLS: &str = "id, filename, size_bytes, uploaded_at";

pub struct FileService;

impl FileService {
    /// Persists one accepted upload and returns the stored row.
    pub async fn save(
        pool: &PgPool,
        filename: &str,
        size_bytes: i64,
    ) -> Result<FileRecord, PersistenceError> {
        let record = sqlx::query_as(&format!(
            "INSERT INTO files (id, filename, size_bytes)
             VALUES ($1, $2, $3)
             RETURNING {FILE_COLS}"
        ))
        .bind(Uuid::new_v4())
        .bind(filename)
        .bind(size_bytes)
        .fetch_one(pool)
        .await?;
        Ok(record)
    }

    /// Most recent files first, at most `limit`.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
    ) -> Result<Vec<FileRecord>, PersistenceError> {
        let records = sqlx::query_as(&format!(
            "SELECT {FILE_COLS} FROM files ORDER BY uploaded_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(records)
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<FileRecord>, PersistenceError> {
        let record = sqlx::query_as(&format!("SELECT {FILE_COLS} FROM files WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(record)
    }
}
