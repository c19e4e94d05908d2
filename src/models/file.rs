use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One accepted upload, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub filename: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Ingestion request body. Both fields are optional; missing values are
/// synthesized from the current timestamp by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RecentFilesQuery {
    pub limit: Option<i64>,
}
