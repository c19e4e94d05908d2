use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{models::file::UploadRequest, services::files::FileService, AppState};

/// POST / — ingestion endpoint.
///
/// Fields missing from the body are synthesized from the current timestamp
/// (`file-<millis>` / millis-as-size). The response echoes the newly stored
/// id plus the most recent files.
pub async fn upload_file(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    // An empty body is fine; every field has a synthesized fallback.
    let req: UploadRequest = if body.is_empty() {
        UploadRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid JSON body: {e}") })),
            )
        })?
    };

    let now_ms = Utc::now().timestamp_millis();
    let filename = req.filename.unwrap_or_else(|| format!("file-{now_ms}"));
    let size_bytes = req.size.unwrap_or(now_ms);

    if filename.is_empty() || size_bytes <= 0 {
        return Err(internal_error("Invalid file data"));
    }

    let record = FileService::save(&state.db, &filename, size_bytes)
        .await
        .map_err(|e| internal_error(&e.to_string()))?;

    let recent = FileService::list_recent(&state.db, state.config.recent_files_limit)
        .await
        .map_err(|e| internal_error(&e.to_string()))?;

    Ok(Json(json!({
        "message": "File uploaded successfully",
        "fileId": record.id,
        "recentFiles": recent,
    })))
}

fn internal_error(msg: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": msg })),
    )
}
