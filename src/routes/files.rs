use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{models::file::RecentFilesQuery, services::files::FileService, AppState};

const MAX_LIMIT: i64 = 100;

pub async fn list_recent(
    State(state): State<AppState>,
    Query(query): Query<RecentFilesQuery>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let limit = query
        .limit
        .unwrap_or(state.config.recent_files_limit)
        .clamp(1, MAX_LIMIT);

    FileService::list_recent(&state.db, limit)
        .await
        .map(|files| Json(json!({ "files": files })))
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match FileService::get(&state.db, id).await {
        Ok(Some(file)) => Ok(Json(serde_json::to_value(file).unwrap_or(Value::Null))),
        Ok(None) => Err((StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}
