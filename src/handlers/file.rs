use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::AuthContext;
use crate::models::file::{StoredFileContent, StoredFileInfo};
use crate::state::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Keeps only the last path segment of a client supplied file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if base.is_empty() {
        "upload".to_string()
    } else {
        base.chars().take(255).collect()
    }
}

// POST /files - multipart with a single `file` part
#[instrument(skip_all)]
pub async fn upload_file(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFileInfo>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
        let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }

        let stored = sqlx::query_as::<_, StoredFileInfo>(
            "INSERT INTO file_storage
                (pump_master_id, file_name, content_type, size_bytes, data, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING id, file_name, content_type, size_bytes, created_at",
        )
        .bind(auth.pump_master_id)
        .bind(&file_name)
        .bind(&content_type)
        .bind(data.len() as i64)
        .bind(data.as_ref())
        .bind(auth.user_id)
        .fetch_one(&db_pool)
        .await?;

        info!(file_id = %stored.id, size = stored.size_bytes, "File stored");
        return Ok((StatusCode::CREATED, Json(stored)));
    }

    Err(AppError::validation("Multipart body must contain a 'file' part"))
}

// GET /files/{id} - raw bytes with the stored content type
pub async fn download_file(
    State(AppState { db_pool, .. }): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let file = sqlx::query_as::<_, StoredFileContent>(
        "SELECT file_name, content_type, data FROM file_storage WHERE id = $1 AND pump_master_id = $2",
    )
    .bind(id)
    .bind(auth.pump_master_id)
    .fetch_optional(&db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("File not found"))?;

    let content_type = HeaderValue::from_str(&file.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", file.file_name.replace('"', "")))
        .unwrap_or_else(|_| HeaderValue::from_static("inline"));

    Ok((
        [(header::CONTENT_TYPE, content_type), (header::CONTENT_DISPOSITION, disposition)],
        file.data,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_name;

    #[test]
    fn file_names_lose_their_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\meter\\bill-42.jpg"), "bill-42.jpg");
        assert_eq!(sanitize_file_name("  "), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }
}
