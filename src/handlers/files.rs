use crate::error::AppError;
use crate::utils::validation::{sanitize_filename, validate_mime_type};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use tokio_util::io::{ReaderStream, StreamReader};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Absolute URL the uploaded file can be fetched from
    pub download_link: String,
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    request_body(content = Vec<u8>, content_type = "multipart/form-data", description = "Multipart form with a 'file' field"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file, disallowed type, or oversize"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut stored = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("unnamed").to_string();
        let content_type = field.content_type().map(|s| s.to_string());

        let filename = sanitize_filename(&original_filename)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        // Allow-list check on the declared type, before any bytes land
        let mime_type = validate_mime_type(content_type.as_deref(), &state.config.allowed_mime_types)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        let body_with_io_error = field.map_err(std::io::Error::other);
        let mut reader = StreamReader::new(body_with_io_error);

        let record = state
            .file_service
            .store_upload(&filename, &mime_type, &mut reader)
            .await?;

        stored = Some(record);
        break;
    }

    let record = stored.ok_or_else(|| AppError::BadRequest("No file uploaded.".to_string()))?;

    let response = UploadResponse {
        download_link: state.config.download_link(&record.id),
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/files/download/{id}",
    params(
        ("id" = String, Path, description = "Opaque file identifier")
    ),
    responses(
        (status = 200, description = "File content stream"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Path(file_id): Path<String>,
) -> Result<Response, AppError> {
    let record = state
        .file_service
        .get_for_download(&file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found.".to_string()))?;

    let object = state.storage.open(&record.storage_path).await.map_err(|e| {
        tracing::error!(file_id = %record.id, "Failed to open stored file: {}", e);
        AppError::Internal("Failed to retrieve file".to_string())
    })?;

    // Fire-and-forget accounting: the response does not wait on it and its
    // failure never reaches the client
    let file_service = state.file_service.clone();
    let id = record.id.clone();
    tokio::spawn(async move {
        if let Err(e) = file_service.record_download(&id).await {
            tracing::warn!(file_id = %id, "Failed to update download stats: {}", e);
        }
    });

    let body = Body::from_stream(ReaderStream::new(object.reader));

    let headers = [
        (header::CONTENT_TYPE, record.mime_type.clone()),
        (header::CONTENT_LENGTH, object.size_bytes.to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&record.original_name),
        ),
    ];

    Ok((headers, body).into_response())
}

/// Attachment disposition carrying the original filename: a conservative
/// ASCII fallback plus the RFC 5987 encoded form for everything else.
fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}
