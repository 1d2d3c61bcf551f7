use crate::api::{ApiError, AppState};
use crate::extraction::{ExtractedContent, ExtractionError};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

/// Request body for `POST /pdf`.
#[derive(Deserialize)]
pub(super) struct FileIdRequest {
    file_id: String,
}

/// Success response for `POST /pdf`.
#[derive(Serialize)]
pub(super) struct FileContentResponse {
    content: String,
    file_id: String,
    file_name: String,
    object_name: String,
}

impl From<ExtractedContent> for FileContentResponse {
    fn from(extracted: ExtractedContent) -> Self {
        Self {
            content: extracted.content,
            file_id: extracted.file_id,
            file_name: extracted.file_name,
            object_name: extracted.object_name,
        }
    }
}

/// Request body for `POST /pdf/extract-pdf-content`.
#[derive(Deserialize)]
pub(super) struct LegacyFileIdRequest {
    #[serde(rename = "fileId")]
    file_id: String,
}

/// Success response for `POST /pdf/extract-pdf-content`.
#[derive(Serialize)]
pub(super) struct LegacyFileContentResponse {
    content: String,
}

async fn extract(state: &AppState, file_id: &str) -> Result<ExtractedContent, ExtractionError> {
    let result = state.extractor.extract(file_id).await;
    match &result {
        Ok(extracted) => tracing::info!(
            file_id,
            file_name = %extracted.file_name,
            characters = extracted.content.len(),
            "Extract request completed"
        ),
        Err(error) if error.is_internal() => {
            tracing::error!(file_id, error = %error, "Error processing file content")
        }
        Err(error) => tracing::warn!(file_id, error = %error, "Extract request rejected"),
    }
    result
}

/// Extract the text of a stored file.
pub(super) async fn extract_file_content(
    State(state): State<AppState>,
    Json(request): Json<FileIdRequest>,
) -> Result<Json<FileContentResponse>, ApiError> {
    let extracted = extract(&state, &request.file_id).await?;
    Ok(Json(extracted.into()))
}

/// Extract the text of a stored file, answering in the older response shape.
pub(super) async fn extract_file_content_legacy(
    State(state): State<AppState>,
    Json(request): Json<LegacyFileIdRequest>,
) -> Result<Json<LegacyFileContentResponse>, ApiError> {
    let extracted = extract(&state, &request.file_id).await?;
    Ok(Json(LegacyFileContentResponse {
        content: extracted.content,
    }))
}
