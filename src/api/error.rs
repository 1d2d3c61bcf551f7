use crate::extraction::ExtractionError;
use crate::negotiation::NegotiationError;
use crate::partition::PartitionError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Detail returned for every internal failure of the content extraction endpoints.
const EXTRACTION_FAILED: &str = "Error processing PDF";

/// Failures surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request cannot be answered in the negotiated media type.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    /// The multipart form could not be read.
    #[error("Malformed multipart form: {detail}")]
    MalformedForm {
        /// Status reported by the multipart reader (400, or 413 past the body limit).
        status: StatusCode,
        /// Reader's description of the failure.
        detail: String,
    },
    /// Partitioning an upload failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// Extracting a stored file's content failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

fn detail(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Negotiation(error) => {
                let status = match error {
                    NegotiationError::MissingFiles => StatusCode::BAD_REQUEST,
                    _ => StatusCode::NOT_ACCEPTABLE,
                };
                (status, error.to_string()).into_response()
            }
            Self::MalformedForm { status, detail: message } => detail(status, message),
            Self::Partition(error) => {
                tracing::error!(error = %error, "Partitioning failed");
                detail(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            Self::Extraction(error) => match error {
                ExtractionError::FileNotFound | ExtractionError::ObjectNotFound => {
                    detail(StatusCode::NOT_FOUND, error.to_string())
                }
                ExtractionError::MissingObjectName => {
                    detail(StatusCode::BAD_REQUEST, error.to_string())
                }
                _ => detail(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    EXTRACTION_FAILED.to_string(),
                ),
            },
        }
    }
}
