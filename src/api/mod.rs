//! HTTP surface for docpipe.
//!
//! - `POST /general/v0.0.4/general` – Partition one or more uploaded files. Multipart form with
//!   repeatable `files` parts (`files[]` is accepted too) and an optional `output_format` field.
//!   Responds with a JSON element array, CSV text, a `multipart/mixed` stream, or a sequence of
//!   per-file documents depending on `Accept` and the number of files.
//! - `POST /pdf` – Extract the text of a stored file given `{"file_id": ...}`.
//! - `POST /pdf/extract-pdf-content` – Older form of `/pdf` taking `{"fileId": ...}` and
//!   returning only the content.
//! - `GET /healthcheck` – Liveness probe.

mod error;
mod files;
mod form;
mod general;

pub use error::ApiError;
pub use form::{GeneralForm, normalize_field_name};

use crate::extraction::ContentExtractor;
use crate::partition::Partitioner;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Path of the partition endpoint.
pub const GENERAL_PATH: &str = "/general/v0.0.4/general";

const HEALTHCHECK_STATUS: &str = "HEALTHCHECK STATUS: EVERYTHING OK!";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) partitioner: Arc<dyn Partitioner>,
    pub(crate) extractor: Arc<ContentExtractor>,
    max_upload_bytes: usize,
}

impl AppState {
    /// Bundle the partitioner, the content extractor, and the request body limit.
    pub fn new(
        partitioner: Arc<dyn Partitioner>,
        extractor: Arc<ContentExtractor>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            partitioner,
            extractor,
            max_upload_bytes,
        }
    }
}

/// Build the HTTP router.
///
/// Every route except `/healthcheck` is wrapped in the access-log layer.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route(GENERAL_PATH, post(general::partition_files))
        .route("/pdf", post(files::extract_file_content))
        .route(
            "/pdf/extract-pdf-content",
            post(files::extract_file_content_legacy),
        )
        .layer(TraceLayer::new_for_http())
        .route("/healthcheck", get(healthcheck))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Response body for `GET /healthcheck`.
#[derive(Serialize)]
struct HealthcheckResponse {
    healthcheck: &'static str,
}

async fn healthcheck() -> Json<HealthcheckResponse> {
    Json(HealthcheckResponse {
        healthcheck: HEALTHCHECK_STATUS,
    })
}
