use crate::api::{ApiError, AppState, GeneralForm};
use crate::multipart::{MultipartMixed, PartBody};
use crate::negotiation::{APPLICATION_JSON, ResponsePlan, TEXT_CSV, check_single, plan};
use crate::partition::{PartitionError, Payload, partition_upload, partition_uploads};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::StreamExt;

/// Output format forwarded to the partitioner; only formats it can render are passed on.
fn requested_format(media_type: &str) -> Option<&str> {
    match media_type {
        APPLICATION_JSON | TEXT_CSV => Some(media_type),
        _ => None,
    }
}

fn render_single(payload: Payload) -> Response {
    match payload {
        Payload::Elements(elements) => Json(elements).into_response(),
        Payload::Text(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TEXT_CSV)],
            text,
        )
            .into_response(),
    }
}

fn into_document(payload: Result<Payload, PartitionError>) -> Result<String, PartitionError> {
    let document = payload.and_then(|payload| Ok(payload.into_document()?));
    if let Err(error) = &document {
        tracing::error!(error = %error, "Partitioning failed mid-stream");
    }
    document
}

/// Partition the uploaded files and shape the response per `Accept` and file count.
pub(super) async fn partition_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Option<Multipart>,
) -> Result<Response, ApiError> {
    let form = match multipart {
        Some(multipart) => GeneralForm::from_multipart(multipart).await?,
        None => GeneralForm::default(),
    };
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());

    let response_plan = plan(accept, form.output_format.as_deref(), form.files.len())?;
    tracing::info!(
        files = form.files.len(),
        media_type = response_plan.media_type(),
        "Partition request accepted"
    );

    match response_plan {
        ResponsePlan::Single { media_type } => {
            let upload = &form.files[0];
            let payload = partition_upload(
                state.partitioner.as_ref(),
                upload,
                requested_format(&media_type),
            )
            .await?;
            check_single(&media_type, &payload)?;
            Ok(render_single(payload))
        }
        ResponsePlan::Multipart { media_type } => {
            let output_format = requested_format(&media_type).map(str::to_string);
            let parts = partition_uploads(state.partitioner.clone(), form.files, output_format)
                .map(|payload| into_document(payload).map(PartBody::Text));
            Ok(MultipartMixed::new(Some(media_type)).into_response(parts))
        }
        ResponsePlan::Sequence { media_type } => {
            let output_format = requested_format(&media_type).map(str::to_string);
            let documents = partition_uploads(state.partitioner.clone(), form.files, output_format)
                .map(|payload| into_document(payload).map(|document| Bytes::from(document + "\n")));
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, media_type)],
                Body::from_stream(documents),
            )
                .into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_renderable_formats_are_forwarded() {
        assert_eq!(requested_format(APPLICATION_JSON), Some(APPLICATION_JSON));
        assert_eq!(requested_format(TEXT_CSV), Some(TEXT_CSV));
        assert_eq!(requested_format("*/*"), None);
        assert_eq!(requested_format("text/html"), None);
    }
}
