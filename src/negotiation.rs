//! Response negotiation for the partition endpoint.
//!
//! The effective media type comes from the `Accept` header, falling back to the
//! `output_format` form field (and then JSON) when the client accepts anything or asks for
//! `multipart/mixed`. The file count then decides between a single payload, a
//! `multipart/mixed` stream, or a lazy sequence of documents.

use crate::partition::Payload;
use thiserror::Error;

/// `application/json`.
pub const APPLICATION_JSON: &str = "application/json";
/// `text/csv`.
pub const TEXT_CSV: &str = "text/csv";
/// Wildcard media range.
pub const ANY: &str = "*/*";
/// `multipart/mixed`.
pub const MULTIPART_MIXED: &str = "multipart/mixed";

const SINGLE_FILE_MEDIA_TYPES: [&str; 3] = [APPLICATION_JSON, TEXT_CSV, ANY];
const MULTI_FILE_ACCEPT: [&str; 3] = [ANY, MULTIPART_MIXED, APPLICATION_JSON];

/// Client-input failures detected while negotiating the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NegotiationError {
    /// No file parts were submitted.
    #[error("Request parameter \"files\" is required.\n")]
    MissingFiles,
    /// Several files were submitted with an `Accept` value that cannot carry them.
    #[error("Conflict in media type {media_type} with response type \"multipart/mixed\".\n")]
    MultipartConflict {
        /// Offending `Accept` value.
        media_type: String,
    },
    /// The produced payload cannot be rendered as the negotiated media type.
    #[error("Conflict in media type {media_type} with response type {shape}.\n")]
    ShapeConflict {
        /// Negotiated media type.
        media_type: String,
        /// Shape of the produced payload.
        shape: &'static str,
    },
    /// The negotiated media type is not one the endpoint can produce.
    #[error("Unsupported media type {media_type}.\n")]
    Unsupported {
        /// Negotiated media type.
        media_type: String,
    },
}

/// How the response for a request will be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePlan {
    /// Exactly one file; its payload is returned directly.
    Single {
        /// Effective media type.
        media_type: String,
    },
    /// Several files framed as `multipart/mixed` parts.
    Multipart {
        /// Effective media type, repeated as each part's `Content-Type`.
        media_type: String,
    },
    /// Several files emitted as consecutive documents.
    Sequence {
        /// Effective media type.
        media_type: String,
    },
}

impl ResponsePlan {
    /// Effective media type shared by all plans.
    pub fn media_type(&self) -> &str {
        match self {
            Self::Single { media_type }
            | Self::Multipart { media_type }
            | Self::Sequence { media_type } => media_type,
        }
    }
}

fn accept_value(accept: Option<&str>) -> Option<&str> {
    accept.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolve the media type the response will be rendered as.
pub fn effective_media_type(accept: Option<&str>, output_format: Option<&str>) -> String {
    match accept_value(accept) {
        None | Some(ANY) | Some(MULTIPART_MIXED) => output_format
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(APPLICATION_JSON)
            .to_string(),
        Some(other) => other.to_string(),
    }
}

/// Choose the response shape before any file is processed.
pub fn plan(
    accept: Option<&str>,
    output_format: Option<&str>,
    file_count: usize,
) -> Result<ResponsePlan, NegotiationError> {
    let media_type = effective_media_type(accept, output_format);
    let accept = accept_value(accept);

    match file_count {
        0 => Err(NegotiationError::MissingFiles),
        1 => Ok(ResponsePlan::Single { media_type }),
        _ => match accept {
            Some(value) if !MULTI_FILE_ACCEPT.contains(&value) => {
                Err(NegotiationError::MultipartConflict {
                    media_type: value.to_string(),
                })
            }
            Some(MULTIPART_MIXED) => Ok(ResponsePlan::Multipart { media_type }),
            _ => Ok(ResponsePlan::Sequence { media_type }),
        },
    }
}

/// Validate a single-file payload against the negotiated media type.
///
/// JSON needs an element list and CSV needs text; any other media type outside
/// `application/json`, `text/csv`, and `*/*` is rejected.
pub fn check_single(media_type: &str, payload: &Payload) -> Result<(), NegotiationError> {
    let mismatched = match media_type {
        APPLICATION_JSON => !matches!(payload, Payload::Elements(_)),
        TEXT_CSV => !matches!(payload, Payload::Text(_)),
        _ => false,
    };
    if mismatched {
        return Err(NegotiationError::ShapeConflict {
            media_type: media_type.to_string(),
            shape: payload.shape(),
        });
    }
    if !SINGLE_FILE_MEDIA_TYPES.contains(&media_type) {
        return Err(NegotiationError::Unsupported {
            media_type: media_type.to_string(),
        });
    }
    Ok(())
}
