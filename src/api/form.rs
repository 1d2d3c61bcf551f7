//! Typed view of the partition endpoint's multipart form.

use crate::api::ApiError;
use crate::partition::Upload;
use axum::extract::{Multipart, multipart::MultipartError};

const FILES_FIELD: &str = "files";
const OUTPUT_FORMAT_FIELD: &str = "output_format";

fn malformed(error: MultipartError) -> ApiError {
    ApiError::MalformedForm {
        status: error.status(),
        detail: error.body_text(),
    }
}

/// Strip the `[]` suffix some clients append to repeated field names.
pub fn normalize_field_name(name: &str) -> &str {
    name.strip_suffix("[]").unwrap_or(name)
}

/// Fields of a `POST /general/v0.0.4/general` form.
#[derive(Debug, Default)]
pub struct GeneralForm {
    /// File parts in submission order.
    pub files: Vec<Upload>,
    /// Requested output format; the first non-empty value wins.
    pub output_format: Option<String>,
}

impl GeneralForm {
    /// Read every field of `multipart`. Fields other than `files` and `output_format` are
    /// drained and ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field
                .name()
                .map(normalize_field_name)
                .unwrap_or_default()
                .to_string();
            match name.as_str() {
                FILES_FIELD => {
                    let filename = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(malformed)?;
                    form.files.push(Upload::new(filename, data));
                }
                OUTPUT_FORMAT_FIELD => {
                    let value = field.text().await.map_err(malformed)?;
                    let value = value.trim();
                    if form.output_format.is_none() && !value.is_empty() {
                        form.output_format = Some(value.to_string());
                    }
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown form field");
                }
            }
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_suffix_is_stripped_once() {
        assert_eq!(normalize_field_name("files[]"), "files");
        assert_eq!(normalize_field_name("files"), "files");
        assert_eq!(normalize_field_name("output_format[]"), "output_format");
        assert_eq!(normalize_field_name("odd[][]"), "odd[]");
    }
}
