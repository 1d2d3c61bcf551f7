//! Element, payload, and error types exchanged with the partitioning backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

/// One unit of structured document content (a title, a paragraph, a table, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Element category reported by the partitioner (`Title`, `NarrativeText`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<String>,
    /// Stable identifier assigned by the partitioner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Extracted text.
    #[serde(default)]
    pub text: String,
    /// Free-form metadata; always carries `filename` once returned to clients.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Element {
    /// Build an element carrying only text, mostly useful for tests and adapters.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            element_type: None,
            element_id: None,
            text: text.into(),
            metadata: Map::new(),
        }
    }

    /// Overwrite the `filename` metadata entry.
    pub fn set_filename(&mut self, filename: &str) {
        self.metadata
            .insert("filename".into(), Value::String(filename.to_string()));
    }

    /// Current `filename` metadata entry, if any.
    pub fn filename(&self) -> Option<&str> {
        self.metadata.get("filename").and_then(Value::as_str)
    }
}

/// Result of partitioning a single file.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Ordered element list, rendered to clients as an ISD JSON array.
    Elements(Vec<Element>),
    /// Pre-rendered text such as CSV.
    Text(String),
}

impl Payload {
    /// Short label for the payload shape, used in media-type conflict messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Elements(_) => "elements",
            Self::Text(_) => "text",
        }
    }

    /// Concatenate element texts without a separator; text payloads are returned untouched.
    pub fn into_text(self) -> String {
        match self {
            Self::Elements(elements) => elements.into_iter().map(|element| element.text).collect(),
            Self::Text(text) => text,
        }
    }

    /// Serialize the payload into a single document: JSON for elements, verbatim for text.
    pub fn into_document(self) -> Result<String, serde_json::Error> {
        match self {
            Self::Elements(elements) => serde_json::to_string(&elements),
            Self::Text(text) => Ok(text),
        }
    }
}

/// Parameters for a single partitioning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRequest {
    /// Seekable, named file on local disk.
    pub path: PathBuf,
    /// Optional MIME type hint; the backend sniffs the file when absent.
    pub content_type: Option<String>,
    /// Optional output format requested from the backend (`application/json`, `text/csv`).
    pub output_format: Option<String>,
    /// Optional cap on the number of characters per element.
    pub max_characters: Option<usize>,
}

impl PartitionRequest {
    /// Start a request for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
            output_format: None,
            max_characters: None,
        }
    }

    /// Attach a content type hint.
    pub fn with_content_type(mut self, content_type: Option<&str>) -> Self {
        self.content_type = content_type.map(str::to_string);
        self
    }

    /// Ask the backend for a specific output format.
    pub fn with_output_format(mut self, output_format: Option<&str>) -> Self {
        self.output_format = output_format.map(str::to_string);
        self
    }

    /// Cap the size of each produced element.
    pub fn with_max_characters(mut self, max_characters: Option<usize>) -> Self {
        self.max_characters = max_characters;
        self
    }
}

/// Errors raised while partitioning a document.
#[derive(Debug, Error)]
pub enum PartitionError {
    /// Partition endpoint failed to parse.
    #[error("Invalid partition API URL: {0}")]
    InvalidUrl(String),
    /// Staging the upload on local disk failed.
    #[error("Failed to stage document: {0}")]
    Io(#[from] std::io::Error),
    /// HTTP layer failed before a response was received.
    #[error("Partition request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Partition backend answered with a non-success status.
    #[error("Unexpected partition response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the backend.
        status: reqwest::StatusCode,
        /// Body associated with the failing response.
        body: String,
    },
    /// Element JSON could not be decoded or encoded.
    #[error("Invalid element payload: {0}")]
    Json(#[from] serde_json::Error),
}
