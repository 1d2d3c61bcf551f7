//! Streaming `multipart/mixed` response writer.
//!
//! Each payload becomes one MIME part:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Length: <encoded length>\r\n
//! Content-Transfer-Encoding: base64\r\n
//! Content-Type: <media type>\r\n
//! \r\n
//! <base64 body>\r\n
//! ```
//!
//! Parts are sent as individual body frames, followed by one empty frame that ends the body.

use axum::{
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::{BufMut, Bytes, BytesMut};
use futures_util::{Stream, StreamExt};

const CRLF: &[u8] = b"\r\n";

/// Body of a single part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Text that is base64-encoded before framing.
    Text(String),
    /// Bytes framed as-is.
    Raw(Bytes),
}

impl From<String> for PartBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Bytes> for PartBody {
    fn from(value: Bytes) -> Self {
        Self::Raw(value)
    }
}

impl PartBody {
    fn into_encoded(self) -> Bytes {
        match self {
            Self::Text(text) => Bytes::from(STANDARD.encode(text.as_bytes())),
            Self::Raw(bytes) => bytes,
        }
    }
}

/// Generate a fresh boundary: 16 random bytes, hex-encoded.
pub fn generate_boundary() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Frames payloads as a `multipart/mixed` body.
#[derive(Debug, Clone)]
pub struct MultipartMixed {
    boundary: String,
    content_type: Option<String>,
}

impl MultipartMixed {
    /// Writer with a random boundary; `content_type` is attached to every part when set.
    pub fn new(content_type: Option<String>) -> Self {
        Self::with_boundary(generate_boundary(), content_type)
    }

    /// Writer with an explicit boundary.
    pub fn with_boundary(boundary: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            boundary: boundary.into(),
            content_type,
        }
    }

    /// Boundary token without the leading dashes.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value of the response `Content-Type` header.
    pub fn header_value(&self) -> String {
        format!("multipart/mixed; boundary=\"{}\"", self.boundary)
    }

    /// Frame one part.
    pub fn build_part(&self, body: PartBody) -> Bytes {
        let encoded = body.into_encoded();

        let mut part = BytesMut::with_capacity(encoded.len() + self.boundary.len() + 128);
        part.put_slice(b"--");
        part.put_slice(self.boundary.as_bytes());
        part.put_slice(CRLF);
        part.put_slice(format!("Content-Length: {}", encoded.len()).as_bytes());
        part.put_slice(CRLF);
        part.put_slice(b"Content-Transfer-Encoding: base64");
        part.put_slice(CRLF);
        if let Some(content_type) = &self.content_type {
            part.put_slice(format!("Content-Type: {content_type}").as_bytes());
            part.put_slice(CRLF);
        }
        part.put_slice(CRLF);
        part.put_slice(&encoded);
        part.put_slice(CRLF);
        part.freeze()
    }

    /// Turn a stream of part bodies into body frames, ending with an empty frame.
    ///
    /// An error from `parts` is forwarded and ends the stream without the closing frame.
    pub fn frames<S, E>(self, parts: S) -> impl Stream<Item = Result<Bytes, E>> + Send + 'static
    where
        S: Stream<Item = Result<PartBody, E>> + Send + 'static,
        E: Send + 'static,
    {
        async_stream::stream! {
            let mut parts = Box::pin(parts);
            let mut count = 0usize;
            while let Some(part) = parts.next().await {
                match part {
                    Ok(body) => {
                        count += 1;
                        yield Ok(self.build_part(body));
                    }
                    Err(error) => {
                        tracing::warn!(parts_sent = count, "Multipart stream aborted");
                        yield Err(error);
                        return;
                    }
                }
            }
            tracing::debug!(parts_sent = count, "Multipart stream complete");
            yield Ok(Bytes::new());
        }
    }

    /// Build a streaming `200 OK` response from part bodies.
    pub fn into_response<S, E>(self, parts: S) -> Response
    where
        S: Stream<Item = Result<PartBody, E>> + Send + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + 'static,
    {
        let content_type = self.header_value();
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type)],
            Body::from_stream(self.frames(parts)),
        )
            .into_response()
    }
}
