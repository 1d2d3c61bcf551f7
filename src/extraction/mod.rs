//! Content extraction for files kept in object storage.

pub mod mime;
pub mod pdf;
mod service;

pub use mime::guess_content_type;
pub use pdf::{PdfExtractError, PdfExtractText, PdfTextExtractor};
pub use service::{ContentExtractor, ExtractedContent, ExtractionError};
