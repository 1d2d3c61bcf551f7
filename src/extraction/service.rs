//! Text extraction for stored files: lookup, download, sniff, extract, clean up.

use crate::{
    database::{FileRepository, RepositoryError},
    extraction::{
        mime::{APPLICATION_PDF, guess_content_type},
        pdf::{PdfExtractError, PdfTextExtractor, extract_pdf_text},
    },
    partition::{PartitionError, PartitionRequest, Partitioner},
    storage::{StorageClient, StorageError},
};
use std::sync::Arc;
use thiserror::Error;

/// Downloads are staged under this suffix regardless of the stored file's type.
const STAGED_SUFFIX: &str = ".pdf";

/// Errors emitted while extracting a stored file's content.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No record matches the identifier.
    #[error("File not found in database")]
    FileNotFound,
    /// The record has no usable storage key.
    #[error("Object name not found in file document")]
    MissingObjectName,
    /// The object could not be downloaded.
    #[error("File not found or error downloading from storage")]
    ObjectNotFound,
    /// The record lookup itself failed.
    #[error("File lookup failed: {0}")]
    Repository(#[from] RepositoryError),
    /// Staging the download on local disk failed.
    #[error("Failed to stage download: {0}")]
    Io(#[from] std::io::Error),
    /// Storage client failed outside of the object fetch.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// PDF text extraction failed.
    #[error(transparent)]
    Pdf(#[from] PdfExtractError),
    /// Partitioning a non-PDF file failed.
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

impl ExtractionError {
    /// Whether the failure stems from the service rather than from the requested file.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            Self::FileNotFound | Self::MissingObjectName | Self::ObjectNotFound
        )
    }
}

/// Extracted text together with the resolved file record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Extracted text.
    pub content: String,
    /// Identifier of the file.
    pub file_id: String,
    /// Original filename.
    pub file_name: String,
    /// Storage key the content was downloaded from.
    pub object_name: String,
}

/// Resolves file identifiers to stored objects and extracts their text.
///
/// PDFs go through the dedicated page extractor; every other type is handed to the
/// partitioner with a content type hint and a per-element character cap.
pub struct ContentExtractor {
    files: Arc<dyn FileRepository>,
    storage: StorageClient,
    pdf: Arc<dyn PdfTextExtractor>,
    partitioner: Arc<dyn Partitioner>,
    max_characters: usize,
}

impl ContentExtractor {
    /// Assemble an extractor from its collaborators.
    pub fn new(
        files: Arc<dyn FileRepository>,
        storage: StorageClient,
        pdf: Arc<dyn PdfTextExtractor>,
        partitioner: Arc<dyn Partitioner>,
        max_characters: usize,
    ) -> Self {
        Self {
            files,
            storage,
            pdf,
            partitioner,
            max_characters,
        }
    }

    /// Extract the text of the file identified by `file_id`.
    pub async fn extract(&self, file_id: &str) -> Result<ExtractedContent, ExtractionError> {
        let document = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or(ExtractionError::FileNotFound)?;
        let object_name = document
            .storage_key()
            .ok_or(ExtractionError::MissingObjectName)?
            .to_string();

        // Removed on drop, so every early return below cleans up too.
        let staged = tempfile::Builder::new().suffix(STAGED_SUFFIX).tempfile()?;
        if !self.storage.download(&object_name, staged.path()).await? {
            return Err(ExtractionError::ObjectNotFound);
        }

        let content_type = guess_content_type(&document.file_name);
        let content = match content_type {
            Some(APPLICATION_PDF) => extract_pdf_text(self.pdf.clone(), staged.path()).await?,
            other => {
                let request = PartitionRequest::new(staged.path())
                    .with_content_type(other)
                    .with_max_characters(Some(self.max_characters));
                self.partitioner.partition(request).await?.into_text()
            }
        };

        if let Err(error) = staged.close() {
            tracing::warn!(file_id, error = %error, "Failed to remove staged download");
        }

        tracing::info!(
            file_id,
            object_name = %object_name,
            content_type = content_type.unwrap_or("unknown"),
            characters = content.chars().count(),
            "File content extracted"
        );

        let file_id = if document.file_id.is_empty() {
            file_id.to_string()
        } else {
            document.file_id
        };
        Ok(ExtractedContent {
            content,
            file_id,
            file_name: document.file_name,
            object_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::FileDocument;
    use crate::partition::{Element, Payload};
    use async_trait::async_trait;
    use object_store::{ObjectStore, PutPayload, memory::InMemory, path::Path as ObjectPath};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct StubFiles(HashMap<String, FileDocument>);

    #[async_trait]
    impl FileRepository for StubFiles {
        async fn find_by_id(&self, file_id: &str) -> Result<Option<FileDocument>, RepositoryError> {
            Ok(self.0.get(file_id).cloned())
        }
    }

    struct StubPdf;

    impl PdfTextExtractor for StubPdf {
        fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<String>, PdfExtractError> {
            let text = String::from_utf8_lossy(pdf);
            Ok(text.split('|').map(str::to_string).collect())
        }
    }

    #[derive(Default)]
    struct StubPartitioner {
        requests: Mutex<Vec<(PartitionRequest, bool)>>,
        fail: bool,
    }

    #[async_trait]
    impl Partitioner for StubPartitioner {
        async fn partition(&self, request: PartitionRequest) -> Result<Payload, PartitionError> {
            let existed = request.path.exists();
            self.requests.lock().unwrap().push((request, existed));
            if self.fail {
                return Err(PartitionError::UnexpectedStatus {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                    body: "backend unavailable".into(),
                });
            }
            Ok(Payload::Elements(vec![
                Element::from_text("Slide one"),
                Element::from_text("Slide two"),
            ]))
        }
    }

    struct BrokenPdf;

    impl PdfTextExtractor for BrokenPdf {
        fn extract_pages(&self, _pdf: &[u8]) -> Result<Vec<String>, PdfExtractError> {
            Err(PdfExtractError::Extract("xref table is corrupt".into()))
        }
    }

    fn record(object_name: Option<&str>, file_name: &str) -> FileDocument {
        FileDocument {
            object_name: object_name.map(str::to_string),
            purpose: None,
            bytes: Some(10),
            file_name: file_name.to_string(),
            file_id: String::new(),
        }
    }

    async fn extractor(
        records: Vec<(&str, FileDocument)>,
        objects: Vec<(&str, &'static [u8])>,
        partitioner: Arc<StubPartitioner>,
    ) -> ContentExtractor {
        let store = InMemory::new();
        for (name, data) in objects {
            store
                .put(&ObjectPath::from(name), PutPayload::from_static(data))
                .await
                .expect("seed");
        }
        let files = records
            .into_iter()
            .map(|(id, document)| (id.to_string(), document))
            .collect();
        ContentExtractor::new(
            Arc::new(StubFiles(files)),
            StorageClient::from_store(Arc::new(store), "bucket"),
            Arc::new(StubPdf),
            partitioner,
            1500,
        )
    }

    #[tokio::test]
    async fn unknown_id_is_file_not_found() {
        let extractor = extractor(vec![], vec![], Arc::default()).await;
        let error = extractor.extract("missing").await.expect_err("not found");
        assert!(matches!(error, ExtractionError::FileNotFound));
        assert!(!error.is_internal());
    }

    #[tokio::test]
    async fn empty_object_name_is_rejected() {
        let extractor =
            extractor(vec![("f1", record(Some(""), "a.pdf"))], vec![], Arc::default()).await;
        let error = extractor.extract("f1").await.expect_err("missing object");
        assert!(matches!(error, ExtractionError::MissingObjectName));
    }

    #[tokio::test]
    async fn failed_download_is_object_not_found() {
        let extractor = extractor(
            vec![("f1", record(Some("gone.pdf"), "a.pdf"))],
            vec![],
            Arc::default(),
        )
        .await;
        let error = extractor.extract("f1").await.expect_err("download");
        assert!(matches!(error, ExtractionError::ObjectNotFound));
        assert_eq!(
            error.to_string(),
            "File not found or error downloading from storage"
        );
    }

    #[tokio::test]
    async fn pdf_pages_are_concatenated() {
        let extractor = extractor(
            vec![("f1", record(Some("tenant/a.pdf"), "Annual Report.pdf"))],
            vec![("tenant/a.pdf", &b"Page one. |Page two.|Page three."[..])],
            Arc::default(),
        )
        .await;

        let extracted = extractor.extract("f1").await.expect("extract");
        assert_eq!(extracted.content, "Page one. Page two.Page three.");
        assert_eq!(extracted.file_id, "f1");
        assert_eq!(extracted.file_name, "Annual Report.pdf");
        assert_eq!(extracted.object_name, "tenant/a.pdf");
    }

    #[tokio::test]
    async fn other_types_are_partitioned_with_hint_and_cap() {
        let partitioner = Arc::new(StubPartitioner::default());
        let mut document = record(Some("tenant/deck.pptx"), "deck.pptx");
        document.file_id = "public-id".into();
        let extractor = extractor(
            vec![("f2", document)],
            vec![("tenant/deck.pptx", &b"pptx bytes"[..])],
            partitioner.clone(),
        )
        .await;

        let extracted = extractor.extract("f2").await.expect("extract");
        assert_eq!(extracted.content, "Slide oneSlide two");
        assert_eq!(extracted.file_id, "public-id");

        let requests = partitioner.requests.lock().unwrap();
        let (request, existed) = &requests[0];
        assert!(*existed);
        assert_eq!(
            request.content_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.presentationml.presentation")
        );
        assert_eq!(request.max_characters, Some(1500));
        assert!(request.path.to_string_lossy().ends_with(".pdf"));
        let staged: PathBuf = request.path.clone();
        assert!(!staged.exists(), "staged download should be removed");
    }

    #[tokio::test]
    async fn staged_download_is_removed_when_partitioning_fails() {
        let partitioner = Arc::new(StubPartitioner {
            fail: true,
            ..Default::default()
        });
        let extractor = extractor(
            vec![("f3", record(Some("tenant/sheet.xlsx"), "sheet.xlsx"))],
            vec![("tenant/sheet.xlsx", &b"xlsx bytes"[..])],
            partitioner.clone(),
        )
        .await;

        let error = extractor.extract("f3").await.expect_err("partition failure");
        assert!(matches!(error, ExtractionError::Partition(_)));
        assert!(error.is_internal());

        let requests = partitioner.requests.lock().unwrap();
        let (request, existed) = &requests[0];
        assert!(*existed);
        assert!(!request.path.exists(), "staged download should be removed");
    }

    #[tokio::test]
    async fn pdf_extraction_failure_is_internal() {
        let store = InMemory::new();
        store
            .put(
                &ObjectPath::from("tenant/a.pdf"),
                PutPayload::from_static(b"%PDF-1.7"),
            )
            .await
            .expect("seed");
        let files = HashMap::from([("f1".to_string(), record(Some("tenant/a.pdf"), "a.pdf"))]);
        let extractor = ContentExtractor::new(
            Arc::new(StubFiles(files)),
            StorageClient::from_store(Arc::new(store), "bucket"),
            Arc::new(BrokenPdf),
            Arc::new(StubPartitioner::default()),
            1500,
        );

        let error = extractor.extract("f1").await.expect_err("pdf failure");
        assert!(matches!(error, ExtractionError::Pdf(_)));
        assert!(error.is_internal());
    }

    #[tokio::test]
    async fn object_name_is_used_verbatim() {
        let extractor = extractor(
            vec![("f4", record(Some("tenant/a.pdf "), "a.pdf"))],
            vec![("tenant/a.pdf ", &b"Only page."[..])],
            Arc::default(),
        )
        .await;

        let extracted = extractor.extract("f4").await.expect("extract");
        assert_eq!(extracted.content, "Only page.");
        assert_eq!(extracted.object_name, "tenant/a.pdf ");
    }
}
