//! Per-upload processing: stage on disk, partition, and restore the client's filename.

use crate::partition::client::Partitioner;
use crate::partition::types::{PartitionError, PartitionRequest, Payload};
use bytes::Bytes;
use futures_util::Stream;
use std::sync::Arc;

const FALLBACK_STAGED_NAME: &str = "upload";

/// A single uploaded file, held only for the duration of one request.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename supplied by the client, possibly including a path prefix.
    pub filename: Option<String>,
    /// Raw file contents.
    pub data: Bytes,
}

impl Upload {
    /// Wrap raw contents and an optional client filename.
    pub fn new(filename: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename,
            data: data.into(),
        }
    }

    /// Client filename stripped of any directory prefix.
    pub fn basename(&self) -> &str {
        basename(self.filename.as_deref().unwrap_or_default())
    }
}

/// Final path component of `filename`, accepting both `/` and `\` separators.
pub fn basename(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or_default()
}

/// Partition one upload.
///
/// The partitioner needs a seekable, named file, so the upload is written into a fresh
/// temporary directory first. The directory is removed once partitioning finishes, whether
/// it succeeded or not. Element `filename` metadata is rewritten from the staged name to the
/// basename of the client's filename.
pub async fn partition_upload(
    partitioner: &dyn Partitioner,
    upload: &Upload,
    output_format: Option<&str>,
) -> Result<Payload, PartitionError> {
    let filename = upload.basename();
    let staged_name = match filename {
        "" | "." | ".." => FALLBACK_STAGED_NAME,
        name => name,
    };

    let staging = tempfile::tempdir()?;
    let staged_path = staging.path().join(staged_name);

    let result = async {
        tokio::fs::write(&staged_path, &upload.data).await?;
        let request = PartitionRequest::new(&staged_path).with_output_format(output_format);
        partitioner.partition(request).await
    }
    .await;

    if let Err(error) = staging.close() {
        tracing::warn!(error = %error, "Failed to remove staging directory");
    }

    let mut payload = result?;
    if let Payload::Elements(elements) = &mut payload {
        for element in elements.iter_mut() {
            element.set_filename(filename);
        }
    }

    tracing::debug!(
        filename,
        bytes = upload.data.len(),
        shape = payload.shape(),
        "Upload partitioned"
    );
    Ok(payload)
}

/// Lazily partition uploads in order, yielding one payload per file.
///
/// The stream is single-pass; an error ends it after being yielded.
pub fn partition_uploads(
    partitioner: Arc<dyn Partitioner>,
    uploads: Vec<Upload>,
    output_format: Option<String>,
) -> impl Stream<Item = Result<Payload, PartitionError>> + Send + 'static {
    async_stream::try_stream! {
        for upload in uploads {
            let payload =
                partition_upload(partitioner.as_ref(), &upload, output_format.as_deref()).await?;
            yield payload;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::types::Element;
    use async_trait::async_trait;
    use futures_util::StreamExt;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records the staged path and whether it existed while partitioning ran.
    #[derive(Default)]
    struct RecordingPartitioner {
        seen: Mutex<Vec<(PathBuf, bool, Vec<u8>)>>,
        fail: bool,
    }

    #[async_trait]
    impl Partitioner for RecordingPartitioner {
        async fn partition(&self, request: PartitionRequest) -> Result<Payload, PartitionError> {
            let contents = std::fs::read(&request.path).unwrap_or_default();
            self.seen.lock().unwrap().push((
                request.path.clone(),
                request.path.exists(),
                contents,
            ));
            if self.fail {
                return Err(PartitionError::Io(std::io::Error::other("partition exploded")));
            }
            let mut element = Element::from_text("body");
            element.set_filename(
                request
                    .path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or_default(),
            );
            Ok(Payload::Elements(vec![element]))
        }
    }

    #[test]
    fn basename_strips_prefixes() {
        assert_eq!(basename("docs/2024/report.pdf"), "report.pdf");
        assert_eq!(basename("C:\\Users\\me\\memo.docx"), "memo.docx");
        assert_eq!(basename("plain.txt"), "plain.txt");
        assert_eq!(basename(""), "");
    }

    #[tokio::test]
    async fn rewrites_filename_and_removes_staging() {
        let partitioner = RecordingPartitioner::default();
        let upload = Upload::new(Some("../../etc/report.docx".into()), "contents");

        let payload = partition_upload(&partitioner, &upload, None)
            .await
            .expect("payload");

        let Payload::Elements(elements) = payload else {
            panic!("expected elements");
        };
        assert_eq!(elements[0].filename(), Some("report.docx"));

        let seen = partitioner.seen.lock().unwrap();
        let (path, existed, contents) = &seen[0];
        assert!(*existed, "staged file should exist during partitioning");
        assert_eq!(contents.as_slice(), b"contents");
        assert_eq!(path.file_name().unwrap(), "report.docx");
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn removes_staging_when_partitioning_fails() {
        let partitioner = RecordingPartitioner {
            fail: true,
            ..Default::default()
        };
        let upload = Upload::new(Some("slides.pptx".into()), "pptx bytes");

        let error = partition_upload(&partitioner, &upload, None)
            .await
            .expect_err("should fail");
        assert!(error.to_string().contains("partition exploded"));

        let seen = partitioner.seen.lock().unwrap();
        assert!(!seen[0].0.exists());
        assert!(!seen[0].0.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn nameless_upload_uses_fallback_staged_name() {
        let partitioner = RecordingPartitioner::default();
        let upload = Upload::new(None, "data");

        let payload = partition_upload(&partitioner, &upload, None)
            .await
            .expect("payload");

        let seen = partitioner.seen.lock().unwrap();
        assert_eq!(seen[0].0.file_name().unwrap(), FALLBACK_STAGED_NAME);
        let Payload::Elements(elements) = payload else {
            panic!("expected elements");
        };
        assert_eq!(elements[0].filename(), Some(""));
    }

    #[tokio::test]
    async fn stream_preserves_upload_order() {
        let partitioner: Arc<dyn Partitioner> = Arc::new(RecordingPartitioner::default());
        let uploads = vec![
            Upload::new(Some("a.txt".into()), "a"),
            Upload::new(Some("b.txt".into()), "b"),
        ];

        let payloads: Vec<_> = partition_uploads(partitioner, uploads, None)
            .collect::<Vec<_>>()
            .await;

        let names: Vec<_> = payloads
            .into_iter()
            .map(|payload| match payload.expect("payload") {
                Payload::Elements(elements) => elements[0].filename().unwrap().to_string(),
                Payload::Text(_) => unreachable!(),
            })
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
