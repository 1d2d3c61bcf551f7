//! HTTP client forwarding staged documents to a remote partitioning service.

use crate::config::get_config;
use crate::partition::types::{Element, PartitionError, PartitionRequest, Payload};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use std::time::Duration;

/// Interface implemented by document partitioning backends.
#[async_trait]
pub trait Partitioner: Send + Sync {
    /// Split the file referenced by `request` into an ordered payload.
    async fn partition(&self, request: PartitionRequest) -> Result<Payload, PartitionError>;
}

/// Partitioner backed by an Unstructured-compatible `/general` HTTP endpoint.
pub struct HttpPartitioner {
    pub(crate) client: Client,
    pub(crate) url: String,
    pub(crate) api_key: Option<String>,
}

impl HttpPartitioner {
    /// Construct a client using configuration derived from the environment.
    pub fn new() -> Result<Self, PartitionError> {
        let config = get_config();
        Self::with_settings(
            &config.partition_api_url,
            config.partition_api_key.clone(),
            Duration::from_secs(config.partition_timeout_secs),
        )
    }

    /// Construct a client for an explicit endpoint.
    pub fn with_settings(
        url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PartitionError> {
        let client = Client::builder()
            .user_agent("docpipe/0.1")
            .timeout(timeout)
            .build()?;
        let url = reqwest::Url::parse(url)
            .map_err(|err| PartitionError::InvalidUrl(err.to_string()))?
            .to_string();
        tracing::debug!(
            url = %url,
            has_api_key = api_key.as_deref().is_some_and(|key| !key.is_empty()),
            timeout_secs = timeout.as_secs(),
            "Initialized partition HTTP client"
        );
        Ok(Self {
            client,
            url,
            api_key,
        })
    }

    fn build_form(request: &PartitionRequest, data: Vec<u8>) -> Result<Form, PartitionError> {
        let file_name = request
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut part = Part::bytes(data).file_name(file_name);
        if let Some(content_type) = &request.content_type {
            part = part.mime_str(content_type)?;
        }

        let mut form = Form::new().part("files", part);
        if let Some(output_format) = &request.output_format {
            form = form.text("output_format", output_format.clone());
        }
        if let Some(content_type) = &request.content_type {
            form = form.text("content_type", content_type.clone());
        }
        if let Some(max_characters) = request.max_characters {
            form = form.text("max_characters", max_characters.to_string());
        }
        Ok(form)
    }
}

#[async_trait]
impl Partitioner for HttpPartitioner {
    async fn partition(&self, request: PartitionRequest) -> Result<Payload, PartitionError> {
        let data = tokio::fs::read(&request.path).await?;
        let size = data.len();
        let form = Self::build_form(&request, data)?;

        let mut builder = self.client.post(&self.url).multipart(form);
        if let Some(api_key) = self.api_key.as_deref().filter(|key| !key.is_empty()) {
            builder = builder.header("unstructured-api-key", api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = PartitionError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Partition request failed");
            return Err(error);
        }

        let is_text = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("text/"));

        let payload = if is_text {
            Payload::Text(response.text().await?)
        } else {
            let body = response.bytes().await?;
            Payload::Elements(serde_json::from_slice::<Vec<Element>>(&body)?)
        };

        tracing::debug!(
            bytes = size,
            shape = payload.shape(),
            content_type = ?request.content_type,
            "Document partitioned"
        );
        Ok(payload)
    }
}
