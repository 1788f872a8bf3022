//! HTTP client for the image-processing service

use std::time::Duration;

use async_trait::async_trait;
use bedflow_interfaces::{
    ImageProcessingClient, ProcessingResult, ServiceHealth, SessionMetadata, UploadFile,
    WorkflowError, WorkflowResult,
};
use reqwest::{multipart, Client, StatusCode};
use tracing::{debug, info};

use crate::util::{malformed, map_transport_error, service_error};

const SERVICE: &str = "image-processing";

/// Default timeout budget for processing calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the image-processing service
#[derive(Debug, Clone)]
pub struct HttpImageProcessingClient {
    base_url: String,
    client: Client,
}

impl HttpImageProcessingClient {
    /// Create a client with the default 30 s timeout budget
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with an explicit timeout budget
    pub fn with_timeout(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ImageProcessingClient for HttpImageProcessingClient {
    async fn process_image(&self, file: &UploadFile) -> WorkflowResult<ProcessingResult> {
        // Client-side precondition; the backend re-checks as the authority.
        file.validate()?;

        info!(file_name = %file.file_name, bytes = file.bytes.len(), "Uploading image");

        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.media_type)
            .map_err(|e| {
                WorkflowError::InvalidFile(format!(
                    "invalid media type {}: {}",
                    file.media_type, e
                ))
            })?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("process-image"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        let result: ProcessingResult = response
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e))?;
        result.validate()?;

        info!(
            session_id = %result.session_id,
            bed_count = result.bed_count,
            "Image processed"
        );
        Ok(result)
    }

    async fn get_session(&self, session_id: &str) -> WorkflowResult<SessionMetadata> {
        debug!(%session_id, "Fetching session metadata");

        let response = self
            .client
            .get(self.url(&format!("session/{}", session_id)))
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        response.json().await.map_err(|e| malformed(SERVICE, e))
    }

    async fn delete_session(&self, session_id: &str) -> WorkflowResult<()> {
        debug!(%session_id, "Deleting session");

        let response = self
            .client
            .delete(self.url(&format!("session/{}", session_id)))
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        // A session that is already gone counts as deleted.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        Ok(())
    }

    async fn health(&self) -> WorkflowResult<ServiceHealth> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        response.json().await.map_err(|e| malformed(SERVICE, e))
    }
}
