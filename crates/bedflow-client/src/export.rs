//! HTTP client for the DXF export service

use std::time::Duration;

use async_trait::async_trait;
use bedflow_interfaces::{
    BedRecord, ClusterDict, DxfExportClient, ExportArtifact, ExportCapabilities,
    ExportType, ExportValidation, ServiceHealth, WorkflowResult,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::util::{malformed, map_transport_error, service_error};

const SERVICE: &str = "dxf-export";

/// Timeout budget for export calls, in seconds. Larger than the other
/// services: the payload is bigger and the server generates a file.
pub const EXPORT_TIMEOUT_SECS: u64 = 60;

/// Request payload for export validation
#[derive(Debug, Serialize)]
struct ValidateExportRequest<'a> {
    bed_data: &'a [BedRecord],
    cluster_dict: &'a ClusterDict,
}

/// Request payload for the export call itself
#[derive(Debug, Serialize)]
struct ExportDxfRequest<'a> {
    bed_data: &'a [BedRecord],
    cluster_dict: &'a ClusterDict,
    export_type: ExportType,
}

/// Client for the DXF export service
#[derive(Debug, Clone)]
pub struct HttpDxfExportClient {
    base_url: String,
    client: Client,
}

impl HttpDxfExportClient {
    /// Create a client with the default 60 s timeout budget
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, EXPORT_TIMEOUT_SECS)
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

/// Pulls a filename out of a `Content-Disposition` header value, e.g.
/// `attachment; filename="beds_detailed.dxf"`.
fn filename_from_disposition(value: &str) -> Option<String> {
    value.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}

#[async_trait]
impl DxfExportClient for HttpDxfExportClient {
    async fn validate_export(
        &self,
        beds: &[BedRecord],
        cluster_dict: &ClusterDict,
    ) -> WorkflowResult<ExportValidation> {
        debug!(
            bed_count = beds.len(),
            clusters = cluster_dict.len(),
            "Validating export preconditions"
        );

        let request = ValidateExportRequest {
            bed_data: beds,
            cluster_dict,
        };
        let response = self
            .client
            .post(self.url("validate-export"))
            .json(&request)
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

    async fn export_dxf(
        &self,
        beds: &[BedRecord],
        cluster_dict: &ClusterDict,
        export_type: ExportType,
    ) -> WorkflowResult<ExportArtifact> {
        info!(%export_type, bed_count = beds.len(), "Requesting DXF export");

        let request = ExportDxfRequest {
            bed_data: beds,
            cluster_dict,
            export_type,
        };
        let response = self
            .client
            .post(self.url("export-dxf"))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        let file_name = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format!("bedflow_{}.dxf", export_type));

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?
            .to_vec();

        info!(%file_name, bytes = bytes.len(), "DXF received");
        Ok(ExportArtifact { bytes, file_name })
    }

    async fn capabilities(&self) -> WorkflowResult<ExportCapabilities> {
        let response = self
            .client
            .get(self.url("capabilities"))
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

#[cfg(test)]
mod tests {
    use bedflow_interfaces::WorkflowError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn setup_test_client() -> (MockServer, HttpDxfExportClient) {
        let mock_server = MockServer::start().await;
        let client = HttpDxfExportClient::with_timeout(mock_server.uri(), 5);
        (mock_server, client)
    }

    fn beds(n: u32) -> Vec<BedRecord> {
        (0..n)
            .map(|i| BedRecord {
                bed_id: i,
                area: 75.0,
                rgb_median: [60.0, 70.0, 50.0],
                rgb_mean: [61.0, 71.0, 51.0],
                clean_pixel_count: 200,
                position: None,
            })
            .collect()
    }

    fn dict() -> ClusterDict {
        ClusterDict::from([
            ("0".to_string(), "hedges".to_string()),
            ("1".to_string(), "roses".to_string()),
        ])
    }

    #[test]
    fn filename_parsing_handles_quoted_attachments() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="beds_detailed.dxf""#),
            Some("beds_detailed.dxf".to_string())
        );
        assert_eq!(filename_from_disposition("inline"), None);
    }

    #[tokio::test]
    async fn validate_export_passes_blocked_result_through() {
        let (mock_server, client) = setup_test_client().await;

        Mock::given(method("POST"))
            .and(path("/validate-export"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "can_export": false,
                "gdal_available": true,
                "bed_data_valid": true,
                "cluster_count": 0,
                "messages": ["no clusters"]
            })))
            .mount(&mock_server)
            .await;

        // A blocked validation is a normal response, not an adapter error;
        // the orchestrator decides what to do with it.
        let validation = client.validate_export(&beds(2), &dict()).await.unwrap();
        assert!(!validation.can_export);
        assert_eq!(validation.messages, vec!["no clusters"]);
    }

    #[tokio::test]
    async fn export_dxf_returns_bytes_and_suggested_filename() {
        let (mock_server, client) = setup_test_client().await;

        let dxf = b"0\nSECTION\n2\nENTITIES\n0\nENDSEC\n0\nEOF\n".to_vec();
        Mock::given(method("POST"))
            .and(path("/export-dxf"))
            .and(body_partial_json(json!({"export_type": "detailed"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "content-disposition",
                        r#"attachment; filename="beds_detailed.dxf""#,
                    )
                    .set_body_bytes(dxf.clone()),
            )
            .mount(&mock_server)
            .await;

        let artifact = client
            .export_dxf(&beds(2), &dict(), ExportType::Detailed)
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "beds_detailed.dxf");
        assert_eq!(artifact.bytes, dxf);
    }

    #[tokio::test]
    async fn export_dxf_falls_back_to_derived_filename() {
        let (mock_server, client) = setup_test_client().await;

        Mock::given(method("POST"))
            .and(path("/export-dxf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"EOF".to_vec()))
            .mount(&mock_server)
            .await;

        let artifact = client
            .export_dxf(&beds(1), &dict(), ExportType::Summary)
            .await
            .unwrap();
        assert_eq!(artifact.file_name, "bedflow_summary.dxf");
    }

    #[tokio::test]
    async fn export_dxf_surfaces_backend_error() {
        let (mock_server, client) = setup_test_client().await;

        Mock::given(method("POST"))
            .and(path("/export-dxf"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({"detail": "GDAL unavailable"})),
            )
            .mount(&mock_server)
            .await;

        let err = client
            .export_dxf(&beds(1), &dict(), ExportType::Summary)
            .await
            .unwrap_err();
        match err {
            WorkflowError::ServiceError { status, message, .. } => {
                assert_eq!(status, 503);
                assert_eq!(message, "GDAL unavailable");
            }
            other => panic!("expected ServiceError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn capabilities_parses_record() {
        let (mock_server, client) = setup_test_client().await;

        Mock::given(method("GET"))
            .and(path("/capabilities"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "gdal_available": true,
                "export_types": ["summary", "detailed"]
            })))
            .mount(&mock_server)
            .await;

        let caps = client.capabilities().await.unwrap();
        assert!(caps.gdal_available);
        assert_eq!(caps.export_types, vec!["summary", "detailed"]);
    }
}
