//! HTTP client for the clustering service

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bedflow_interfaces::{
    BedRecord, ClusteringClient, ClusteringResult, EnhancedColorSet,
    ManualClusterAssignment, ServiceHealth, WorkflowResult,
};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::util::{malformed, map_transport_error, service_error};

const SERVICE: &str = "clustering";

/// Default timeout budget for clustering calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Request payload for enhanced color derivation
#[derive(Debug, Serialize)]
struct CreateEnhancedColorsRequest<'a> {
    bed_data: &'a [BedRecord],
}

/// Request payload for clustering resolution
#[derive(Debug, Serialize)]
struct ProcessClusteringRequest<'a> {
    bed_data: &'a [BedRecord],
    enhanced_colors: &'a BTreeMap<String, Vec<Vec<f64>>>,
    clusters_data: &'a ManualClusterAssignment,
}

/// Client for the clustering service
#[derive(Debug, Clone)]
pub struct HttpClusteringClient {
    base_url: String,
    client: Client,
}

impl HttpClusteringClient {
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
impl ClusteringClient for HttpClusteringClient {
    async fn create_enhanced_colors(
        &self,
        beds: &[BedRecord],
    ) -> WorkflowResult<EnhancedColorSet> {
        debug!(bed_count = beds.len(), "Requesting enhanced colors");

        let request = CreateEnhancedColorsRequest { bed_data: beds };
        let response = self
            .client
            .post(self.url("create-enhanced-colors"))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        let set: EnhancedColorSet = response
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e))?;
        set.validate(beds.len())?;

        debug!(methods = set.enhancement_methods.len(), "Enhanced colors received");
        Ok(set)
    }

    async fn process_clustering(
        &self,
        beds: &[BedRecord],
        enhanced_colors: &EnhancedColorSet,
        assignment: &ManualClusterAssignment,
    ) -> WorkflowResult<ClusteringResult> {
        info!(
            bed_count = beds.len(),
            clusters = assignment.len(),
            "Submitting cluster assignment"
        );

        let request = ProcessClusteringRequest {
            bed_data: beds,
            enhanced_colors: &enhanced_colors.enhanced_colors,
            clusters_data: assignment,
        };
        let response = self
            .client
            .post(self.url("process-clustering"))
            .json(&request)
            .send()
            .await
            .map_err(|e| map_transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(SERVICE, status.as_u16(), &body));
        }

        let result: ClusteringResult = response
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e))?;
        result.validate(beds.len())?;

        info!(
            clusters = result.processed_clusters.len(),
            coverage = result.statistics.coverage_percent,
            "Clustering resolved"
        );
        Ok(result)
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
