//! Endpoint configuration for the bedflow backend services
//!
//! The three services are independently addressable; alternatively a single
//! gateway can front all of them under `/api/v1/{service}`. The workflow
//! orchestrator never sees which topology is in use.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base URLs of the three backend services
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// Base URL of the image-processing service
    pub processing_url: String,

    /// Base URL of the clustering service
    pub clustering_url: String,

    /// Base URL of the DXF export service
    pub export_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            processing_url: "http://localhost:8001".to_string(),
            clustering_url: "http://localhost:8002".to_string(),
            export_url: "http://localhost:8003".to_string(),
        }
    }
}

impl ServiceEndpoints {
    /// Endpoints for a single gateway deployment that namespaces the
    /// services under `/api/v1/{service}`
    pub fn gateway(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            processing_url: format!("{}/api/v1/image-processing", base),
            clustering_url: format!("{}/api/v1/clustering", base),
            export_url: format!("{}/api/v1/dxf-export", base),
        }
    }

    /// Load endpoints from environment variables.
    ///
    /// `BEDFLOW_GATEWAY_URL` selects the gateway topology; the per-service
    /// variables `BEDFLOW_PROCESSING_URL`, `BEDFLOW_CLUSTERING_URL` and
    /// `BEDFLOW_EXPORT_URL` override individual services either way.
    pub fn from_env() -> Self {
        let mut endpoints = match env::var("BEDFLOW_GATEWAY_URL") {
            Ok(gateway) if !gateway.trim().is_empty() => Self::gateway(&gateway),
            Ok(_) => {
                warn!("BEDFLOW_GATEWAY_URL is set but empty, using defaults");
                Self::default()
            }
            Err(_) => Self::default(),
        };

        if let Ok(url) = env::var("BEDFLOW_PROCESSING_URL") {
            endpoints.processing_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(url) = env::var("BEDFLOW_CLUSTERING_URL") {
            endpoints.clustering_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(url) = env::var("BEDFLOW_EXPORT_URL") {
            endpoints.export_url = url.trim_end_matches('/').to_string();
        }

        endpoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_namespaces_all_three_services() {
        let endpoints = ServiceEndpoints::gateway("https://bedflow.example.com/");
        assert_eq!(
            endpoints.processing_url,
            "https://bedflow.example.com/api/v1/image-processing"
        );
        assert_eq!(
            endpoints.clustering_url,
            "https://bedflow.example.com/api/v1/clustering"
        );
        assert_eq!(
            endpoints.export_url,
            "https://bedflow.example.com/api/v1/dxf-export"
        );
    }

    #[test]
    fn defaults_point_at_local_services() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(endpoints.processing_url, "http://localhost:8001");
        assert_eq!(endpoints.clustering_url, "http://localhost:8002");
        assert_eq!(endpoints.export_url, "http://localhost:8003");
    }
}
