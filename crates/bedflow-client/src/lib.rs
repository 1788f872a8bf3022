//! Bedflow HTTP adapter
//!
//! `reqwest`-based implementations of the three service-client traits from
//! `bedflow-interfaces`. Each adapter owns its own HTTP client with the
//! timeout budget of its service (30 s for processing/clustering, 60 s for
//! export) and normalizes transport, status, and response-shape failures
//! into the workflow error taxonomy.

pub mod clustering;
pub mod config;
pub mod export;
pub mod processing;

mod util;

use std::sync::Arc;

use bedflow_interfaces::{ClusteringClient, DxfExportClient, ImageProcessingClient};

pub use clustering::HttpClusteringClient;
pub use config::ServiceEndpoints;
pub use export::HttpDxfExportClient;
pub use processing::HttpImageProcessingClient;

/// The three service clients wired up from one endpoint configuration,
/// ready to hand to the orchestrator.
#[derive(Clone)]
pub struct ServiceClients {
    /// Image-processing service client
    pub processing: Arc<dyn ImageProcessingClient>,
    /// Clustering service client
    pub clustering: Arc<dyn ClusteringClient>,
    /// DXF export service client
    pub export: Arc<dyn DxfExportClient>,
}

impl ServiceClients {
    /// Creates HTTP clients for every service in the endpoint configuration
    pub fn from_endpoints(endpoints: &ServiceEndpoints) -> Self {
        Self {
            processing: Arc::new(HttpImageProcessingClient::new(&endpoints.processing_url)),
            clustering: Arc::new(HttpClusteringClient::new(&endpoints.clustering_url)),
            export: Arc::new(HttpDxfExportClient::new(&endpoints.export_url)),
        }
    }
}
