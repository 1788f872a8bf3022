//! Bedflow test utilities
//!
//! Mock implementations of the service-client traits plus deterministic
//! data generators, shared by the orchestrator and adapter test suites.

pub mod data_generators;
pub mod mocks;

pub use data_generators::{
    fresh_session_id, sample_assignment, sample_bed_records, sample_clustering_result,
    sample_enhanced_color_set, sample_export_validation, sample_processing_result,
    sample_service_health, sample_upload_file,
};
pub use mocks::{
    create_mock_clustering_client, create_mock_export_client,
    create_mock_processing_client, MockClusteringClient, MockDxfExportClient,
    MockImageProcessingClient,
};
