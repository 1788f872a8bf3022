//! Mock implementations of the service-client traits.

use async_trait::async_trait;
use bedflow_interfaces::{
    BedRecord, ClusterDict, ClusteringClient, ClusteringResult, DxfExportClient,
    EnhancedColorSet, ExportArtifact, ExportCapabilities, ExportType, ExportValidation,
    ImageProcessingClient, ManualClusterAssignment, ProcessingResult, ServiceHealth,
    SessionMetadata, UploadFile, WorkflowResult,
};
use mockall::mock;

use crate::data_generators::{
    sample_clustering_result, sample_enhanced_color_set, sample_export_validation,
    sample_processing_result, sample_service_health,
};

// Generate the mock implementations

mock! {
    pub ImageProcessingClient {}

    #[async_trait]
    impl ImageProcessingClient for ImageProcessingClient {
        async fn process_image(&self, file: &UploadFile) -> WorkflowResult<ProcessingResult>;
        async fn get_session(&self, session_id: &str) -> WorkflowResult<SessionMetadata>;
        async fn delete_session(&self, session_id: &str) -> WorkflowResult<()>;
        async fn health(&self) -> WorkflowResult<ServiceHealth>;
    }
}

mock! {
    pub ClusteringClient {}

    #[async_trait]
    impl ClusteringClient for ClusteringClient {
        async fn create_enhanced_colors(
            &self,
            beds: &[BedRecord],
        ) -> WorkflowResult<EnhancedColorSet>;
        async fn process_clustering(
            &self,
            beds: &[BedRecord],
            enhanced_colors: &EnhancedColorSet,
            assignment: &ManualClusterAssignment,
        ) -> WorkflowResult<ClusteringResult>;
        async fn health(&self) -> WorkflowResult<ServiceHealth>;
    }
}

mock! {
    pub DxfExportClient {}

    #[async_trait]
    impl DxfExportClient for DxfExportClient {
        async fn validate_export(
            &self,
            beds: &[BedRecord],
            cluster_dict: &ClusterDict,
        ) -> WorkflowResult<ExportValidation>;
        async fn export_dxf(
            &self,
            beds: &[BedRecord],
            cluster_dict: &ClusterDict,
            export_type: ExportType,
        ) -> WorkflowResult<ExportArtifact>;
        async fn capabilities(&self) -> WorkflowResult<ExportCapabilities>;
        async fn health(&self) -> WorkflowResult<ServiceHealth>;
    }
}

/// Creates a mock image-processing client with default happy-path behavior:
/// every upload yields a fresh 3-bed session.
pub fn create_mock_processing_client() -> MockImageProcessingClient {
    let mut mock = MockImageProcessingClient::new();

    mock.expect_process_image()
        .returning(|_| Ok(sample_processing_result("session-1", 3)));

    mock.expect_delete_session().returning(|_| Ok(()));

    mock.expect_health()
        .returning(|| Ok(sample_service_health("image-processing")));

    mock
}

/// Creates a mock clustering client with default happy-path behavior
pub fn create_mock_clustering_client() -> MockClusteringClient {
    let mut mock = MockClusteringClient::new();

    mock.expect_create_enhanced_colors()
        .returning(|beds| Ok(sample_enhanced_color_set(beds)));

    mock.expect_process_clustering()
        .returning(|beds, _, assignment| Ok(sample_clustering_result(assignment, beds.len())));

    mock.expect_health()
        .returning(|| Ok(sample_service_health("clustering")));

    mock
}

/// Creates a mock export client that validates cleanly and returns a tiny
/// DXF payload
pub fn create_mock_export_client() -> MockDxfExportClient {
    let mut mock = MockDxfExportClient::new();

    mock.expect_validate_export()
        .returning(|_, _| Ok(sample_export_validation(true, &[])));

    mock.expect_export_dxf().returning(|_, _, export_type| {
        Ok(ExportArtifact {
            bytes: b"0\nSECTION\n0\nEOF\n".to_vec(),
            file_name: format!("beds_{}.dxf", export_type),
        })
    });

    mock.expect_health()
        .returning(|| Ok(sample_service_health("dxf-export")));

    mock
}
