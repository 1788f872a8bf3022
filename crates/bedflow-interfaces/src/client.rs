//! Service-client traits
//!
//! One trait per backend capability. The orchestrator is constructed from
//! `Arc<dyn …>` instances of these traits, so tests substitute mock
//! implementations and the HTTP adapter stays swappable.

use async_trait::async_trait;

use crate::error::WorkflowResult;
use crate::types::{
    BedRecord, ClusterDict, ClusteringResult, EnhancedColorSet, ExportArtifact,
    ExportCapabilities, ExportType, ExportValidation, ManualClusterAssignment,
    ProcessingResult, ServiceHealth, SessionMetadata, UploadFile,
};

/// Contract for the image-processing service client
#[async_trait]
pub trait ImageProcessingClient: Send + Sync {
    /// Contract: uploads one image and returns the detected beds.
    /// - `file`: name, media type and bytes of the image. The caller is
    ///   expected to have run [`UploadFile::validate`](crate::types::UploadFile::validate)
    ///   first; the implementation re-checks before issuing the request.
    /// - Returns: a structurally validated [`ProcessingResult`] with a fresh
    ///   `session_id`. Every upload creates a new backend session.
    async fn process_image(&self, file: &UploadFile) -> WorkflowResult<ProcessingResult>;

    /// Contract: fetches metadata for an existing backend session.
    async fn get_session(&self, session_id: &str) -> WorkflowResult<SessionMetadata>;

    /// Contract: deletes a backend session. A session that is already gone
    /// (404) counts as success.
    async fn delete_session(&self, session_id: &str) -> WorkflowResult<()>;

    /// Contract: read-only health probe.
    async fn health(&self) -> WorkflowResult<ServiceHealth>;
}

/// Contract for the clustering service client
#[async_trait]
pub trait ClusteringClient: Send + Sync {
    /// Contract: derives per-method color coordinates for the given beds.
    /// Idempotent — the same bed list yields equivalent output, which is why
    /// the orchestrator may skip this call when a cached set exists for the
    /// current session.
    /// - Returns: a structurally validated [`EnhancedColorSet`] whose every
    ///   row matrix has exactly one row per bed.
    async fn create_enhanced_colors(
        &self,
        beds: &[BedRecord],
    ) -> WorkflowResult<EnhancedColorSet>;

    /// Contract: resolves a user-drawn cluster assignment into final labels
    /// and statistics. Not idempotent in effect (the server may persist or
    /// log), but safe to repeat after the user edits the assignment.
    async fn process_clustering(
        &self,
        beds: &[BedRecord],
        enhanced_colors: &EnhancedColorSet,
        assignment: &ManualClusterAssignment,
    ) -> WorkflowResult<ClusteringResult>;

    /// Contract: read-only health probe.
    async fn health(&self) -> WorkflowResult<ServiceHealth>;
}

/// Contract for the DXF export service client
#[async_trait]
pub trait DxfExportClient: Send + Sync {
    /// Contract: read-only precondition check. Must be called (and must
    /// report `can_export`) before [`export_dxf`](Self::export_dxf); the
    /// orchestrator enforces the ordering rather than relying on the
    /// backend to reject.
    async fn validate_export(
        &self,
        beds: &[BedRecord],
        cluster_dict: &ClusterDict,
    ) -> WorkflowResult<ExportValidation>;

    /// Contract: produces the DXF file. Carries the larger 60 s timeout
    /// budget (server-side file generation).
    async fn export_dxf(
        &self,
        beds: &[BedRecord],
        cluster_dict: &ClusterDict,
        export_type: ExportType,
    ) -> WorkflowResult<ExportArtifact>;

    /// Contract: capability record of the export service.
    async fn capabilities(&self) -> WorkflowResult<ExportCapabilities>;

    /// Contract: read-only health probe.
    async fn health(&self) -> WorkflowResult<ServiceHealth>;
}
