//! Bedflow Interfaces
//!
//! This crate provides the contract types shared between the bedflow
//! workflow orchestrator and the three backend services (image processing,
//! clustering, DXF export), plus the workflow error taxonomy and the
//! service-client traits the orchestrator is programmed against.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Workflow error taxonomy
pub mod error;

/// Request/response contract types for the backend services
pub mod types;

/// Service-client traits implemented by the HTTP adapter and by test mocks
pub mod client;

/// Re-export key types for convenient usage
pub use error::{WorkflowError, WorkflowResult};

pub use types::{
    BedPosition, BedRecord, ClusterDict, ClusterStatistics, ClusteringResult,
    EnhancedColorSet, ExportArtifact, ExportCapabilities, ExportType,
    ExportValidation, ManualClusterAssignment, ProcessingResult,
    ServiceHealth, SessionMetadata, UploadFile,
};

pub use client::{ClusteringClient, DxfExportClient, ImageProcessingClient};
