//! Contract types for the three bedflow backend services
//!
//! These are the exact request/response shapes of the endpoints listed in
//! the service documentation. They carry no behavior beyond structural
//! validation helpers; a response that fails validation is never accepted
//! into the stage cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WorkflowError, WorkflowResult};

/// Maximum accepted upload size in bytes (10 MB). The backend re-checks
/// this as the authority; the client checks first to avoid a wasted
/// round trip.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Media types the image-processing service accepts
pub const ACCEPTED_MEDIA_TYPES: [&str; 4] =
    ["image/png", "image/jpeg", "image/tiff", "image/bmp"];

/// User-chosen cluster name mapped to the bed ids placed in that cluster.
/// Ordered so derived cluster indices are deterministic.
pub type ManualClusterAssignment = BTreeMap<String, Vec<u32>>;

/// Stringified cluster index mapped to cluster name, as the export service
/// expects it (`{"0": "roses", "1": "hedges"}`)
pub type ClusterDict = BTreeMap<String, String>;

/// Centroid position of a detected bed, in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BedPosition {
    /// Horizontal pixel coordinate
    pub x: f64,

    /// Vertical pixel coordinate
    pub y: f64,
}

/// One detected region of interest in the source image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BedRecord {
    /// Numeric id, unique within the session
    pub bed_id: u32,

    /// Pixel area of the region
    pub area: f64,

    /// Median RGB color over the region's clean pixels
    pub rgb_median: [f64; 3],

    /// Mean RGB color over the region's clean pixels
    pub rgb_mean: [f64; 3],

    /// Number of pixels that survived cleaning
    pub clean_pixel_count: u64,

    /// Optional centroid position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<BedPosition>,
}

/// Response of `POST /process-image`: everything the image-processing
/// service derived from one uploaded image. Immutable once received; a new
/// upload creates a new result and discards the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingResult {
    /// Backend-assigned session identifier, stable for the workflow lifetime
    pub session_id: String,

    /// Number of detected beds; must equal `bed_data.len()`
    pub bed_count: usize,

    /// The detected beds
    pub bed_data: Vec<BedRecord>,

    /// Aggregate statistics as reported by the backend
    pub statistics: Value,

    /// Image geometry as `[height, width]` or `[height, width, channels]`
    pub image_shape: Vec<u32>,

    /// Server-side processing time in milliseconds
    pub processing_time_ms: f64,
}

impl ProcessingResult {
    /// Structural validation: the advertised bed count must match the bed
    /// list actually returned.
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.bed_count != self.bed_data.len() {
            return Err(WorkflowError::MalformedResponse {
                service: "image-processing".to_string(),
                detail: format!(
                    "bed_count is {} but bed_data has {} entries",
                    self.bed_count,
                    self.bed_data.len()
                ),
            });
        }
        Ok(())
    }
}

/// Response of `POST /create-enhanced-colors`: derived color coordinates
/// per enhancement method, one row per bed, order-aligned with the bed list
/// of the [`ProcessingResult`] they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedColorSet {
    /// Method name mapped to its row matrix
    pub enhanced_colors: BTreeMap<String, Vec<Vec<f64>>>,

    /// Method names in the order the backend advertises them
    pub enhancement_methods: Vec<String>,
}

impl EnhancedColorSet {
    /// Rows for one method, if present
    pub fn rows(&self, method: &str) -> Option<&Vec<Vec<f64>>> {
        self.enhanced_colors.get(method)
    }

    /// Whether a method name is selectable
    pub fn contains_method(&self, method: &str) -> bool {
        self.enhanced_colors.contains_key(method)
    }

    /// Structural validation: every method's row count must equal the bed
    /// count of the processing result this set was derived from.
    pub fn validate(&self, bed_count: usize) -> WorkflowResult<()> {
        for (method, rows) in &self.enhanced_colors {
            if rows.len() != bed_count {
                return Err(WorkflowError::MalformedResponse {
                    service: "clustering".to_string(),
                    detail: format!(
                        "method {} has {} rows for {} beds",
                        method,
                        rows.len(),
                        bed_count
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Statistics block of a clustering response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStatistics {
    /// Number of clusters in the assignment
    pub cluster_count: usize,

    /// Number of beds that ended up in some cluster
    pub clustered_beds: usize,

    /// Percentage of beds covered by the assignment
    pub coverage_percent: f64,

    /// Total pixel area per cluster
    #[serde(default)]
    pub cluster_areas: BTreeMap<String, f64>,

    /// Bed count per cluster
    #[serde(default)]
    pub cluster_sizes: BTreeMap<String, usize>,
}

/// Response of `POST /process-clustering`. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringResult {
    /// Final cluster label per bed, order-aligned with the bed list.
    /// `-1` marks a bed left out of every cluster.
    pub final_labels: Vec<i32>,

    /// Resolved cluster name mapped to the bed ids it contains. Ordered;
    /// a cluster's position here is its stable numeric index.
    pub processed_clusters: BTreeMap<String, Vec<u32>>,

    /// Cluster statistics
    pub statistics: ClusterStatistics,
}

impl ClusteringResult {
    /// Structural validation against the bed list the request was built from
    pub fn validate(&self, bed_count: usize) -> WorkflowResult<()> {
        if self.final_labels.len() != bed_count {
            return Err(WorkflowError::MalformedResponse {
                service: "clustering".to_string(),
                detail: format!(
                    "{} final labels for {} beds",
                    self.final_labels.len(),
                    bed_count
                ),
            });
        }
        Ok(())
    }

    /// Derive the `cluster_dict` the export service expects: each cluster
    /// name keyed by its stable numeric index, i.e. its position in the
    /// resolved cluster map's iteration order.
    pub fn cluster_dict(&self) -> ClusterDict {
        self.processed_clusters
            .keys()
            .enumerate()
            .map(|(index, name)| (index.to_string(), name.clone()))
            .collect()
    }
}

/// Kind of DXF export to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// One layer per cluster with aggregate geometry
    Summary,
    /// Per-bed geometry with full attributes
    Detailed,
}

impl ExportType {
    /// Wire name of the export type
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Summary => "summary",
            ExportType::Detailed => "detailed",
        }
    }
}

impl std::fmt::Display for ExportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(ExportType::Summary),
            "detailed" => Ok(ExportType::Detailed),
            other => Err(WorkflowError::InvalidTransition(format!(
                "unknown export type: {}",
                other
            ))),
        }
    }
}

/// Response of `POST /validate-export`: the read-only precondition check
/// that must pass before an export call is made
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportValidation {
    /// Whether an export call would succeed
    pub can_export: bool,

    /// Whether the GDAL toolchain is available server-side
    pub gdal_available: bool,

    /// Whether the submitted bed data passed validation
    pub bed_data_valid: bool,

    /// Number of clusters the service resolved from the request
    pub cluster_count: usize,

    /// Human-readable reasons when `can_export` is false
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Capability record of the export service (`GET /capabilities`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCapabilities {
    /// Whether the GDAL toolchain is available server-side
    pub gdal_available: bool,

    /// Export types the service supports
    #[serde(default)]
    pub export_types: Vec<String>,
}

/// The produced DXF file. Transient: never cached, a fresh export call is
/// made on every export request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Raw DXF bytes
    pub bytes: Vec<u8>,

    /// Suggested filename for delivery
    pub file_name: String,
}

/// Health record common to all three services (`GET /health`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Health status string, `ok`/`healthy` when the service is up
    pub status: String,

    /// Service name as reported by the service itself
    pub service: String,

    /// Service version
    #[serde(default)]
    pub version: Option<String>,
}

/// Session metadata record (`GET /session/{id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// The session identifier
    pub session_id: String,

    /// Number of beds held by the session
    pub bed_count: usize,

    /// When the session was created, if the backend reports it
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Any additional backend fields, preserved as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An image file handed to the workflow by the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    /// Original filename, used as the multipart part filename
    pub file_name: String,

    /// Declared media type
    pub media_type: String,

    /// Raw file bytes
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create an upload from raw parts
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Client-side preconditions checked before any request is issued.
    /// The backend re-checks both as the authority.
    pub fn validate(&self) -> WorkflowResult<()> {
        if !ACCEPTED_MEDIA_TYPES.contains(&self.media_type.as_str()) {
            return Err(WorkflowError::InvalidFile(format!(
                "unsupported media type {} (accepted: {})",
                self.media_type,
                ACCEPTED_MEDIA_TYPES.join(", ")
            )));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(WorkflowError::InvalidFile(format!(
                "file is {} bytes, over the {} byte ceiling",
                self.bytes.len(),
                MAX_UPLOAD_BYTES
            )));
        }
        Ok(())
    }
}
