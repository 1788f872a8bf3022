//! Deterministic sample data for tests
//!
//! Everything here is plain and predictable: bed ids count up from zero,
//! colors are simple functions of the bed id, and clustering statistics
//! are derived from the assignment they describe.

use std::collections::BTreeMap;

use bedflow_interfaces::{
    BedPosition, BedRecord, ClusterStatistics, ClusteringResult, EnhancedColorSet,
    ExportValidation, ManualClusterAssignment, ProcessingResult, ServiceHealth,
    UploadFile,
};
use serde_json::json;

/// A unique session id for tests that need distinct backend sessions
pub fn fresh_session_id() -> String {
    format!("session-{}", uuid::Uuid::new_v4())
}

/// `count` beds with deterministic areas, colors and positions
pub fn sample_bed_records(count: usize) -> Vec<BedRecord> {
    (0..count)
        .map(|i| {
            let i = i as u32;
            BedRecord {
                bed_id: i,
                area: 100.0 + f64::from(i) * 10.0,
                rgb_median: [f64::from(i) * 5.0, 120.0, 80.0],
                rgb_mean: [f64::from(i) * 5.0 + 0.5, 119.5, 80.5],
                clean_pixel_count: 300 + u64::from(i),
                position: Some(BedPosition {
                    x: f64::from(i) * 40.0,
                    y: 25.0,
                }),
            }
        })
        .collect()
}

/// A processing result for `bed_count` beds under the given session
pub fn sample_processing_result(session_id: &str, bed_count: usize) -> ProcessingResult {
    let bed_data = sample_bed_records(bed_count);
    let total_area: f64 = bed_data.iter().map(|b| b.area).sum();
    ProcessingResult {
        session_id: session_id.to_string(),
        bed_count,
        bed_data,
        statistics: json!({ "total_area": total_area, "bed_count": bed_count }),
        image_shape: vec![480, 640, 3],
        processing_time_ms: 250.0,
    }
}

/// A color set for the given beds with the three standard methods. The
/// `original` rows equal the beds' median colors.
pub fn sample_enhanced_color_set(beds: &[BedRecord]) -> EnhancedColorSet {
    let original: Vec<Vec<f64>> = beds.iter().map(|b| b.rgb_median.to_vec()).collect();
    let saturation: Vec<Vec<f64>> = beds
        .iter()
        .map(|b| vec![b.rgb_median[0] * 1.2, b.rgb_median[1] * 1.2, b.rgb_median[2] * 1.2])
        .collect();
    let pca: Vec<Vec<f64>> = beds
        .iter()
        .map(|b| vec![f64::from(b.bed_id) * 0.1, -f64::from(b.bed_id) * 0.05])
        .collect();

    EnhancedColorSet {
        enhanced_colors: BTreeMap::from([
            ("original".to_string(), original),
            ("enhanced_saturation".to_string(), saturation),
            ("pca_features".to_string(), pca),
        ]),
        enhancement_methods: vec![
            "original".to_string(),
            "enhanced_saturation".to_string(),
            "pca_features".to_string(),
        ],
    }
}

/// A two-cluster assignment over three beds
pub fn sample_assignment() -> ManualClusterAssignment {
    ManualClusterAssignment::from([
        ("bedA".to_string(), vec![0, 1]),
        ("bedB".to_string(), vec![2]),
    ])
}

/// A clustering result consistent with the given assignment: labels follow
/// the assignment's iteration order, unassigned beds get `-1`, and the
/// statistics are derived from the coverage.
pub fn sample_clustering_result(
    assignment: &ManualClusterAssignment,
    bed_count: usize,
) -> ClusteringResult {
    let final_labels: Vec<i32> = (0..bed_count as u32)
        .map(|bed_id| {
            assignment
                .iter()
                .position(|(_, beds)| beds.contains(&bed_id))
                .map_or(-1, |index| index as i32)
        })
        .collect();
    let clustered_beds = final_labels.iter().filter(|label| **label >= 0).count();
    let coverage_percent = if bed_count == 0 {
        0.0
    } else {
        clustered_beds as f64 / bed_count as f64 * 100.0
    };

    ClusteringResult {
        final_labels,
        processed_clusters: assignment.clone(),
        statistics: ClusterStatistics {
            cluster_count: assignment.len(),
            clustered_beds,
            coverage_percent,
            cluster_areas: BTreeMap::new(),
            cluster_sizes: assignment
                .iter()
                .map(|(name, beds)| (name.clone(), beds.len()))
                .collect(),
        },
    }
}

/// An export validation outcome; `messages` only matter when blocked
pub fn sample_export_validation(can_export: bool, messages: &[&str]) -> ExportValidation {
    ExportValidation {
        can_export,
        gdal_available: true,
        bed_data_valid: true,
        cluster_count: if can_export { 2 } else { 0 },
        messages: messages.iter().map(|m| m.to_string()).collect(),
    }
}

/// A small valid PNG upload
pub fn sample_upload_file() -> UploadFile {
    UploadFile::new("garden.png", "image/png", vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a])
}

/// A healthy service record
pub fn sample_service_health(service: &str) -> ServiceHealth {
    ServiceHealth {
        status: "ok".to_string(),
        service: service.to_string(),
        version: Some("1.0.0".to_string()),
    }
}
