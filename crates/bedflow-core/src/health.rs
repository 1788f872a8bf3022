//! Per-service availability report
//!
//! Produced by the read-only health utility; not part of the workflow
//! state machine.

use bedflow_interfaces::{ServiceHealth, WorkflowResult};

/// Availability of one backend service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAvailability {
    /// Whether the health probe succeeded
    pub available: bool,

    /// The health record when the probe succeeded
    pub health: Option<ServiceHealth>,

    /// The failure message when it did not
    pub error: Option<String>,
}

impl ServiceAvailability {
    pub(crate) fn from_probe(result: WorkflowResult<ServiceHealth>) -> Self {
        match result {
            Ok(health) => Self {
                available: true,
                health: Some(health),
                error: None,
            },
            Err(err) => Self {
                available: false,
                health: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Availability of all three backend services
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceHealthReport {
    /// Image-processing service
    pub processing: ServiceAvailability,

    /// Clustering service
    pub clustering: ServiceAvailability,

    /// DXF export service
    pub export: ServiceAvailability,
}

impl ServiceHealthReport {
    /// True when every service answered its probe
    pub fn all_available(&self) -> bool {
        self.processing.available && self.clustering.available && self.export.available
    }
}
