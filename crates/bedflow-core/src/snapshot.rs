//! Immutable workflow snapshots
//!
//! The orchestrator never hands out references into its state; every read
//! goes through a snapshot, replaced wholesale on each transition. The
//! presentation layer renders the active stage from the artifacts a
//! snapshot carries.

use std::sync::Arc;

use bedflow_interfaces::{ClusteringResult, EnhancedColorSet, ProcessingResult};

use crate::selection::EnhancementSelection;
use crate::stage::WorkflowStage;

/// One immutable view of the workflow state
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSnapshot {
    /// The active stage
    pub stage: WorkflowStage,

    /// True while a remote call is in flight; every entry point except the
    /// cancel-equivalent `go_back`/`reset` is rejected meanwhile
    pub loading: bool,

    /// User-facing message of the last failed transition, cleared on the
    /// next attempt
    pub error: Option<String>,

    /// Result of the upload stage, if produced
    pub processing: Option<Arc<ProcessingResult>>,

    /// Color set for the current session, if fetched
    pub enhanced_colors: Option<Arc<EnhancedColorSet>>,

    /// The chosen enhancement, if selected
    pub selection: Option<Arc<EnhancementSelection>>,

    /// Result of the clustering stage, if produced
    pub clustering: Option<Arc<ClusteringResult>>,
}

impl WorkflowSnapshot {
    /// Session id of the active backend session, if an image was processed
    pub fn session_id(&self) -> Option<&str> {
        self.processing.as_deref().map(|p| p.session_id.as_str())
    }

    /// Number of detected beds, zero before the first upload
    pub fn bed_count(&self) -> usize {
        self.processing.as_deref().map_or(0, |p| p.bed_data.len())
    }

    /// Enhancement method names available for selection, empty until the
    /// color set has been fetched
    pub fn available_methods(&self) -> Vec<String> {
        self.enhanced_colors
            .as_deref()
            .map(|set| set.enhancement_methods.clone())
            .unwrap_or_default()
    }
}
