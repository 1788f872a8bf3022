//! The stage cache
//!
//! Holds the last successfully produced artifact for each stage plus the
//! derived enhancement selection. Pure in-memory store with no network
//! knowledge; the orchestrator decides what gets written and when. The
//! enhanced-color entry is keyed by the session id of the processing
//! result it was derived from, so a new upload can never serve stale
//! colors.

use std::sync::Arc;

use bedflow_interfaces::{ClusteringResult, EnhancedColorSet, ProcessingResult};

use crate::selection::EnhancementSelection;
use crate::stage::WorkflowStage;

#[derive(Debug, Clone)]
struct EnhancedColorsEntry {
    session_id: String,
    set: Arc<EnhancedColorSet>,
}

/// Cached artifacts of one workflow instance
#[derive(Debug, Clone, Default)]
pub struct StageCache {
    processing: Option<Arc<ProcessingResult>>,
    enhanced_colors: Option<EnhancedColorsEntry>,
    selection: Option<Arc<EnhancementSelection>>,
    clustering: Option<Arc<ClusteringResult>>,
}

impl StageCache {
    /// The current processing result, if any
    pub fn processing(&self) -> Option<&Arc<ProcessingResult>> {
        self.processing.as_ref()
    }

    /// Store a fresh processing result. A new image invalidates everything
    /// downstream of Upload, including colors cached for the old session.
    pub fn replace_processing(&mut self, result: ProcessingResult) {
        self.processing = Some(Arc::new(result));
        self.enhanced_colors = None;
        self.selection = None;
        self.clustering = None;
    }

    /// The cached color set, but only when it was derived from the given
    /// session
    pub fn enhanced_colors_for(&self, session_id: &str) -> Option<Arc<EnhancedColorSet>> {
        self.enhanced_colors
            .as_ref()
            .filter(|entry| entry.session_id == session_id)
            .map(|entry| Arc::clone(&entry.set))
    }

    /// The cached color set regardless of session, for snapshotting
    pub fn enhanced_colors(&self) -> Option<Arc<EnhancedColorSet>> {
        self.enhanced_colors
            .as_ref()
            .map(|entry| Arc::clone(&entry.set))
    }

    /// Cache a color set derived from the given session
    pub fn store_enhanced_colors(
        &mut self,
        session_id: &str,
        set: EnhancedColorSet,
    ) -> Arc<EnhancedColorSet> {
        let set = Arc::new(set);
        self.enhanced_colors = Some(EnhancedColorsEntry {
            session_id: session_id.to_string(),
            set: Arc::clone(&set),
        });
        set
    }

    /// The current enhancement selection, if any
    pub fn selection(&self) -> Option<&Arc<EnhancementSelection>> {
        self.selection.as_ref()
    }

    /// Store the enhancement selection
    pub fn store_selection(&mut self, selection: EnhancementSelection) {
        self.selection = Some(Arc::new(selection));
    }

    /// The current clustering result, if any
    pub fn clustering(&self) -> Option<&Arc<ClusteringResult>> {
        self.clustering.as_ref()
    }

    /// Store the clustering result
    pub fn store_clustering(&mut self, result: ClusteringResult) {
        self.clustering = Some(Arc::new(result));
    }

    /// Clear exactly the artifacts strictly downstream of `target`, for
    /// backward navigation. Artifacts valid at or above the target stay.
    pub fn invalidate_downstream_of(&mut self, target: WorkflowStage) {
        match target {
            WorkflowStage::Upload => {
                self.processing = None;
                self.enhanced_colors = None;
                self.selection = None;
                self.clustering = None;
            }
            WorkflowStage::Enhancement => {
                self.selection = None;
                self.clustering = None;
            }
            WorkflowStage::Clustering => {
                self.clustering = None;
            }
            WorkflowStage::Results => {}
        }
    }

    /// Drop everything — equivalent to starting a new session
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
