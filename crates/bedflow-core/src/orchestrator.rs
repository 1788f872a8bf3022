//! The workflow orchestrator
//!
//! The finite state machine driving the four-stage pipeline. Each forward
//! transition suspends at one remote call (export at two); the loading flag
//! keeps a single call in flight at a time. State lives behind a mutex that
//! is never held across an await: a transition locks to begin, releases for
//! the call, and re-locks to settle. `reset`/`go_back` during a pending
//! call bump the workflow generation, so the call's result is discarded
//! when it arrives instead of being written into a stage it no longer
//! belongs to.

use std::sync::Arc;

use bedflow_interfaces::{
    ClusteringClient, DxfExportClient, EnhancedColorSet, ExportArtifact, ExportType,
    ImageProcessingClient, ManualClusterAssignment, ProcessingResult, UploadFile,
    WorkflowError, WorkflowResult,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::StageCache;
use crate::health::{ServiceAvailability, ServiceHealthReport};
use crate::selection::EnhancementSelection;
use crate::snapshot::WorkflowSnapshot;
use crate::stage::WorkflowStage;

#[derive(Debug)]
struct WorkflowState {
    stage: WorkflowStage,
    loading: bool,
    generation: u64,
    last_error: Option<String>,
    cache: StageCache,
}

impl WorkflowState {
    fn new() -> Self {
        Self {
            stage: WorkflowStage::Upload,
            loading: false,
            generation: 0,
            last_error: None,
            cache: StageCache::default(),
        }
    }

    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            stage: self.stage,
            loading: self.loading,
            error: self.last_error.clone(),
            processing: self.cache.processing().map(Arc::clone),
            enhanced_colors: self.cache.enhanced_colors(),
            selection: self.cache.selection().map(Arc::clone),
            clustering: self.cache.clustering().map(Arc::clone),
        }
    }
}

/// Drives one workflow instance against the three backend services.
///
/// Constructed from dependency-injected client instances so tests can
/// substitute mocks. All entry points take `&self`; the orchestrator is
/// safe to share behind an `Arc`.
pub struct WorkflowOrchestrator {
    processing_client: Arc<dyn ImageProcessingClient>,
    clustering_client: Arc<dyn ClusteringClient>,
    export_client: Arc<dyn DxfExportClient>,
    state: Mutex<WorkflowState>,
}

impl WorkflowOrchestrator {
    /// Create an orchestrator at the Upload stage with an empty cache
    pub fn new(
        processing_client: Arc<dyn ImageProcessingClient>,
        clustering_client: Arc<dyn ClusteringClient>,
        export_client: Arc<dyn DxfExportClient>,
    ) -> Self {
        Self {
            processing_client,
            clustering_client,
            export_client,
            state: Mutex::new(WorkflowState::new()),
        }
    }

    /// The current immutable view of the workflow
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.lock().snapshot()
    }

    /// `Upload -> Enhancement`. Uploads the image; on success the new
    /// processing result replaces the old one and everything downstream is
    /// discarded. On failure the stage and cache are untouched.
    pub async fn submit_image(&self, file: UploadFile) -> WorkflowResult<WorkflowSnapshot> {
        let generation = self.begin(WorkflowStage::Upload, "submit_image")?;

        if let Err(err) = file.validate() {
            return Err(self.fail(generation, err));
        }

        info!(file_name = %file.file_name, "Submitting image");
        match self.processing_client.process_image(&file).await {
            Ok(result) => {
                if let Err(err) = result.validate() {
                    return Err(self.fail(generation, err));
                }
                self.commit(generation, |state| {
                    state.cache.replace_processing(result);
                    state.stage = WorkflowStage::Enhancement;
                    info!(
                        session_id = state.cache.processing().map(|p| p.session_id.as_str()).unwrap_or(""),
                        "Image accepted"
                    );
                    state.snapshot()
                })
            }
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    /// Method names selectable in the Enhancement stage, fetching and
    /// caching the color set for the current session when necessary
    pub async fn enhancement_methods(&self) -> WorkflowResult<Vec<String>> {
        let generation = self.begin(WorkflowStage::Enhancement, "enhancement_methods")?;

        let processing = match self.current_processing() {
            Some(processing) => processing,
            None => {
                return Err(self.missing_artifact(generation, "no processed image available"))
            }
        };

        match self.ensure_enhanced_colors(generation, &processing).await {
            Ok(colors) => {
                self.commit(generation, |_state| colors.enhancement_methods.clone())
            }
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    /// `Enhancement -> Clustering`. Reuses the cached color set for the
    /// current session when present; otherwise fetches and caches it first.
    /// A method name absent from the set fails with `InvalidSelection` and
    /// issues no further network call.
    pub async fn select_method(&self, method: &str) -> WorkflowResult<WorkflowSnapshot> {
        let generation = self.begin(WorkflowStage::Enhancement, "select_method")?;

        let processing = match self.current_processing() {
            Some(processing) => processing,
            None => {
                return Err(self.missing_artifact(generation, "no processed image available"))
            }
        };

        let colors = match self.ensure_enhanced_colors(generation, &processing).await {
            Ok(colors) => colors,
            Err(err) => return Err(self.fail(generation, err)),
        };

        match EnhancementSelection::build(method, &colors, &processing.bed_data) {
            Ok(selection) => self.commit(generation, |state| {
                state.cache.store_selection(selection);
                state.stage = WorkflowStage::Clustering;
                info!(%method, "Enhancement method selected");
                state.snapshot()
            }),
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    /// `Clustering -> Results`. Submits the user-drawn assignment; on
    /// failure the stage is unchanged and the assignment (owned by the
    /// presentation layer) survives for resubmission.
    pub async fn submit_assignment(
        &self,
        assignment: &ManualClusterAssignment,
    ) -> WorkflowResult<WorkflowSnapshot> {
        let generation = self.begin(WorkflowStage::Clustering, "submit_assignment")?;

        let (processing, selection) = {
            let state = self.state.lock();
            (
                state.cache.processing().map(Arc::clone),
                state.cache.selection().map(Arc::clone),
            )
        };
        let processing = match processing {
            Some(processing) => processing,
            None => {
                return Err(self.missing_artifact(generation, "no processed image available"))
            }
        };
        let selection = match selection {
            Some(selection) => selection,
            None => {
                return Err(self.missing_artifact(
                    generation,
                    "no enhancement selection; pick a method first",
                ))
            }
        };
        if processing.bed_data.is_empty() {
            return Err(
                self.missing_artifact(generation, "the processed image has no beds to cluster")
            );
        }

        info!(clusters = assignment.len(), "Submitting cluster assignment");
        match self
            .clustering_client
            .process_clustering(&processing.bed_data, &selection.color_set, assignment)
            .await
        {
            Ok(result) => {
                if let Err(err) = result.validate(processing.bed_data.len()) {
                    return Err(self.fail(generation, err));
                }
                self.commit(generation, |state| {
                    state.cache.store_clustering(result);
                    state.stage = WorkflowStage::Results;
                    state.snapshot()
                })
            }
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    /// `Results -> Results` (self-transition). Validates the export
    /// preconditions first; a `can_export = false` answer is surfaced as
    /// `ExportBlocked` and the export call is never made. The artifact is
    /// handed to the caller for delivery and never cached.
    pub async fn export(&self, export_type: ExportType) -> WorkflowResult<ExportArtifact> {
        let generation = self.begin(WorkflowStage::Results, "export")?;

        let (processing, clustering) = {
            let state = self.state.lock();
            (
                state.cache.processing().map(Arc::clone),
                state.cache.clustering().map(Arc::clone),
            )
        };
        let processing = match processing {
            Some(processing) => processing,
            None => {
                return Err(self.missing_artifact(generation, "no processed image available"))
            }
        };
        let clustering = match clustering {
            Some(clustering) => clustering,
            None => {
                return Err(self.missing_artifact(generation, "no clustering result available"))
            }
        };

        let cluster_dict = clustering.cluster_dict();

        let validation = match self
            .export_client
            .validate_export(&processing.bed_data, &cluster_dict)
            .await
        {
            Ok(validation) => validation,
            Err(err) => return Err(self.fail(generation, err)),
        };
        if !validation.can_export {
            return Err(self.fail(
                generation,
                WorkflowError::ExportBlocked {
                    messages: validation.messages,
                },
            ));
        }

        match self
            .export_client
            .export_dxf(&processing.bed_data, &cluster_dict, export_type)
            .await
        {
            Ok(artifact) => self.commit(generation, |_state| {
                info!(file_name = %artifact.file_name, "Export complete");
                artifact
            }),
            Err(err) => Err(self.fail(generation, err)),
        }
    }

    /// One explicit backward step, clearing exactly the artifacts strictly
    /// downstream of the target stage. Permitted while a call is in flight:
    /// the pending call is cancelled by bumping the workflow generation.
    pub fn go_back(&self) -> WorkflowResult<WorkflowSnapshot> {
        let mut state = self.state.lock();
        let target = match state.stage.previous() {
            Some(target) => target,
            None => {
                return Err(WorkflowError::InvalidTransition(
                    "already at the Upload stage".to_string(),
                ))
            }
        };
        if state.loading {
            state.generation += 1;
            state.loading = false;
        }
        state.last_error = None;
        state.cache.invalidate_downstream_of(target);
        state.stage = target;
        info!(stage = %state.stage, "Navigated back");
        Ok(state.snapshot())
    }

    /// Return to Upload with every cached artifact cleared — equivalent to
    /// starting a new session. Permitted while a call is in flight.
    pub fn reset(&self) -> WorkflowSnapshot {
        let mut state = self.state.lock();
        state.generation += 1;
        state.loading = false;
        state.last_error = None;
        state.cache.clear();
        state.stage = WorkflowStage::Upload;
        info!("Workflow reset");
        state.snapshot()
    }

    /// Best-effort deletion of the active backend session followed by a
    /// local reset. A backend failure to delete is logged, never surfaced.
    pub async fn end_session(&self) -> WorkflowSnapshot {
        let session_id = {
            self.state
                .lock()
                .cache
                .processing()
                .map(|p| p.session_id.clone())
        };
        if let Some(session_id) = session_id {
            if let Err(err) = self.processing_client.delete_session(&session_id).await {
                warn!(%session_id, error = %err, "Failed to delete backend session");
            }
        }
        self.reset()
    }

    /// Probe all three services concurrently. Read-only: touches neither
    /// the loading flag nor the cache, and is the only place two remote
    /// calls run at the same time.
    pub async fn check_services(&self) -> ServiceHealthReport {
        let (processing, clustering, export) = futures::join!(
            self.processing_client.health(),
            self.clustering_client.health(),
            self.export_client.health(),
        );
        ServiceHealthReport {
            processing: ServiceAvailability::from_probe(processing),
            clustering: ServiceAvailability::from_probe(clustering),
            export: ServiceAvailability::from_probe(export),
        }
    }

    fn current_processing(&self) -> Option<Arc<ProcessingResult>> {
        self.state.lock().cache.processing().map(Arc::clone)
    }

    /// Cached color set for the session, or a fresh fetch cached under the
    /// generation the caller began with
    async fn ensure_enhanced_colors(
        &self,
        generation: u64,
        processing: &Arc<ProcessingResult>,
    ) -> WorkflowResult<Arc<EnhancedColorSet>> {
        let cached = {
            self.state
                .lock()
                .cache
                .enhanced_colors_for(&processing.session_id)
        };
        if let Some(set) = cached {
            debug!(session_id = %processing.session_id, "Reusing cached enhanced colors");
            return Ok(set);
        }

        let set = self
            .clustering_client
            .create_enhanced_colors(&processing.bed_data)
            .await?;
        set.validate(processing.bed_data.len())?;

        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(superseded());
        }
        Ok(state
            .cache
            .store_enhanced_colors(&processing.session_id, set))
    }

    /// Gate a transition entry point: reject while a call is in flight or
    /// from the wrong stage, otherwise raise the loading flag and return
    /// the generation the transition was issued against.
    fn begin(&self, expected: WorkflowStage, operation: &str) -> WorkflowResult<u64> {
        let mut state = self.state.lock();
        if state.loading {
            return Err(WorkflowError::InvalidTransition(format!(
                "{} rejected: a remote call is already in flight",
                operation
            )));
        }
        if state.stage != expected {
            return Err(WorkflowError::InvalidTransition(format!(
                "{} is not available in the {} stage",
                operation, state.stage
            )));
        }
        state.loading = true;
        state.last_error = None;
        Ok(state.generation)
    }

    /// Settle a failed transition: record the user-facing message and drop
    /// the loading flag, unless the workflow moved on in the meantime.
    fn fail(&self, generation: u64, error: WorkflowError) -> WorkflowError {
        let mut state = self.state.lock();
        if state.generation == generation {
            state.loading = false;
            state.last_error = Some(error.to_string());
            warn!(stage = %state.stage, error = %error, "Transition failed");
        }
        error
    }

    /// Settle a successful transition, discarding the result when the
    /// workflow generation it was issued against is no longer current.
    fn commit<T>(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut WorkflowState) -> T,
    ) -> WorkflowResult<T> {
        let mut state = self.state.lock();
        if state.generation != generation {
            return Err(superseded());
        }
        state.loading = false;
        Ok(apply(&mut state))
    }

    fn missing_artifact(&self, generation: u64, detail: &str) -> WorkflowError {
        self.fail(
            generation,
            WorkflowError::InvalidTransition(detail.to_string()),
        )
    }
}

fn superseded() -> WorkflowError {
    WorkflowError::InvalidTransition(
        "the workflow was reset while the call was in flight; the result was discarded"
            .to_string(),
    )
}
