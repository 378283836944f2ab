//! Lifecycle Controller
//!
//! Orchestrates the upload → analyze and classify → append workflows and
//! status transitions, turning service responses into collection changes.
//!
//! Status changes are optimistic: the local record is updated before the
//! service is told, and is not rolled back if the service call fails. The
//! next successful refresh is what reconciles the two views.
//!
//! All methods take `&self`. Independent workflows may be in flight at the
//! same time; the last write to the collection wins.

use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::collection::RequirementCollection;
use crate::error::{DashboardError, Operation};
use crate::models::{RecordPatch, RequirementRecord, ReviewStatus, UploadFile};
use crate::pending::PendingUploadCache;
use crate::service::{RequirementsService, ServiceError};
use crate::stats::{StatsReconciler, StatsSnapshot, StatsSource};

/// Outcome of a status change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Applied locally and acknowledged by the service
    Confirmed,
    /// No record at that index, or the record has no id
    Skipped,
}

#[derive(Debug, Default)]
struct DashboardState {
    requirements: RequirementCollection,
    pending: PendingUploadCache,
    stats: StatsReconciler,
    selected: Option<UploadFile>,
}

/// Owns the dashboard state and drives every workflow that changes it
pub struct LifecycleController {
    service: Arc<dyn RequirementsService>,
    state: Mutex<DashboardState>,
}

impl LifecycleController {
    pub fn new(service: Arc<dyn RequirementsService>, stats_source: StatsSource) -> Self {
        Self {
            service,
            state: Mutex::new(DashboardState {
                stats: StatsReconciler::new(stats_source),
                ..Default::default()
            }),
        }
    }

    // The lock is never held across an await, so a poisoned lock still
    // guards consistent data.
    fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All records in collection order
    pub fn records(&self) -> Vec<RequirementRecord> {
        self.state().requirements.all().to_vec()
    }

    /// Records with non-blank text, paired with their collection index
    pub fn visible_records(&self) -> Vec<(usize, RequirementRecord)> {
        self.state()
            .requirements
            .visible()
            .map(|(i, r)| (i, r.clone()))
            .collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.state().stats.snapshot()
    }

    pub fn pending_upload(&self) -> Option<String> {
        self.state().pending.get().map(str::to_string)
    }

    /// Name of the currently selected file
    pub fn selected_file(&self) -> Option<String> {
        self.state().selected.as_ref().map(|f| f.name.clone())
    }

    // =========================================================================
    // File selection and pending uploads
    // =========================================================================

    pub fn select_file(&self, file: UploadFile) {
        self.state().selected = Some(file);
    }

    /// Runs upload and analysis on the selected file, emptying the selection
    pub async fn submit_selected(&self) -> Result<usize, DashboardError> {
        let file = self.state().selected.take();
        self.upload_and_analyze(file).await
    }

    /// Seeds the pending slot from an outer persistence layer
    pub fn restore_pending(&self, filename: impl Into<String>) {
        self.state().pending.set(filename);
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Uploads `file`, then replaces the collection with its analysis.
    ///
    /// Returns the number of records now in the collection. On failure the
    /// collection is left as it was. The pending filename is cleared once
    /// analysis has been attempted, and the selection slot is always
    /// cleared.
    pub async fn upload_and_analyze(&self, file: Option<UploadFile>) -> Result<usize, DashboardError> {
        let result = match self.upload_file(file).await {
            Ok(filename) => self.analyze_file(&filename).await,
            Err(e) => Err(e),
        };
        self.state().selected = None;
        result
    }

    /// Uploads `file` and remembers it as pending without analyzing it
    pub async fn upload_only(&self, file: Option<UploadFile>) -> Result<String, DashboardError> {
        self.upload_file(file).await
    }

    /// Analyzes the pending upload
    pub async fn analyze_pending(&self) -> Result<usize, DashboardError> {
        let filename = self
            .pending_upload()
            .ok_or_else(DashboardError::no_pending_upload)?;
        self.analyze_file(&filename).await
    }

    /// Classifies `text` and appends it as a new record in `Review`.
    ///
    /// Empty text is not rejected here; it is forwarded as is.
    pub async fn classify_and_append(&self, text: &str) -> Result<RequirementRecord, DashboardError> {
        let response = self.service.classify(text).await.map_err(|e| {
            warn!("Classification failed: {}", e);
            DashboardError::remote(Operation::Classification, e)
        })?;

        let id = response
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let record = RequirementRecord::new(Some(id), text.to_string(), response.categories());

        {
            let mut state = self.state();
            state.requirements.append(record.clone());
            info!(
                "Appended classified requirement ({} total)",
                state.requirements.len()
            );
        }

        self.refresh_stats().await;
        Ok(record)
    }

    /// Sets the status of the record at `index`.
    ///
    /// The local record changes first. If the service then fails, the local
    /// change stays and the error is returned.
    pub async fn set_status(
        &self,
        index: usize,
        status: ReviewStatus,
    ) -> Result<StatusChange, DashboardError> {
        let id = {
            let mut state = self.state();
            let Some(id) = state.requirements.get(index).and_then(|r| r.id.clone()) else {
                debug!("Ignoring status change for index {}: no identified record", index);
                return Ok(StatusChange::Skipped);
            };
            state.requirements.update_at(index, RecordPatch::status(status));
            id
        };

        match self.service.update_status(&id, status).await {
            Ok(()) => {
                info!("Requirement {} set to {}", id, status);
                self.refresh_stats().await;
                Ok(StatusChange::Confirmed)
            }
            Err(e) => {
                warn!(
                    "Status update for {} failed, local status {} kept: {}",
                    id, status, e
                );
                Err(DashboardError::remote(Operation::StatusUpdate, e))
            }
        }
    }

    /// Refreshes the stats snapshot from the configured source.
    ///
    /// Failures are logged and the previous snapshot kept. Returns whether
    /// the snapshot was replaced.
    pub async fn refresh_stats(&self) -> bool {
        let source = self.state().stats.source();
        match source {
            StatsSource::Remote => {
                let result = self.service.stats().await;
                self.state().stats.apply_remote(result)
            }
            StatsSource::Local => {
                let mut guard = self.state();
                let state = &mut *guard;
                state.stats.recompute(state.requirements.all());
                true
            }
        }
    }

    // =========================================================================
    // Steps
    // =========================================================================

    async fn upload_file(&self, file: Option<UploadFile>) -> Result<String, DashboardError> {
        let file = file.ok_or_else(DashboardError::no_file_selected)?;

        let response = self.service.upload(&file).await.map_err(|e| {
            warn!("Upload of {} failed: {}", file.name, e);
            DashboardError::remote(Operation::Upload, e)
        })?;

        let Some(filename) = response.filename().map(str::to_string) else {
            warn!("Upload of {} returned no filename", file.name);
            return Err(DashboardError::remote(
                Operation::Upload,
                ServiceError::MissingField("filename"),
            ));
        };

        info!("Uploaded {} as {}", file.name, filename);
        self.state().pending.set(filename.clone());
        Ok(filename)
    }

    async fn analyze_file(&self, filename: &str) -> Result<usize, DashboardError> {
        let result = self.service.analyze(filename).await;

        let count = {
            let mut state = self.state();
            state.pending.clear_if(filename);
            match result {
                Ok(response) => {
                    state.requirements.replace_all(response.into_records());
                    info!(
                        "Analysis of {} produced {} requirements",
                        filename,
                        state.requirements.len()
                    );
                    state.requirements.len()
                }
                Err(e) => {
                    warn!("Analysis of {} failed: {}", filename, e);
                    return Err(DashboardError::remote(Operation::Analysis, e));
                }
            }
        };

        self.refresh_stats().await;
        Ok(count)
    }
}
