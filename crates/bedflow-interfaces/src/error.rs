//! Error types for the bedflow workflow
//!
//! Every failure a transition can surface to the presentation layer is one
//! of the variants below; the orchestrator converts each into a single
//! user-facing message string and leaves the active stage unchanged.

use thiserror::Error;

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while driving the workflow
#[derive(Error, Debug, Clone)]
pub enum WorkflowError {
    /// No response received from a backend service. `timeout` distinguishes
    /// an expired per-call budget from a connection failure.
    #[error("Network error: {message}")]
    NetworkError {
        /// Human-readable description of the transport failure
        message: String,
        /// True when the per-call timeout budget expired
        timeout: bool,
    },

    /// Backend returned an HTTP error status
    #[error("Service error from {service} (status {status}): {message}")]
    ServiceError {
        /// Logical service name (`image-processing`, `clustering`, `dxf-export`)
        service: String,
        /// HTTP status code
        status: u16,
        /// Backend-provided message when present, otherwise a generic one
        message: String,
    },

    /// Response received but fails structural validation against the contract
    #[error("Malformed response from {service}: {detail}")]
    MalformedResponse {
        /// Logical service name
        service: String,
        /// What failed validation (missing field, row-count mismatch, ...)
        detail: String,
    },

    /// Enhancement method not present in the current color set
    #[error("Invalid enhancement selection: {0}")]
    InvalidSelection(String),

    /// Export validation reported the workflow is not exportable. A normal,
    /// non-exceptional outcome, not a service failure.
    #[error("Export blocked: {}", .messages.join("; "))]
    ExportBlocked {
        /// Messages reported by the export service
        messages: Vec<String>,
    },

    /// Client-side upload precondition failed; no request was issued
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Entry point invoked from the wrong stage, while a call is in flight,
    /// or settled against a workflow that was reset in the meantime
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl WorkflowError {
    /// Check if the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, WorkflowError::NetworkError { timeout: true, .. })
    }

    /// Check if the error came back from a backend service (as opposed to a
    /// client-side precondition or transition failure)
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            WorkflowError::NetworkError { .. }
                | WorkflowError::ServiceError { .. }
                | WorkflowError::MalformedResponse { .. }
        )
    }

    /// Check if the error is the non-exceptional export-blocked outcome
    pub fn is_export_blocked(&self) -> bool {
        matches!(self, WorkflowError::ExportBlocked { .. })
    }
}
