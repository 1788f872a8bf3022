//! Shared error normalization for the HTTP adapters.

use bedflow_interfaces::WorkflowError;
use serde_json::Value;

/// Maps a transport-level reqwest error (no usable response) onto the
/// workflow taxonomy. Timeout and connection failures both become
/// `NetworkError`; the `timeout` flag tells them apart.
pub(crate) fn map_transport_error(service: &str, error: reqwest::Error) -> WorkflowError {
    if error.is_timeout() {
        WorkflowError::NetworkError {
            message: format!("request to {} timed out: {}", service, error),
            timeout: true,
        }
    } else if error.is_connect() {
        WorkflowError::NetworkError {
            message: format!("could not connect to {}: {}", service, error),
            timeout: false,
        }
    } else {
        WorkflowError::NetworkError {
            message: format!("request to {} failed: {}", service, error),
            timeout: false,
        }
    }
}

/// Builds a `ServiceError` from an HTTP error status, extracting the
/// backend-provided message when the body carries one (`detail`, `error`,
/// or `message` keys), falling back to the raw body text.
pub(crate) fn service_error(service: &str, status: u16, body: &str) -> WorkflowError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                format!("HTTP status {}", status)
            } else {
                body.to_string()
            }
        });

    WorkflowError::ServiceError {
        service: service.to_string(),
        status,
        message,
    }
}

/// Wraps a deserialization failure as a `MalformedResponse`
pub(crate) fn malformed(service: &str, error: impl std::fmt::Display) -> WorkflowError {
    WorkflowError::MalformedResponse {
        service: service.to_string(),
        detail: format!("failed to parse response: {}", error),
    }
}
