//! Failure taxonomy at the inference backend seam.

use thiserror::Error;

/// Errors produced by a single attempt against the inference backend.
///
/// The split between transient and client errors drives two different
/// decisions upstream: transient failures are retried and count against
/// the circuit breaker; client errors are the caller's fault and do
/// neither.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The attempt did not complete within its deadline.
    #[error("backend did not answer within the deadline")]
    Timeout,

    /// The connection to the backend could not be established or broke.
    #[error("connection to backend failed: {0}")]
    Connection(String),

    /// The backend rejected the request as malformed (4xx-class).
    #[error("backend rejected the request ({status}): {message}")]
    Client { status: u16, message: String },

    /// The backend failed internally (5xx-class).
    #[error("backend internal error ({status}): {message}")]
    Server { status: u16, message: String },
}

impl BackendError {
    /// True for failures worth retrying: timeouts, connection failures,
    /// and backend-side (5xx) errors.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout | BackendError::Connection(_) | BackendError::Server { .. }
        )
    }

    /// True for failures that indicate backend malfunction and should be
    /// recorded against the circuit breaker. Validation (4xx) errors say
    /// nothing about backend health and are excluded.
    pub fn counts_against_breaker(&self) -> bool {
        self.is_transient()
    }
}
