//! Error types surfaced inside the gateway.

use ledgerly_gateway_core::BackendError;
use std::time::Duration;
use thiserror::Error;

/// A caller waited the full queue timeout without a slot becoming free.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no admission slot became available within {waited:?}")]
pub struct QueueTimeout {
    /// How long the caller waited before giving up.
    pub waited: Duration,
}

/// Why a logical request could not be answered by the backend.
///
/// Every variant is recovered by the gateway facade via the fallback
/// responder; none of them escape `handle()`.
#[derive(Debug, Clone, Error)]
pub enum CallFailure {
    /// Admission was denied; the backend was never contacted.
    #[error("admission queue saturated: {0}")]
    QueueSaturated(#[source] QueueTimeout),

    /// The circuit breaker rejected the call; the backend was never
    /// contacted.
    #[error("circuit open; backend presumed down")]
    CircuitOpen,

    /// The backend rejected the payload (4xx-class). Never retried and
    /// never counted against the breaker.
    #[error("backend rejected the payload: {0}")]
    ClientError(#[source] BackendError),

    /// All attempts were used up on transient failures.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of network attempts actually performed.
        attempts: u32,
        /// The failure observed on the final attempt.
        #[source]
        last: BackendError,
    },
}

impl CallFailure {
    /// Stable name for metric labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallFailure::QueueSaturated(_) => "queue_saturated",
            CallFailure::CircuitOpen => "circuit_open",
            CallFailure::ClientError(_) => "client_error",
            CallFailure::Exhausted { .. } => "exhausted",
        }
    }
}

/// Malformed input detected before any network attempt.
///
/// This is a contract error on the caller's side, not an operational
/// failure, and is the only error `Gateway::handle` surfaces.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidRequest {
    /// The payload was empty or whitespace-only.
    #[error("payload must not be empty for {kind} requests")]
    EmptyPayload {
        kind: ledgerly_gateway_core::OperationKind,
    },
}
