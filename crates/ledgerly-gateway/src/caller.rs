//! Orchestration of a single logical request against the backend.

use crate::admission::AdmissionQueue;
use crate::circuit::CircuitBreaker;
use crate::error::CallFailure;
use crate::events::CallEvent;
use crate::stats::GatewayStats;
use crate::timeout::TimeoutPolicy;
use ledgerly_gateway_core::events::EventListeners;
use ledgerly_gateway_core::{AttemptRequest, BackendError, InferenceResponse, OperationKind};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::Service;

/// Drives one logical request to completion: admission, circuit gate,
/// deadline-bounded attempts, and backoff between retries.
///
/// The backend seam is any [`tower::Service`] taking [`AttemptRequest`];
/// production wires an HTTP client here, tests a `service_fn` double.
///
/// Outcome accounting per attempt is strict: exactly one of
/// `record_success`/`record_failure` reaches the breaker for every
/// network attempt that actually ran, and neither does for queue or
/// circuit short-circuits where the backend was never contacted.
pub struct RetryingCaller<S> {
    backend: S,
    breaker: Arc<CircuitBreaker>,
    admission: Arc<AdmissionQueue>,
    stats: Arc<GatewayStats>,
    policy: TimeoutPolicy,
    queue_timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
    name: String,
    listeners: EventListeners<CallEvent>,
}

impl<S> RetryingCaller<S> {
    /// Creates a caller sharing the given breaker, admission queue, and
    /// stats with the rest of the gateway.
    pub fn new(
        backend: S,
        breaker: Arc<CircuitBreaker>,
        admission: Arc<AdmissionQueue>,
        stats: Arc<GatewayStats>,
        config: &crate::config::GatewayConfig,
    ) -> Self {
        Self {
            backend,
            breaker,
            admission,
            stats,
            policy: config.policy.clone(),
            queue_timeout: config.queue_timeout,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
            name: config.name.clone(),
            listeners: config.call_listeners.clone(),
        }
    }

    /// Exponential backoff before retry `attempt + 1`: base, 2x, 4x, ...
    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.backoff_base * 2u32.saturating_pow(attempt)
    }
}

impl<S> RetryingCaller<S>
where
    S: Service<AttemptRequest, Response = InferenceResponse, Error = BackendError>
        + Clone
        + Send
        + Sync,
    S::Future: Send,
{
    /// Performs one logical request.
    ///
    /// The admission slot is held for the whole retry sequence
    /// (including backoff sleeps) and released on every exit path by
    /// the slot's drop.
    pub async fn call(
        &self,
        kind: OperationKind,
        payload: Arc<str>,
        is_cold_start: bool,
    ) -> Result<InferenceResponse, CallFailure> {
        let _slot = match self.admission.acquire(self.queue_timeout).await {
            Ok(slot) => slot,
            Err(timeout) => return Err(CallFailure::QueueSaturated(timeout)),
        };
        self.stats.record_admitted();

        let mut attempt: u32 = 0;
        loop {
            // The breaker is re-consulted before every attempt, so a
            // probe failure that reopens the circuit cuts the remaining
            // retries short instead of hammering a down backend.
            if !self.breaker.before_call().is_allowed() {
                return Err(CallFailure::CircuitOpen);
            }

            let deadline = self.policy.deadline_for(kind, attempt, is_cold_start);
            let request = AttemptRequest {
                kind,
                payload: Arc::clone(&payload),
                deadline,
                attempt,
            };

            let mut backend = self.backend.clone();
            let result = match tokio::time::timeout(deadline, backend.call(request)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(BackendError::Timeout),
            };

            match result {
                Ok(response) => {
                    self.breaker.record_success();
                    self.listeners.emit(&CallEvent::Succeeded {
                        instance: self.name.clone(),
                        timestamp: Instant::now(),
                        kind,
                        attempts: attempt + 1,
                    });
                    return Ok(response);
                }
                Err(err) if !err.is_transient() => {
                    // The caller's payload is at fault; retrying would
                    // waste attempts and mask the bug. Validation errors
                    // say nothing about backend health, so the breaker
                    // is not touched.
                    self.listeners.emit(&CallEvent::ClientRejected {
                        instance: self.name.clone(),
                        timestamp: Instant::now(),
                        kind,
                    });
                    return Err(CallFailure::ClientError(err));
                }
                Err(err) => {
                    self.breaker.record_failure();

                    if attempt >= self.max_retries {
                        self.listeners.emit(&CallEvent::Exhausted {
                            instance: self.name.clone(),
                            timestamp: Instant::now(),
                            kind,
                            attempts: attempt + 1,
                        });
                        return Err(CallFailure::Exhausted {
                            attempts: attempt + 1,
                            last: err,
                        });
                    }

                    let delay = self.backoff_delay(attempt);
                    self.stats.record_retry();
                    self.listeners.emit(&CallEvent::Retrying {
                        instance: self.name.clone(),
                        timestamp: Instant::now(),
                        kind,
                        attempt,
                        delay,
                    });

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        gateway = %self.name,
                        kind = kind.as_str(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient backend failure; backing off before retry"
                    );

                    #[cfg(feature = "metrics")]
                    metrics::counter!("gateway_retries_total", "gateway" => self.name.clone())
                        .increment(1);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
