//! The gateway facade: the single entry point route handlers use.

use crate::admission::AdmissionQueue;
use crate::caller::RetryingCaller;
use crate::circuit::{CircuitBreaker, CircuitState};
use crate::config::GatewayConfig;
use crate::error::{CallFailure, InvalidRequest};
use crate::events::CallEvent;
use crate::fallback::FallbackResponder;
use crate::stats::{GatewayStats, GatewayStatsSnapshot};
use ledgerly_gateway_core::events::EventListeners;
use ledgerly_gateway_core::{AttemptRequest, BackendError, InferenceResponse, OperationKind};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tower::Service;

/// Resilience-controlled facade over the inference backend.
///
/// `handle` always returns a well-formed response for any operational
/// outcome: real answers when the backend cooperates, degraded
/// rule-based answers when it does not. The only error it surfaces is
/// malformed input, which is a contract bug on the caller's side and
/// is detected before any network attempt.
///
/// All shared state (circuit, admission counters, stats) is owned here
/// and injected into the components at construction; there are no
/// process-global singletons.
pub struct Gateway<S> {
    caller: RetryingCaller<S>,
    fallback: FallbackResponder,
    breaker: Arc<CircuitBreaker>,
    admission: Arc<AdmissionQueue>,
    stats: Arc<GatewayStats>,
    cold_start_after: Duration,
    last_backend_activity: Mutex<Option<Instant>>,
    name: String,
    call_listeners: EventListeners<CallEvent>,
}

impl<S> Gateway<S> {
    /// Creates a gateway from a backend service and configuration.
    pub fn new(backend: S, config: GatewayConfig) -> Self {
        let breaker = Arc::new(CircuitBreaker::new(
            config.name.clone(),
            config.failure_threshold,
            config.cooldown_period,
            config.circuit_listeners.clone(),
        ));
        let admission = Arc::new(AdmissionQueue::new(
            config.name.clone(),
            config.max_concurrency,
            config.admission_listeners.clone(),
        ));
        let stats = Arc::new(GatewayStats::default());
        let caller = RetryingCaller::new(
            backend,
            Arc::clone(&breaker),
            Arc::clone(&admission),
            Arc::clone(&stats),
            &config,
        );
        Self {
            caller,
            fallback: FallbackResponder::new(),
            breaker,
            admission,
            stats,
            cold_start_after: config.cold_start_after,
            last_backend_activity: Mutex::new(None),
            name: config.name,
            call_listeners: config.call_listeners,
        }
    }

    /// Read-only snapshot of the gateway counters, circuit state, and
    /// in-flight count. Repeated calls without intervening requests
    /// return identical snapshots.
    pub fn stats(&self) -> GatewayStatsSnapshot {
        self.stats
            .snapshot(self.breaker.state(), self.admission.in_flight())
    }

    /// Clears the process-lifetime counters. Operator action only.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Current circuit state, read lock-free.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// Handle to the circuit breaker for operator controls
    /// (`force_open`, `reset`).
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// True if the backend has been idle long enough that the next
    /// attempt must budget for loading model weights.
    fn is_cold_start(&self) -> bool {
        self.last_backend_activity
            .lock()
            .expect("activity lock poisoned")
            .map_or(true, |last| last.elapsed() >= self.cold_start_after)
    }

    fn mark_backend_warm(&self) {
        *self
            .last_backend_activity
            .lock()
            .expect("activity lock poisoned") = Some(Instant::now());
    }
}

impl<S> Gateway<S>
where
    S: Service<AttemptRequest, Response = InferenceResponse, Error = BackendError>
        + Clone
        + Send
        + Sync,
    S::Future: Send,
{
    /// Answers one assistant request.
    ///
    /// Operational failures (queue saturation, open circuit, backend
    /// rejection, exhausted retries) are converted into degraded
    /// fallback responses; they never surface as errors. The relevant
    /// stat counter is bumped on every path.
    pub async fn handle(
        &self,
        kind: OperationKind,
        payload: &str,
    ) -> Result<InferenceResponse, InvalidRequest> {
        if kind != OperationKind::Health && payload.trim().is_empty() {
            return Err(InvalidRequest::EmptyPayload { kind });
        }

        let is_cold_start = self.is_cold_start();
        match self
            .caller
            .call(kind, Arc::from(payload), is_cold_start)
            .await
        {
            Ok(response) => {
                self.mark_backend_warm();
                Ok(response)
            }
            Err(failure) => {
                match &failure {
                    CallFailure::QueueSaturated(_) => self.stats.record_queue_timeout(),
                    CallFailure::CircuitOpen => self.stats.record_circuit_rejection(),
                    // A 4xx proves the backend is up and answering.
                    CallFailure::ClientError(_) => self.mark_backend_warm(),
                    CallFailure::Exhausted { .. } => {}
                }

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    gateway = %self.name,
                    kind = kind.as_str(),
                    reason = failure.as_str(),
                    "serving degraded fallback response"
                );

                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "gateway_fallbacks_total",
                    "gateway" => self.name.clone(),
                    "reason" => failure.as_str()
                )
                .increment(1);

                self.stats.record_fallback();
                self.call_listeners.emit(&CallEvent::FallbackServed {
                    instance: self.name.clone(),
                    timestamp: Instant::now(),
                    kind,
                });

                Ok(self.fallback.respond(kind, payload))
            }
        }
    }
}
