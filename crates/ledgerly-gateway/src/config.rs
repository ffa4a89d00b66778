//! Gateway configuration.

use crate::circuit::CircuitState;
use crate::events::{AdmissionEvent, CallEvent, CircuitEvent};
use crate::timeout::TimeoutPolicy;
use ledgerly_gateway_core::events::{EventListeners, FnListener};
use ledgerly_gateway_core::OperationKind;
use std::time::Duration;

/// Configuration for a gateway instance.
///
/// Defaults are tuned for a single slow, memory-constrained backend:
/// three concurrent calls (headroom below the backend's true maximum
/// for cold-start memory spikes), a 30s admission wait, the breaker
/// opening after 3 consecutive failures with a 30s cooldown, and two
/// retries on a 0.5s/1s backoff schedule.
#[derive(Clone)]
pub struct GatewayConfig {
    pub(crate) name: String,
    pub(crate) max_concurrency: usize,
    pub(crate) queue_timeout: Duration,
    pub(crate) failure_threshold: u32,
    pub(crate) cooldown_period: Duration,
    pub(crate) max_retries: u32,
    pub(crate) backoff_base: Duration,
    pub(crate) cold_start_after: Duration,
    pub(crate) policy: TimeoutPolicy,
    pub(crate) circuit_listeners: EventListeners<CircuitEvent>,
    pub(crate) admission_listeners: EventListeners<AdmissionEvent>,
    pub(crate) call_listeners: EventListeners<CallEvent>,
}

impl GatewayConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for gateway configuration.
pub struct GatewayConfigBuilder {
    name: String,
    max_concurrency: usize,
    queue_timeout: Duration,
    failure_threshold: u32,
    cooldown_period: Duration,
    max_retries: u32,
    backoff_base: Duration,
    cold_start_after: Duration,
    policy: TimeoutPolicy,
    circuit_listeners: EventListeners<CircuitEvent>,
    admission_listeners: EventListeners<AdmissionEvent>,
    call_listeners: EventListeners<CallEvent>,
}

impl GatewayConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            name: "gateway".to_string(),
            max_concurrency: 3,
            queue_timeout: Duration::from_secs(30),
            failure_threshold: 3,
            cooldown_period: Duration::from_secs(30),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
            cold_start_after: Duration::from_secs(300),
            policy: TimeoutPolicy::default(),
            circuit_listeners: EventListeners::new(),
            admission_listeners: EventListeners::new(),
            call_listeners: EventListeners::new(),
        }
    }

    /// Sets the name of this gateway instance, used in events, log
    /// fields, and metric labels.
    ///
    /// Default: "gateway"
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of concurrent inference calls.
    ///
    /// Default: 3
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Sets how long a caller may wait for an admission slot.
    ///
    /// Default: 30s
    pub fn queue_timeout(mut self, timeout: Duration) -> Self {
        self.queue_timeout = timeout;
        self
    }

    /// Sets how many consecutive failures open the circuit.
    ///
    /// Default: 3
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets how long the circuit stays open before a recovery probe is
    /// permitted.
    ///
    /// Default: 30s
    pub fn cooldown_period(mut self, period: Duration) -> Self {
        self.cooldown_period = period;
        self
    }

    /// Sets the number of retries after the initial attempt.
    ///
    /// Default: 2 (up to 3 network attempts per logical request)
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the first backoff delay; each further retry doubles it.
    ///
    /// Default: 500ms
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Sets how long the backend must sit idle before the next request
    /// is treated as a cold start for timeout purposes.
    ///
    /// Default: 300s
    pub fn cold_start_after(mut self, idle: Duration) -> Self {
        self.cold_start_after = idle;
        self
    }

    /// Replaces the per-operation deadline policy wholesale.
    pub fn timeout_policy(mut self, policy: TimeoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the base deadline for health-check calls. Default: 5s
    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.policy.health = timeout;
        self
    }

    /// Sets the base deadline for parse calls. Default: 15s
    pub fn parse_timeout(mut self, timeout: Duration) -> Self {
        self.policy.parse = timeout;
        self
    }

    /// Sets the base deadline for chat calls. Default: 30s
    pub fn chat_timeout(mut self, timeout: Duration) -> Self {
        self.policy.chat = timeout;
        self
    }

    /// Sets the base deadline for analyze calls. Default: 60s
    pub fn analyze_timeout(mut self, timeout: Duration) -> Self {
        self.policy.analyze = timeout;
        self
    }

    /// Sets the deadline used when the backend must load model weights
    /// after idle. Default: 90s
    pub fn cold_start_timeout(mut self, timeout: Duration) -> Self {
        self.policy.cold_start = timeout;
        self
    }

    /// Registers a callback for circuit state transitions.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.circuit_listeners.add(FnListener::new(move |event| {
            if let CircuitEvent::StateTransition { from, to, .. } = event {
                f(*from, *to);
            }
        }));
        self
    }

    /// Registers a callback when the circuit breaker rejects a call.
    pub fn on_circuit_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.circuit_listeners.add(FnListener::new(move |event| {
            if let CircuitEvent::CallRejected { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a callback when a caller acquires an admission slot,
    /// with the in-flight count after acquisition.
    pub fn on_slot_acquired<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.admission_listeners.add(FnListener::new(move |event| {
            if let AdmissionEvent::SlotAcquired { in_flight, .. } = event {
                f(*in_flight);
            }
        }));
        self
    }

    /// Registers a callback when a caller gives up waiting for a slot,
    /// with the time it waited.
    pub fn on_queue_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.admission_listeners.add(FnListener::new(move |event| {
            if let AdmissionEvent::QueueTimeout { waited, .. } = event {
                f(*waited);
            }
        }));
        self
    }

    /// Registers a callback before each backoff sleep, with the attempt
    /// number that failed and the upcoming delay.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.call_listeners.add(FnListener::new(move |event| {
            if let CallEvent::Retrying { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback when a degraded response is served.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(OperationKind) + Send + Sync + 'static,
    {
        self.call_listeners.add(FnListener::new(move |event| {
            if let CallEvent::FallbackServed { kind, .. } = event {
                f(*kind);
            }
        }));
        self
    }

    /// Builds the configuration.
    ///
    /// # Panics
    ///
    /// Panics if `max_concurrency` or `failure_threshold` is zero; both
    /// would make the gateway reject every request unconditionally,
    /// which is always a configuration bug.
    pub fn build(self) -> GatewayConfig {
        assert!(
            self.max_concurrency >= 1,
            "max_concurrency must be at least 1"
        );
        assert!(
            self.failure_threshold >= 1,
            "failure_threshold must be at least 1"
        );
        GatewayConfig {
            name: self.name,
            max_concurrency: self.max_concurrency,
            queue_timeout: self.queue_timeout,
            failure_threshold: self.failure_threshold,
            cooldown_period: self.cooldown_period,
            max_retries: self.max_retries,
            backoff_base: self.backoff_base,
            cold_start_after: self.cold_start_after,
            policy: self.policy,
            circuit_listeners: self.circuit_listeners,
            admission_listeners: self.admission_listeners,
            call_listeners: self.call_listeners,
        }
    }
}

impl Default for GatewayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
