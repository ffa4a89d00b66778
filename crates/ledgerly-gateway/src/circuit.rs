//! Consecutive-failure circuit breaker guarding the inference backend.
//!
//! ## States
//! - **Closed**: normal operation, all calls permitted
//! - **Open**: backend presumed down, calls rejected without a network
//!   attempt until the cooldown elapses
//! - **Half-Open**: exactly one probe call is allowed to test recovery
//!
//! The breaker tracks *consecutive* failures. The backend behind this
//! gateway is a single slow instance: a handful of back-to-back
//! timeouts means it is down or thrashing, and continuing to send
//! multi-second requests at it only makes things worse.

use crate::events::CircuitEvent;
use ledgerly_gateway_core::events::EventListeners;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a single probe is allowed.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Stable name for metric labels and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Whether a call may proceed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDecision {
    /// Proceed with the network attempt.
    Allowed,
    /// Fail fast; the backend must not be contacted.
    Rejected,
}

impl CallDecision {
    /// True if the call may proceed.
    pub fn is_allowed(&self) -> bool {
        matches!(self, CallDecision::Allowed)
    }
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    last_transition: Instant,
    probe_in_flight: bool,
}

/// The circuit breaker shared by all logical requests of one gateway.
///
/// All mutation happens under a single mutex with short, await-free
/// critical sections; the current state is mirrored into an atomic so
/// monitoring paths can read it without contending on the lock.
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    state_atomic: AtomicU8,
    failure_threshold: u32,
    cooldown_period: Duration,
    name: String,
    listeners: EventListeners<CircuitEvent>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("cooldown_period", &self.cooldown_period)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a breaker that opens after `failure_threshold`
    /// consecutive failures and probes again after `cooldown_period`.
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        cooldown_period: Duration,
        listeners: EventListeners<CircuitEvent>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_transition: Instant::now(),
                probe_in_flight: false,
            }),
            state_atomic: AtomicU8::new(CircuitState::Closed as u8),
            failure_threshold,
            cooldown_period,
            name: name.into(),
            listeners,
        }
    }

    /// Current state, read lock-free.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// True if the circuit is currently open.
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Number of consecutive failures recorded since the last success
    /// or the last time the breaker closed.
    pub fn consecutive_failures(&self) -> u32 {
        self.inner.lock().expect("circuit lock poisoned").consecutive_failures
    }

    /// Gate called before every network attempt.
    ///
    /// In the open state this is also where the cooldown is evaluated:
    /// the first caller past the cooldown boundary transitions the
    /// breaker to half-open and becomes the probe; everyone else in the
    /// same instant is still rejected.
    ///
    /// Listeners fire after the lock is released, so they may call back
    /// into the breaker freely.
    pub fn before_call(&self) -> CallDecision {
        let mut events = Vec::new();
        let decision = {
            let mut inner = self.inner.lock().expect("circuit lock poisoned");
            match inner.state {
                CircuitState::Closed => {
                    events.push(CircuitEvent::CallPermitted {
                        instance: self.name.clone(),
                        timestamp: Instant::now(),
                        state: inner.state,
                    });
                    CallDecision::Allowed
                }
                CircuitState::Open => {
                    if inner.last_transition.elapsed() >= self.cooldown_period {
                        self.transition_to(&mut inner, CircuitState::HalfOpen, &mut events);
                        inner.probe_in_flight = true;
                        events.push(CircuitEvent::CallPermitted {
                            instance: self.name.clone(),
                            timestamp: Instant::now(),
                            state: inner.state,
                        });
                        CallDecision::Allowed
                    } else {
                        self.reject(&mut events);
                        CallDecision::Rejected
                    }
                }
                CircuitState::HalfOpen => {
                    // A probe that was cancelled before recording an outcome
                    // would otherwise wedge the breaker here forever; after a
                    // full cooldown with no verdict the probe is considered
                    // lost and a new one is permitted.
                    if !inner.probe_in_flight
                        || inner.last_transition.elapsed() >= self.cooldown_period
                    {
                        inner.probe_in_flight = true;
                        inner.last_transition = Instant::now();
                        events.push(CircuitEvent::CallPermitted {
                            instance: self.name.clone(),
                            timestamp: Instant::now(),
                            state: inner.state,
                        });
                        CallDecision::Allowed
                    } else {
                        self.reject(&mut events);
                        CallDecision::Rejected
                    }
                }
            }
        };
        self.emit_all(&events);
        decision
    }

    /// Records a successful backend attempt.
    pub fn record_success(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock().expect("circuit lock poisoned");
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.probe_in_flight = false;
                    self.transition_to(&mut inner, CircuitState::Closed, &mut events);
                }
                CircuitState::Closed => {
                    inner.consecutive_failures = 0;
                }
                // A stale success from a call that was in flight when the
                // breaker opened carries no information about recovery.
                CircuitState::Open => {}
            }
            events.push(CircuitEvent::SuccessRecorded {
                instance: self.name.clone(),
                timestamp: Instant::now(),
                state: inner.state,
            });
        }
        self.emit_all(&events);

        #[cfg(feature = "metrics")]
        counter!("gateway_circuit_calls_total", "circuit" => self.name.clone(), "outcome" => "success")
            .increment(1);
    }

    /// Records a failed backend attempt.
    pub fn record_failure(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock().expect("circuit lock poisoned");
            match inner.state {
                CircuitState::Closed => {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.failure_threshold {
                        self.transition_to(&mut inner, CircuitState::Open, &mut events);
                    }
                }
                CircuitState::HalfOpen => {
                    inner.probe_in_flight = false;
                    self.transition_to(&mut inner, CircuitState::Open, &mut events);
                }
                CircuitState::Open => {}
            }
            events.push(CircuitEvent::FailureRecorded {
                instance: self.name.clone(),
                timestamp: Instant::now(),
                state: inner.state,
                consecutive_failures: inner.consecutive_failures,
            });
        }
        self.emit_all(&events);

        #[cfg(feature = "metrics")]
        counter!("gateway_circuit_calls_total", "circuit" => self.name.clone(), "outcome" => "failure")
            .increment(1);
    }

    /// Manually opens the circuit (operator action).
    pub fn force_open(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock().expect("circuit lock poisoned");
            self.transition_to(&mut inner, CircuitState::Open, &mut events);
        }
        self.emit_all(&events);
    }

    /// Manually closes the circuit and clears the failure count
    /// (operator action).
    pub fn reset(&self) {
        let mut events = Vec::new();
        {
            let mut inner = self.inner.lock().expect("circuit lock poisoned");
            self.transition_to(&mut inner, CircuitState::Closed, &mut events);
        }
        self.emit_all(&events);
    }

    /// Listener fan-out. Must only be called with the lock released:
    /// listeners are user code and may call back into the breaker.
    fn emit_all(&self, events: &[CircuitEvent]) {
        for event in events {
            self.listeners.emit(event);
        }
    }

    fn reject(&self, events: &mut Vec<CircuitEvent>) {
        events.push(CircuitEvent::CallRejected {
            instance: self.name.clone(),
            timestamp: Instant::now(),
        });

        #[cfg(feature = "metrics")]
        counter!("gateway_circuit_rejections_total", "circuit" => self.name.clone()).increment(1);
    }

    fn transition_to(&self, inner: &mut Inner, state: CircuitState, events: &mut Vec<CircuitEvent>) {
        if inner.state == state {
            return;
        }

        let from_state = inner.state;
        events.push(CircuitEvent::StateTransition {
            instance: self.name.clone(),
            timestamp: Instant::now(),
            from: from_state,
            to: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(
            circuit = %self.name,
            from = from_state.as_str(),
            to = state.as_str(),
            "circuit state transition"
        );

        #[cfg(feature = "metrics")]
        {
            counter!(
                "gateway_circuit_transitions_total",
                "circuit" => self.name.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);
            gauge!("gateway_circuit_state", "circuit" => self.name.clone())
                .set(state as u8 as f64);
        }

        inner.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        inner.last_transition = Instant::now();
        inner.consecutive_failures = 0;
        inner.probe_in_flight = false;
    }
}
