//! Resilience-controlled gateway in front of a single-instance,
//! memory-constrained inference backend.
//!
//! The gateway sits between ordinary request handlers and the natural-
//! language backend of a personal-finance assistant, and is alone
//! responsible for:
//!
//! - never allowing more concurrent inference work than the backend
//!   can hold in memory (bounded FIFO admission),
//! - detecting sustained backend failure and failing fast (three-state
//!   circuit breaker with a single recovery probe),
//! - escalating deadlines across retries and cold starts (pure
//!   per-operation timeout policy),
//! - guaranteeing every caller a well-formed answer in bounded time,
//!   degrading to local rule-based responses when the backend cannot
//!   answer.
//!
//! ## Usage
//!
//! The backend seam is any [`tower::Service`] taking an
//! [`AttemptRequest`]; tests and examples use `service_fn` doubles:
//!
//! ```rust
//! use ledgerly_gateway::{Gateway, GatewayConfig};
//! use ledgerly_gateway_core::{
//!     AttemptRequest, BackendError, InferenceResponse, OperationKind,
//! };
//!
//! # async fn example() {
//! let backend = tower::service_fn(|req: AttemptRequest| async move {
//!     Ok::<_, BackendError>(InferenceResponse::from_model(
//!         req.kind,
//!         "you spent $84.20 on dining this week",
//!         0.92,
//!     ))
//! });
//!
//! let config = GatewayConfig::builder()
//!     .name("assistant")
//!     .max_concurrency(3)
//!     .on_state_transition(|from, to| {
//!         println!("circuit: {from:?} -> {to:?}");
//!     })
//!     .build();
//!
//! let gateway = Gateway::new(backend, config);
//!
//! let response = gateway
//!     .handle(OperationKind::Chat, "how much did I spend on food?")
//!     .await
//!     .expect("payload is non-empty");
//! assert!(!response.is_degraded());
//! # }
//! ```
//!
//! ## Degraded responses
//!
//! Operational failures never escape [`Gateway::handle`]; the caller
//! receives a deterministic rule-based response instead, tagged with
//! `ResponseSource::Fallback` and a low confidence:
//!
//! ```rust
//! use ledgerly_gateway::{Gateway, GatewayConfig};
//! use ledgerly_gateway_core::{AttemptRequest, BackendError, InferenceResponse, OperationKind};
//!
//! # async fn example() {
//! let down = tower::service_fn(|_req: AttemptRequest| async move {
//!     Err::<InferenceResponse, _>(BackendError::Connection("refused".into()))
//! });
//!
//! let gateway = Gateway::new(down, GatewayConfig::default());
//! let response = gateway
//!     .handle(OperationKind::Parse, "coffee 4.50 at Blue Bottle")
//!     .await
//!     .unwrap();
//! assert!(response.is_degraded());
//! # }
//! ```
//!
//! ## Observability
//!
//! Every stateful component emits events through listener hooks on the
//! config builder; with the `metrics` feature the gateway additionally
//! publishes counters and gauges, and with `tracing` it logs state
//! transitions and degraded serves.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod admission;
pub mod caller;
pub mod circuit;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod gateway;
pub mod stats;
pub mod timeout;

pub use admission::{AdmissionQueue, AdmissionSlot};
pub use caller::RetryingCaller;
pub use circuit::{CallDecision, CircuitBreaker, CircuitState};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::{CallFailure, InvalidRequest, QueueTimeout};
pub use fallback::{FallbackResponder, FALLBACK_CONFIDENCE};
pub use gateway::Gateway;
pub use stats::{GatewayStats, GatewayStatsSnapshot};
pub use timeout::TimeoutPolicy;
