//! Property tests for the retrying caller.
//!
//! Invariants tested:
//! - The attempt budget (1 + max_retries) is never exceeded
//! - Success on the Nth attempt stops the loop immediately
//! - Client errors end the loop after exactly one attempt

use ledgerly_gateway::{
    AdmissionQueue, CallFailure, CircuitBreaker, GatewayConfig, GatewayStats, RetryingCaller,
};
use ledgerly_gateway_core::events::EventListeners;
use ledgerly_gateway_core::{AttemptRequest, BackendError, InferenceResponse, OperationKind};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

fn caller_with<S>(backend: S, max_retries: u32) -> RetryingCaller<S> {
    // A threshold above any attempt budget keeps the breaker out of the
    // picture; these properties are about the loop itself.
    let breaker = Arc::new(CircuitBreaker::new(
        "prop",
        1000,
        Duration::from_secs(30),
        EventListeners::new(),
    ));
    let admission = Arc::new(AdmissionQueue::new("prop", 3, EventListeners::new()));
    let config = GatewayConfig::builder()
        .max_retries(max_retries)
        .backoff_base(Duration::from_millis(1))
        .build();
    RetryingCaller::new(
        backend,
        breaker,
        admission,
        Arc::new(GatewayStats::default()),
        &config,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: a backend that always fails transiently is called
    /// exactly 1 + max_retries times, and the failure reports that
    /// count.
    #[test]
    fn attempt_budget_is_exact(max_retries in 0u32..=4) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&calls);
            let backend = tower::service_fn(move |_req: AttemptRequest| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<InferenceResponse, _>(BackendError::Timeout)
                }
            });

            let caller = caller_with(backend, max_retries);
            let err = caller
                .call(OperationKind::Chat, Arc::from("hi"), false)
                .await
                .unwrap_err();

            let budget = (max_retries + 1) as usize;
            prop_assert_eq!(calls.load(Ordering::SeqCst), budget);
            match err {
                CallFailure::Exhausted { attempts, .. } => {
                    prop_assert_eq!(attempts as usize, budget);
                }
                other => return Err(TestCaseError::fail(format!("expected Exhausted, got {other:?}"))),
            }
            Ok(())
        })?;
    }

    /// Property: success on attempt N makes exactly N backend calls.
    #[test]
    fn success_stops_the_loop(
        max_retries in 0u32..=4,
        succeed_on in 1usize..=5,
    ) {
        // Only meaningful when success fits inside the budget.
        if succeed_on > (max_retries + 1) as usize {
            return Ok(());
        }
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&calls);
            let backend = tower::service_fn(move |req: AttemptRequest| {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n >= succeed_on {
                        Ok(InferenceResponse::from_model(req.kind, "ok", 0.9))
                    } else {
                        Err(BackendError::Connection("reset".into()))
                    }
                }
            });

            let caller = caller_with(backend, max_retries);
            let result = caller
                .call(OperationKind::Chat, Arc::from("hi"), false)
                .await;

            prop_assert!(result.is_ok());
            prop_assert_eq!(calls.load(Ordering::SeqCst), succeed_on);
            Ok(())
        })?;
    }

    /// Property: a client error ends the loop after one attempt no
    /// matter how many retries are configured.
    #[test]
    fn client_error_is_terminal(
        max_retries in 0u32..=4,
        status in 400u16..=499,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let c = Arc::clone(&calls);
            let backend = tower::service_fn(move |_req: AttemptRequest| {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<InferenceResponse, _>(BackendError::Client {
                        status,
                        message: "bad request".into(),
                    })
                }
            });

            let caller = caller_with(backend, max_retries);
            let err = caller
                .call(OperationKind::Parse, Arc::from("x"), false)
                .await
                .unwrap_err();

            prop_assert!(matches!(err, CallFailure::ClientError(_)));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
            Ok(())
        })?;
    }
}
