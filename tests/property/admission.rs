//! Property tests for the admission queue.
//!
//! Invariants tested:
//! - Concurrent holders never exceed the configured capacity
//! - All patient callers are eventually admitted (no deadlocks, no
//!   leaked slots)

use ledgerly_gateway::AdmissionQueue;
use ledgerly_gateway_core::events::EventListeners;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: the number of simultaneously held slots never exceeds
    /// the configured capacity.
    #[test]
    fn holders_never_exceed_capacity(
        max_concurrency in 1usize..=8,
        num_requests in 1usize..=60,
        hold_ms in 1u64..=5,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let queue = Arc::new(AdmissionQueue::new(
                "prop",
                max_concurrency,
                EventListeners::new(),
            ));
            let current = Arc::new(AtomicUsize::new(0));
            let max_seen = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for _ in 0..num_requests {
                let queue = Arc::clone(&queue);
                let current = Arc::clone(&current);
                let max_seen = Arc::clone(&max_seen);
                handles.push(tokio::spawn(async move {
                    let _slot = queue.acquire(Duration::from_secs(10)).await.unwrap();
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(hold_ms)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let observed = max_seen.load(Ordering::SeqCst);
            prop_assert!(
                observed <= max_concurrency,
                "observed {} concurrent holders but capacity was {}",
                observed,
                max_concurrency
            );
            prop_assert_eq!(queue.in_flight(), 0);
            prop_assert_eq!(queue.available(), max_concurrency);

            Ok(())
        })?;
    }

    /// Property: given a generous wait budget, every caller is admitted
    /// and every slot is returned.
    #[test]
    fn all_patient_callers_are_admitted(
        max_concurrency in 1usize..=4,
        num_requests in 1usize..=40,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let queue = Arc::new(AdmissionQueue::new(
                "prop",
                max_concurrency,
                EventListeners::new(),
            ));
            let admitted = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for _ in 0..num_requests {
                let queue = Arc::clone(&queue);
                let admitted = Arc::clone(&admitted);
                handles.push(tokio::spawn(async move {
                    let _slot = queue.acquire(Duration::from_secs(30)).await.unwrap();
                    admitted.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }));
            }

            let all_done = tokio::time::timeout(Duration::from_secs(10), async {
                for handle in handles {
                    handle.await.unwrap();
                }
            })
            .await;

            prop_assert!(all_done.is_ok(), "callers did not complete; slots leaked");
            prop_assert_eq!(admitted.load(Ordering::SeqCst), num_requests);
            prop_assert_eq!(queue.in_flight(), 0);

            Ok(())
        })?;
    }
}
