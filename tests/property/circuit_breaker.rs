//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - The breaker opens exactly when consecutive failures reach the
//!   threshold, never earlier
//! - Any success restarts the consecutive count
//! - The state machine matches a simple reference model over arbitrary
//!   outcome sequences

use ledgerly_gateway::{CircuitBreaker, CircuitState};
use ledgerly_gateway_core::events::EventListeners;
use proptest::prelude::*;
use std::time::Duration;

fn breaker(threshold: u32) -> CircuitBreaker {
    // A long cooldown keeps the breaker from probing mid-test.
    CircuitBreaker::new("prop", threshold, Duration::from_secs(3600), EventListeners::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: n consecutive failures open the breaker iff n reaches
    /// the threshold.
    #[test]
    fn opens_exactly_at_threshold(
        threshold in 1u32..=20,
        failures in 0u32..=40,
    ) {
        let cb = breaker(threshold);
        for _ in 0..failures {
            cb.record_failure();
        }
        let expected = if failures >= threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        };
        prop_assert_eq!(cb.state(), expected);
    }

    /// Property: over any interleaving of successes and failures, the
    /// breaker agrees with a reference model that counts consecutive
    /// failures and latches open at the threshold.
    #[test]
    fn matches_reference_model(
        threshold in 1u32..=10,
        outcomes in prop::collection::vec(any::<bool>(), 0..=60),
    ) {
        let cb = breaker(threshold);
        let mut consecutive = 0u32;
        let mut open = false;

        for &failed in &outcomes {
            if failed {
                cb.record_failure();
            } else {
                cb.record_success();
            }
            // Model: outcomes recorded after the breaker latches open
            // are stale and ignored.
            if !open {
                if failed {
                    consecutive += 1;
                    if consecutive >= threshold {
                        open = true;
                    }
                } else {
                    consecutive = 0;
                }
            }

            let expected = if open {
                CircuitState::Open
            } else {
                CircuitState::Closed
            };
            prop_assert_eq!(cb.state(), expected);
            if !open {
                prop_assert_eq!(cb.consecutive_failures(), consecutive);
            }
        }
    }
}
