//! Property tests for the deadline policy.
//!
//! Invariants tested:
//! - Deadlines never shrink as the attempt number grows
//! - Cold start gives every operation kind the same deadline
//! - Attempt zero always equals the base deadline

use ledgerly_gateway::TimeoutPolicy;
use ledgerly_gateway_core::OperationKind;
use proptest::prelude::*;
use std::time::Duration;

static KINDS: [OperationKind; 4] = [
    OperationKind::Health,
    OperationKind::Parse,
    OperationKind::Chat,
    OperationKind::Analyze,
];

fn arb_kind() -> impl Strategy<Value = OperationKind> {
    prop::sample::select(&KINDS[..])
}

fn arb_policy() -> impl Strategy<Value = TimeoutPolicy> {
    (
        1u64..=120_000,
        1u64..=120_000,
        1u64..=120_000,
        1u64..=120_000,
        1u64..=300_000,
        1.0f64..=3.0,
    )
        .prop_map(|(health, parse, chat, analyze, cold, multiplier)| {
            TimeoutPolicy::default()
                .health(Duration::from_millis(health))
                .parse(Duration::from_millis(parse))
                .chat(Duration::from_millis(chat))
                .analyze(Duration::from_millis(analyze))
                .cold_start(Duration::from_millis(cold))
                .retry_multiplier(multiplier)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: with a multiplier of at least 1, a later attempt never
    /// gets a shorter deadline than an earlier one.
    #[test]
    fn deadlines_never_shrink_across_attempts(
        policy in arb_policy(),
        kind in arb_kind(),
        attempt in 0u32..=8,
        is_cold_start: bool,
    ) {
        let earlier = policy.deadline_for(kind, attempt, is_cold_start);
        let later = policy.deadline_for(kind, attempt + 1, is_cold_start);
        prop_assert!(
            later >= earlier,
            "attempt {} got {:?} but attempt {} got {:?}",
            attempt + 1,
            later,
            attempt,
            earlier
        );
    }

    /// Property: a cold start overrides the per-kind base, so every
    /// operation kind sees the same deadline for the same attempt.
    #[test]
    fn cold_start_is_uniform_across_kinds(
        policy in arb_policy(),
        attempt in 0u32..=8,
    ) {
        let reference = policy.deadline_for(OperationKind::Health, attempt, true);
        for kind in KINDS {
            prop_assert_eq!(policy.deadline_for(kind, attempt, true), reference);
        }
    }

    /// Property: the first attempt is never stretched.
    #[test]
    fn attempt_zero_equals_base(
        policy in arb_policy(),
        kind in arb_kind(),
        is_cold_start: bool,
    ) {
        prop_assert_eq!(
            policy.deadline_for(kind, 0, is_cold_start),
            policy.base_for(kind, is_cold_start)
        );
    }
}
