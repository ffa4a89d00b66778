//! Property-based tests for the gateway components.
//!
//! Run with: cargo test --test property_tests
//!
//! These tests use proptest to generate random inputs and verify that
//! the core invariants hold across configurations.

pub mod admission;
pub mod circuit_breaker;
pub mod retrying_caller;
pub mod timeout_policy;
