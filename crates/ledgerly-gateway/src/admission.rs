//! Bounded-concurrency admission queue in front of the backend.
//!
//! The inference backend has fixed memory; exceeding its true
//! concurrency limit risks process-level failure for unrelated
//! requests, so capacity is capped below the backend's theoretical
//! maximum to leave headroom for cold-start memory spikes.

use crate::error::QueueTimeout;
use crate::events::AdmissionEvent;
use ledgerly_gateway_core::events::EventListeners;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Ownership token for one unit of backend concurrency capacity.
///
/// The wrapped permit is returned to the queue when the slot is
/// dropped, so release is structurally guaranteed on every exit path:
/// success, failure, timeout, or cancellation.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

/// FIFO admission gate limiting in-flight inference calls.
///
/// Built on [`tokio::sync::Semaphore`], which queues waiters fairly
/// and hands a released permit to exactly one of them, so a slot freed
/// at the timeout boundary can never be lost or duplicated.
pub struct AdmissionQueue {
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    name: String,
    listeners: EventListeners<AdmissionEvent>,
}

impl AdmissionQueue {
    /// Creates a queue with `max_concurrency` slots.
    pub fn new(
        name: impl Into<String>,
        max_concurrency: usize,
        listeners: EventListeners<AdmissionEvent>,
    ) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            name: name.into(),
            listeners,
        }
    }

    /// Waits up to `timeout` for a concurrency slot.
    ///
    /// Returns [`QueueTimeout`] if no slot frees in time; the waiter is
    /// removed from the queue and cannot receive a slot afterwards.
    pub async fn acquire(&self, timeout: Duration) -> Result<AdmissionSlot, QueueTimeout> {
        let started = Instant::now();
        match tokio::time::timeout(timeout, Arc::clone(&self.semaphore).acquire_owned()).await {
            Ok(Ok(permit)) => {
                let waited = started.elapsed();
                let in_flight = self.in_flight();
                self.listeners.emit(&AdmissionEvent::SlotAcquired {
                    instance: self.name.clone(),
                    timestamp: Instant::now(),
                    in_flight,
                    waited,
                });

                #[cfg(feature = "metrics")]
                {
                    counter!("gateway_admitted_total", "gateway" => self.name.clone())
                        .increment(1);
                    gauge!("gateway_in_flight", "gateway" => self.name.clone())
                        .set(in_flight as f64);
                }

                Ok(AdmissionSlot { _permit: permit })
            }
            // The semaphore is owned by this queue and never closed.
            Ok(Err(_)) | Err(_) => {
                let waited = started.elapsed();
                self.listeners.emit(&AdmissionEvent::QueueTimeout {
                    instance: self.name.clone(),
                    timestamp: Instant::now(),
                    waited,
                });

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    gateway = %self.name,
                    waited_ms = waited.as_millis() as u64,
                    "admission queue timeout"
                );

                #[cfg(feature = "metrics")]
                counter!("gateway_queue_timeouts_total", "gateway" => self.name.clone())
                    .increment(1);

                Err(QueueTimeout { waited })
            }
        }
    }

    /// Number of slots currently held.
    pub fn in_flight(&self) -> usize {
        self.max_concurrency - self.semaphore.available_permits()
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured capacity.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(max: usize) -> AdmissionQueue {
        AdmissionQueue::new("test".to_string(), max, EventListeners::new())
    }

    #[tokio::test]
    async fn slots_up_to_capacity_are_immediate() {
        let q = queue(3);
        let a = q.acquire(Duration::from_millis(10)).await.unwrap();
        let b = q.acquire(Duration::from_millis(10)).await.unwrap();
        let c = q.acquire(Duration::from_millis(10)).await.unwrap();
        assert_eq!(q.in_flight(), 3);
        drop((a, b, c));
        assert_eq!(q.in_flight(), 0);
    }

    #[tokio::test]
    async fn waiter_times_out_when_full() {
        let q = queue(1);
        let _held = q.acquire(Duration::from_millis(10)).await.unwrap();
        let err = q.acquire(Duration::from_millis(20)).await.unwrap_err();
        assert!(err.waited >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn released_slot_goes_to_waiter() {
        let q = Arc::new(queue(1));
        let held = q.acquire(Duration::from_millis(10)).await.unwrap();

        let q2 = Arc::clone(&q);
        let waiter = tokio::spawn(async move { q2.acquire(Duration::from_secs(1)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(held);

        let slot = waiter.await.unwrap();
        assert!(slot.is_ok());
    }

    #[tokio::test]
    async fn dropped_slot_restores_capacity_on_early_exit() {
        let q = queue(2);
        {
            let _slot = q.acquire(Duration::from_millis(10)).await.unwrap();
            assert_eq!(q.in_flight(), 1);
            // Early return path: slot dropped by scope exit.
        }
        assert_eq!(q.in_flight(), 0);
    }
}
