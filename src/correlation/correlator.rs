use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::{CorrelationTable, DelayToken, EarlyFinishSet, Waiter};
use crate::config::CorrelationConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::metrics::Metrics;

struct Ledger {
    pending: CorrelationTable,
    early: EarlyFinishSet,
}

/// Result of the writer's atomic check once the store reported a delay.
#[derive(Debug)]
pub enum Claim {
    /// The notice beat the writer; its early-finish record has been consumed.
    AlreadyFinished,
    Pending(PendingCompletion),
}

/// A registered waiter the writer still has to suspend on.
#[derive(Debug)]
pub struct PendingCompletion {
    token: DelayToken,
    waiter_id: u64,
    receiver: oneshot::Receiver<()>,
}

impl PendingCompletion {
    pub fn token(&self) -> &DelayToken {
        &self.token
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    Resolved,
    RecordedEarly { evicted: Option<DelayToken> },
    /// A waiter was registered but its caller had already stopped waiting.
    Abandoned,
}

impl FinishOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinishOutcome::Resolved => "resolved",
            FinishOutcome::RecordedEarly { .. } => "recorded_early",
            FinishOutcome::Abandoned => "abandoned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CorrelatorSnapshot {
    pub pending_waiters: usize,
    pub early_finishes: usize,
}

/// Owns the correlation table and the early-finish set.
///
/// Every check-then-act runs under one lock that is never held across an
/// await point, so a token is either pending or early-finished, never both.
pub struct Correlator {
    ledger: Mutex<Ledger>,
    next_waiter_id: AtomicU64,
    waiter_timeout: Option<Duration>,
}

impl Correlator {
    pub fn new(waiter_timeout: Option<Duration>, early_ttl: Duration, early_capacity: usize) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                pending: CorrelationTable::new(),
                early: EarlyFinishSet::new(early_ttl, early_capacity),
            }),
            next_waiter_id: AtomicU64::new(1),
            waiter_timeout,
        }
    }

    pub fn from_config(config: &CorrelationConfig) -> Self {
        Self::new(
            config.waiter_timeout(),
            config.early_finish_ttl(),
            config.early_finish_capacity,
        )
    }

    pub fn claim_or_register(&self, token: DelayToken) -> AdapterResult<Claim> {
        let mut ledger = self.ledger.lock();

        if ledger.early.claim(&token) {
            Metrics::early_finish_claimed();
            debug!(token = %token, "delayed write had already finished");
            return Ok(Claim::AlreadyFinished);
        }

        let waiter_id = self.next_waiter_id.fetch_add(1, Ordering::Relaxed);
        let (waiter, receiver) = Waiter::new(waiter_id);
        if ledger.pending.register(token.clone(), waiter).is_err() {
            warn!(token = %token, "delay token reused while a write is still waiting on it");
            return Err(AdapterError::DuplicateDelayToken(token));
        }

        debug!(token = %token, waiter_id, "registered waiter for delayed write");
        Ok(Claim::Pending(PendingCompletion {
            token,
            waiter_id,
            receiver,
        }))
    }

    pub fn finish(&self, token: DelayToken) -> FinishOutcome {
        let mut ledger = self.ledger.lock();

        match ledger.pending.take(&token) {
            Some(waiter) => {
                if waiter.resolve() {
                    Metrics::notification_resolved();
                    debug!(token = %token, "resolved waiting write");
                    FinishOutcome::Resolved
                } else {
                    debug!(token = %token, "waiting write was gone before its notice arrived");
                    FinishOutcome::Abandoned
                }
            }
            None => {
                let evicted = ledger.early.record(token.clone(), Instant::now());
                Metrics::notification_recorded_early();
                if let Some(evicted) = &evicted {
                    Metrics::early_finishes_evicted(1);
                    warn!(evicted = %evicted, "early-finish set full, evicted oldest record");
                }
                debug!(token = %token, "recorded early finish");
                FinishOutcome::RecordedEarly { evicted }
            }
        }
    }

    /// Suspends until the waiter behind `pending` is resolved.
    ///
    /// The waiter is removed from the table when this future completes or is
    /// dropped, so a timed out or cancelled writer never leaves an entry behind.
    pub async fn wait(&self, pending: PendingCompletion) -> AdapterResult<()> {
        let PendingCompletion {
            token,
            waiter_id,
            receiver,
        } = pending;
        let _guard = WaiterGuard {
            correlator: self,
            token: &token,
            waiter_id,
        };

        let received = match self.waiter_timeout {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(received) => received,
                Err(_) => {
                    let timeout_ms = limit.as_millis() as u64;
                    Metrics::write_timed_out();
                    warn!(token = %token, timeout_ms, "gave up waiting for delayed write");
                    return Err(AdapterError::Timeout {
                        token: token.clone(),
                        timeout_ms,
                    });
                }
            },
            None => receiver.await,
        };

        received.map_err(|_| AdapterError::WaiterDropped(token.clone()))
    }

    /// Evicts early-finish records that outlived their ttl.
    pub fn sweep(&self) -> usize {
        let dropped = self.ledger.lock().early.sweep(Instant::now());
        if dropped > 0 {
            Metrics::early_finishes_evicted(dropped as u64);
            info!("evicted {} expired early-finish records", dropped);
        }
        dropped
    }

    pub fn snapshot(&self) -> CorrelatorSnapshot {
        let ledger = self.ledger.lock();
        CorrelatorSnapshot {
            pending_waiters: ledger.pending.len(),
            early_finishes: ledger.early.len(),
        }
    }

    pub fn is_pending(&self, token: &DelayToken) -> bool {
        self.ledger.lock().pending.contains(token)
    }

    pub fn is_early_finished(&self, token: &DelayToken) -> bool {
        self.ledger.lock().early.contains(token)
    }

    fn forget_waiter(&self, token: &DelayToken, waiter_id: u64) {
        if self.ledger.lock().pending.remove_if(token, waiter_id) {
            debug!(token = %token, waiter_id, "removed waiter that stopped waiting");
        }
    }
}

struct WaiterGuard<'a> {
    correlator: &'a Correlator,
    token: &'a DelayToken,
    waiter_id: u64,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.correlator.forget_waiter(self.token, self.waiter_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_test::{assert_pending, assert_ready_ok, task};

    use super::*;

    fn correlator() -> Correlator {
        Correlator::new(None, Duration::from_secs(60), 64)
    }

    fn assert_exclusive(correlator: &Correlator, token: &DelayToken) {
        assert!(
            !(correlator.is_pending(token) && correlator.is_early_finished(token)),
            "token {token} is both pending and early-finished"
        );
    }

    #[test]
    fn notice_after_claim_resolves_waiter() {
        let correlator = correlator();
        let token = DelayToken::from("T1");

        let Claim::Pending(pending) = correlator.claim_or_register(token.clone()).expect("claim")
        else {
            panic!("expected a pending claim");
        };
        assert_exclusive(&correlator, &token);

        let mut wait = task::spawn(correlator.wait(pending));
        assert_pending!(wait.poll());

        assert_eq!(correlator.finish(token.clone()), FinishOutcome::Resolved);
        assert!(wait.is_woken());
        assert_ready_ok!(wait.poll());
        drop(wait);

        assert_eq!(correlator.snapshot(), CorrelatorSnapshot::default());
    }

    #[test]
    fn notice_before_claim_is_consumed_by_claim() {
        let correlator = correlator();
        let token = DelayToken::from("T2");

        assert_eq!(
            correlator.finish(token.clone()),
            FinishOutcome::RecordedEarly { evicted: None }
        );
        assert!(correlator.is_early_finished(&token));
        assert_exclusive(&correlator, &token);

        let claim = correlator.claim_or_register(token.clone()).expect("claim");
        assert!(matches!(claim, Claim::AlreadyFinished));
        assert!(!correlator.is_early_finished(&token));
        assert_eq!(correlator.snapshot(), CorrelatorSnapshot::default());
    }

    #[test]
    fn notices_only_resolve_their_own_token() {
        let correlator = correlator();
        let Claim::Pending(p3) = correlator.claim_or_register("T3".into()).expect("claim T3")
        else {
            panic!("expected a pending claim");
        };
        let Claim::Pending(p4) = correlator.claim_or_register("T4".into()).expect("claim T4")
        else {
            panic!("expected a pending claim");
        };

        let mut w3 = task::spawn(correlator.wait(p3));
        let mut w4 = task::spawn(correlator.wait(p4));
        assert_pending!(w3.poll());
        assert_pending!(w4.poll());

        correlator.finish("T4".into());
        assert!(!w3.is_woken());
        assert_pending!(w3.poll());
        assert_ready_ok!(w4.poll());

        correlator.finish("T3".into());
        assert_ready_ok!(w3.poll());
    }

    #[test]
    fn second_claim_for_waiting_token_is_rejected() {
        let correlator = correlator();
        let _first = correlator.claim_or_register("T5".into()).expect("first claim");

        let err = correlator
            .claim_or_register("T5".into())
            .expect_err("duplicate claim");
        assert!(matches!(err, AdapterError::DuplicateDelayToken(t) if t.as_str() == "T5"));
        assert_eq!(correlator.snapshot().pending_waiters, 1);
    }

    #[test]
    fn dropped_wait_removes_its_waiter() {
        let correlator = correlator();
        let Claim::Pending(pending) = correlator.claim_or_register("T6".into()).expect("claim")
        else {
            panic!("expected a pending claim");
        };

        let mut wait = task::spawn(correlator.wait(pending));
        assert_pending!(wait.poll());
        drop(wait);

        assert!(!correlator.is_pending(&"T6".into()));
        assert_eq!(
            correlator.finish("T6".into()),
            FinishOutcome::RecordedEarly { evicted: None }
        );
    }

    #[test]
    fn abandoned_waiter_is_reported() {
        let correlator = correlator();
        let Claim::Pending(pending) = correlator.claim_or_register("T7".into()).expect("claim")
        else {
            panic!("expected a pending claim");
        };
        // Dropping the completion without ever waiting leaves the entry in place.
        drop(pending);

        assert_eq!(correlator.finish("T7".into()), FinishOutcome::Abandoned);
        assert_eq!(correlator.snapshot(), CorrelatorSnapshot::default());
    }

    #[tokio::test]
    async fn wait_times_out_and_clears_entry() {
        let correlator = Correlator::new(Some(Duration::from_millis(20)), Duration::from_secs(60), 8);
        let Claim::Pending(pending) = correlator.claim_or_register("T8".into()).expect("claim")
        else {
            panic!("expected a pending claim");
        };

        let err = correlator.wait(pending).await.expect_err("no notice arrives");

        assert!(matches!(err, AdapterError::Timeout { timeout_ms: 20, .. }));
        assert!(!correlator.is_pending(&"T8".into()));
    }

    #[test]
    fn sweep_keeps_fresh_records() {
        let correlator = correlator();
        correlator.finish("T9".into());
        assert_eq!(correlator.sweep(), 0);
        assert!(correlator.is_early_finished(&"T9".into()));
    }

    #[test]
    fn sweep_with_zero_ttl_clears_records() {
        let correlator = Correlator::new(None, Duration::ZERO, 8);
        correlator.finish("T10".into());
        assert_eq!(correlator.sweep(), 1);
        assert_eq!(correlator.snapshot().early_finishes, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_claims_and_notices_resolve_every_write_once() {
        let correlator = Arc::new(correlator());
        let mut handles = Vec::new();

        for i in 0..200 {
            let token = DelayToken::new(format!("race-{i}"));

            let writer = {
                let correlator = correlator.clone();
                let token = token.clone();
                tokio::spawn(async move {
                    match correlator.claim_or_register(token)? {
                        Claim::AlreadyFinished => Ok(()),
                        Claim::Pending(pending) => correlator.wait(pending).await,
                    }
                })
            };
            let notifier = {
                let correlator = correlator.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    correlator.finish(token)
                })
            };
            handles.push((writer, notifier));
        }

        for (writer, notifier) in handles {
            let outcome = notifier.await.expect("notifier task");
            assert_ne!(outcome, FinishOutcome::Abandoned);
            writer.await.expect("writer task").expect("write resolved");
        }

        assert_eq!(correlator.snapshot(), CorrelatorSnapshot::default());
    }
}
