use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use once_cell::sync::Lazy;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

static WRITES_TOTAL: AtomicU64 = AtomicU64::new(0);
static WRITES_DELAYED: AtomicU64 = AtomicU64::new(0);
static WRITES_TIMED_OUT: AtomicU64 = AtomicU64::new(0);
static EARLY_FINISHES_CLAIMED: AtomicU64 = AtomicU64::new(0);
static NOTIFICATIONS_RESOLVED: AtomicU64 = AtomicU64::new(0);
static NOTIFICATIONS_RECORDED_EARLY: AtomicU64 = AtomicU64::new(0);
static NOTIFICATIONS_MALFORMED: AtomicU64 = AtomicU64::new(0);
static EARLY_FINISHES_EVICTED: AtomicU64 = AtomicU64::new(0);
static STORE_ERRORS: AtomicU64 = AtomicU64::new(0);
static PENDING_WAITERS: AtomicU64 = AtomicU64::new(0);
static EARLY_FINISH_RECORDS: AtomicU64 = AtomicU64::new(0);

pub struct Metrics;

impl Metrics {
    pub fn mark_started() {
        Lazy::force(&STARTED_AT);
    }

    pub fn write_issued() {
        WRITES_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_delayed() {
        WRITES_DELAYED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_timed_out() {
        WRITES_TIMED_OUT.fetch_add(1, Ordering::Relaxed);
    }

    pub fn early_finish_claimed() {
        EARLY_FINISHES_CLAIMED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_resolved() {
        NOTIFICATIONS_RESOLVED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_recorded_early() {
        NOTIFICATIONS_RECORDED_EARLY.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_malformed() {
        NOTIFICATIONS_MALFORMED.fetch_add(1, Ordering::Relaxed);
    }

    pub fn early_finishes_evicted(count: u64) {
        EARLY_FINISHES_EVICTED.fetch_add(count, Ordering::Relaxed);
    }

    pub fn store_error() {
        STORE_ERRORS.fetch_add(1, Ordering::Relaxed);
    }

    pub fn set_ledger_sizes(pending_waiters: u64, early_finishes: u64) {
        PENDING_WAITERS.store(pending_waiters, Ordering::Relaxed);
        EARLY_FINISH_RECORDS.store(early_finishes, Ordering::Relaxed);
    }
}

pub fn format_prometheus() -> String {
    let uptime = STARTED_AT.elapsed().as_secs();

    format!(
        r#"# HELP gateway_uptime_seconds Number of seconds the gateway has been running
# TYPE gateway_uptime_seconds gauge
gateway_uptime_seconds {}

# HELP gateway_writes_total Total number of property writes issued to the store
# TYPE gateway_writes_total counter
gateway_writes_total {}

# HELP gateway_writes_delayed_total Number of writes the store reported as delayed
# TYPE gateway_writes_delayed_total counter
gateway_writes_delayed_total {}

# HELP gateway_writes_timed_out_total Number of delayed writes that gave up waiting
# TYPE gateway_writes_timed_out_total counter
gateway_writes_timed_out_total {}

# HELP gateway_early_finishes_claimed_total Delayed writes whose notice had already arrived
# TYPE gateway_early_finishes_claimed_total counter
gateway_early_finishes_claimed_total {}

# HELP gateway_notifications_resolved_total Notices that resolved a waiting write
# TYPE gateway_notifications_resolved_total counter
gateway_notifications_resolved_total {}

# HELP gateway_notifications_recorded_early_total Notices recorded before any write waited on them
# TYPE gateway_notifications_recorded_early_total counter
gateway_notifications_recorded_early_total {}

# HELP gateway_notifications_malformed_total Notices without a delay token
# TYPE gateway_notifications_malformed_total counter
gateway_notifications_malformed_total {}

# HELP gateway_early_finishes_evicted_total Early-finish records dropped by ttl or capacity
# TYPE gateway_early_finishes_evicted_total counter
gateway_early_finishes_evicted_total {}

# HELP gateway_store_errors_total Store calls that failed
# TYPE gateway_store_errors_total counter
gateway_store_errors_total {}

# HELP gateway_pending_waiters Writes currently waiting on a notice
# TYPE gateway_pending_waiters gauge
gateway_pending_waiters {}

# HELP gateway_early_finish_records Notices currently waiting for their write
# TYPE gateway_early_finish_records gauge
gateway_early_finish_records {}
"#,
        uptime,
        WRITES_TOTAL.load(Ordering::Relaxed),
        WRITES_DELAYED.load(Ordering::Relaxed),
        WRITES_TIMED_OUT.load(Ordering::Relaxed),
        EARLY_FINISHES_CLAIMED.load(Ordering::Relaxed),
        NOTIFICATIONS_RESOLVED.load(Ordering::Relaxed),
        NOTIFICATIONS_RECORDED_EARLY.load(Ordering::Relaxed),
        NOTIFICATIONS_MALFORMED.load(Ordering::Relaxed),
        EARLY_FINISHES_EVICTED.load(Ordering::Relaxed),
        STORE_ERRORS.load(Ordering::Relaxed),
        PENDING_WAITERS.load(Ordering::Relaxed),
        EARLY_FINISH_RECORDS.load(Ordering::Relaxed),
    )
}
