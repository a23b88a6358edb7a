use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use super::DelayToken;

// Arrival time plus a sequence number, so equal instants still order uniquely.
type ArrivalKey = (Instant, u64);

/// Tokens whose "finished" notice arrived before any writer asked for them.
///
/// Orphaned entries are bounded two ways: each one expires after `ttl`, and
/// once `capacity` is reached the oldest entry makes room for the new one.
/// `arrivals` indexes the same entries by arrival, so eviction and sweeping
/// only touch the entries they remove.
#[derive(Debug)]
pub struct EarlyFinishSet {
    entries: HashMap<DelayToken, ArrivalKey>,
    arrivals: BTreeMap<ArrivalKey, DelayToken>,
    next_seq: u64,
    ttl: Duration,
    capacity: usize,
}

impl EarlyFinishSet {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            arrivals: BTreeMap::new(),
            next_seq: 0,
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Records `token` as finished. Returns the token evicted to stay within capacity.
    pub fn record(&mut self, token: DelayToken, now: Instant) -> Option<DelayToken> {
        let mut evicted = None;
        if let Some(previous) = self.entries.get(&token) {
            self.arrivals.remove(previous);
        } else if self.entries.len() >= self.capacity {
            if let Some((_, oldest)) = self.arrivals.pop_first() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        let key = (now, self.next_seq);
        self.next_seq += 1;
        self.arrivals.insert(key, token.clone());
        self.entries.insert(token, key);
        evicted
    }

    /// Removes `token` if present. This is the writer's late check.
    pub fn claim(&mut self, token: &DelayToken) -> bool {
        match self.entries.remove(token) {
            Some(key) => {
                self.arrivals.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Evicts every entry older than the ttl, returning how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let mut dropped = 0;
        while let Some((&(arrived, _), _)) = self.arrivals.first_key_value() {
            if now.saturating_duration_since(arrived) < self.ttl {
                break;
            }
            if let Some((_, token)) = self.arrivals.pop_first() {
                self.entries.remove(&token);
                dropped += 1;
            }
        }
        dropped
    }

    pub fn contains(&self, token: &DelayToken) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
