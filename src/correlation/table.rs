use std::collections::HashMap;

use tokio::sync::oneshot;

use super::DelayToken;

/// Sending half of a one-shot completion signal.
///
/// `resolve` consumes the waiter, so a second resolution cannot happen.
#[derive(Debug)]
pub struct Waiter {
    id: u64,
    sender: oneshot::Sender<()>,
}

impl Waiter {
    pub fn new(id: u64) -> (Self, oneshot::Receiver<()>) {
        let (sender, receiver) = oneshot::channel();
        (Self { id, sender }, receiver)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns false when the suspended caller has already gone away.
    pub fn resolve(self) -> bool {
        self.sender.send(()).is_ok()
    }
}

/// Delay token to the waiter a caller is suspended on. At most one per token.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    waiters: HashMap<DelayToken, Waiter>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `waiter` for `token`, handing it back if one is already there.
    pub fn register(&mut self, token: DelayToken, waiter: Waiter) -> Result<(), Waiter> {
        if self.waiters.contains_key(&token) {
            return Err(waiter);
        }
        self.waiters.insert(token, waiter);
        Ok(())
    }

    pub fn take(&mut self, token: &DelayToken) -> Option<Waiter> {
        self.waiters.remove(token)
    }

    /// Drops the entry only if it still belongs to the waiter with `id`.
    pub fn remove_if(&mut self, token: &DelayToken, id: u64) -> bool {
        match self.waiters.get(token) {
            Some(waiter) if waiter.id == id => {
                self.waiters.remove(token);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, token: &DelayToken) -> bool {
        self.waiters.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
