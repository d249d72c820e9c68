//! At most one running action per initiator and kind.

use action::ActionKind;
use alloy_primitives::Address;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

type Key = (Address, ActionKind);

/// Registry of running actions.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<Key>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `(initiator, kind)`. `None` if it is taken.
    ///
    /// The slot is released when the guard is dropped.
    pub fn try_acquire(&self, initiator: Address, kind: ActionKind) -> Option<InFlightGuard> {
        let key = (initiator, kind);
        let inserted = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);

        inserted.then(|| InFlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    pub fn is_active(&self, initiator: Address, kind: ActionKind) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(initiator, kind))
    }
}

#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_action_per_kind() {
        let inflight = InFlight::new();
        let owner = Address::repeat_byte(1);

        let guard = inflight.try_acquire(owner, ActionKind::Deposit);
        assert!(guard.is_some());
        assert!(inflight.try_acquire(owner, ActionKind::Deposit).is_none());

        // Other kinds and other initiators are independent.
        assert!(inflight.try_acquire(owner, ActionKind::Withdraw).is_some());
        assert!(inflight
            .try_acquire(Address::repeat_byte(2), ActionKind::Deposit)
            .is_some());

        drop(guard);
        assert!(!inflight.is_active(owner, ActionKind::Deposit));
        assert!(inflight.try_acquire(owner, ActionKind::Deposit).is_some());
    }
}
