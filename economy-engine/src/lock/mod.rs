//! # Account Lock Manager
//!
//! Grants mutual exclusion over every mutation addressed to one account.
//!
//! Each account id maps lazily to its own async mutex. Waiting on one account
//! suspends only the waiting task; tasks working on other accounts keep
//! running. Entries are created on first use and live for the whole process.
//!
//! Two-account operations go through [`AccountLocks::acquire_pair`], which
//! always locks in [`canonical_order`] so that `A -> B` and `B -> A` racing on
//! the same pair cannot deadlock.

use economy::AccountId;
use log::trace;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Process-wide registry of per-account locks.
#[derive(Default)]
pub struct AccountLocks {
    slots: Mutex<HashMap<AccountId, Slot>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, account: &AccountId) -> Slot {
        // The registry map is only touched for the lookup, never across an await.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(account.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Waits until no other task holds `account`, then holds it.
    ///
    /// The lock is released when the returned guard is dropped, on every exit
    /// path of the caller.
    pub async fn acquire(&self, account: &AccountId) -> AccountGuard {
        let guard = self.slot(account).lock_owned().await;
        trace!("Lock acquired: {}", account);
        AccountGuard {
            account: account.clone(),
            _guard: guard,
        }
    }

    /// Holds `account` if it is free right now.
    pub fn try_acquire(&self, account: &AccountId) -> Option<AccountGuard> {
        let guard = self.slot(account).try_lock_owned().ok()?;
        trace!("Lock acquired: {}", account);
        Some(AccountGuard {
            account: account.clone(),
            _guard: guard,
        })
    }

    /// Holds both accounts, locking them in canonical order.
    ///
    /// Passing the same account twice holds it once.
    pub async fn acquire_pair(&self, a: &AccountId, b: &AccountId) -> PairGuard {
        if a == b {
            return PairGuard {
                first: self.acquire(a).await,
                second: None,
            };
        }

        let (low, high) = canonical_order(a, b);
        let first = self.acquire(low).await;
        let second = self.acquire(high).await;
        PairGuard {
            first,
            second: Some(second),
        }
    }

    /// True if some task currently holds `account`.
    pub fn is_held(&self, account: &AccountId) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(account)
            .map(|slot| slot.try_lock().is_err())
            .unwrap_or(false)
    }

    /// Number of accounts that have ever been locked.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Order in which a pair of accounts is always locked: ascending by id.
pub fn canonical_order<'a>(a: &'a AccountId, b: &'a AccountId) -> (&'a AccountId, &'a AccountId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Proof that the current task holds one account.
pub struct AccountGuard {
    account: AccountId,
    _guard: OwnedMutexGuard<()>,
}

impl AccountGuard {
    pub fn account(&self) -> &AccountId {
        &self.account
    }
}

impl Drop for AccountGuard {
    fn drop(&mut self) {
        trace!("Lock released: {}", self.account);
    }
}

/// Proof that the current task holds two accounts (or one, if both ids were
/// equal). Released in reverse acquisition order on drop.
pub struct PairGuard {
    first: AccountGuard,
    second: Option<AccountGuard>,
}

impl PairGuard {
    pub fn covers(&self, account: &AccountId) -> bool {
        self.first.account() == account
            || self
                .second
                .as_ref()
                .map(|g| g.account() == account)
                .unwrap_or(false)
    }

    /// Accounts in the order they were locked.
    pub fn accounts(&self) -> Vec<&AccountId> {
        let mut ids = vec![self.first.account()];
        if let Some(second) = &self.second {
            ids.push(second.account());
        }
        ids
    }
}

impl Drop for PairGuard {
    fn drop(&mut self) {
        // Fields drop first-to-last; release the later lock before the earlier one.
        self.second.take();
    }
}
