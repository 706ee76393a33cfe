//! Per-catalog reader/writer locks shared across engine instances.

use crate::transfer::ports::CatalogIdentity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// Access mode requested for a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Concurrent with other shared holders; used by exports and dry runs.
    Shared,
    /// Excludes every other holder; used by committing imports.
    Exclusive,
}

/// Guard held for the duration of one export or import run.
#[derive(Debug)]
pub enum CatalogGuard {
    /// Shared access.
    Shared {
        /// Underlying read guard.
        _guard: OwnedRwLockReadGuard<()>,
    },
    /// Exclusive access.
    Exclusive {
        /// Underlying write guard.
        _guard: OwnedRwLockWriteGuard<()>,
    },
}

impl CatalogGuard {
    /// Returns the mode this guard was acquired in.
    #[must_use]
    pub const fn mode(&self) -> LockMode {
        match self {
            Self::Shared { .. } => LockMode::Shared,
            Self::Exclusive { .. } => LockMode::Exclusive,
        }
    }
}

/// Registry of catalog locks keyed by catalog identity.
///
/// Clones share the same registry, so engines built from one registry
/// serialize committing imports against the same catalog. Entries that no
/// guard or waiter holds are dropped on the next acquisition, so the registry
/// only keeps catalogs that are in use.
#[derive(Debug, Clone, Default)]
pub struct CatalogLocks {
    locks: Arc<Mutex<HashMap<CatalogIdentity, Arc<RwLock<()>>>>>,
}

impl CatalogLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, identity: &CatalogIdentity) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|key, lock| key == identity || Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(identity.clone()).or_default())
    }

    /// Waits for access to the catalog in the requested mode.
    pub async fn acquire(&self, identity: &CatalogIdentity, mode: LockMode) -> CatalogGuard {
        let lock = self.lock_for(identity);
        match mode {
            LockMode::Shared => CatalogGuard::Shared {
                _guard: lock.read_owned().await,
            },
            LockMode::Exclusive => CatalogGuard::Exclusive {
                _guard: lock.write_owned().await,
            },
        }
    }
}
