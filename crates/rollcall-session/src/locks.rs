//! Per-session serialization.
//!
//! Each session id gets its own `tokio::sync::Mutex<()>`. Holding the
//! guard is what makes a read-modify-write of that session's record
//! atomic with respect to every other engine operation on it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use rollcall_protocol::SessionId;
use tokio::sync::OwnedMutexGuard;

/// Above this many entries, idle locks are dropped on the next acquire.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub(crate) struct SessionLocks {
    table: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionLocks {
    /// Waits for exclusive access to `id`.
    ///
    /// The table itself sits behind a std mutex that is never held across
    /// an await; only the per-session async mutex is awaited.
    pub(crate) async fn lock(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let cell = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            if table.len() >= PRUNE_THRESHOLD {
                // A strong count of 1 means only the table holds it:
                // nobody owns the guard and nobody is waiting.
                table.retain(|_, cell| Arc::strong_count(cell) > 1);
            }
            Arc::clone(table.entry(id.clone()).or_default())
        };
        cell.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
