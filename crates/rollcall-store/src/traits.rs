//! The storage seams.
//!
//! Both traits use return-position `impl Future + Send` rather than plain
//! `async fn` so that the futures are guaranteed `Send`: the engine awaits
//! them inside request handlers that Tokio may move between threads.
//! Implementations can still just write `async fn`.

use std::future::Future;

use rollcall_protocol::{AttendanceSession, HistoryRecord, SessionId};

use crate::StoreError;

/// Persistence for live (and recently stopped) attendance sessions.
pub trait SessionStore: Send + Sync + 'static {
    /// Loads a session. `Ok(None)` if it doesn't exist.
    fn get(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<AttendanceSession>, StoreError>> + Send;

    /// Writes a session, replacing any previous version atomically.
    /// A concurrent reader sees either the old record or the new one,
    /// never a mix.
    fn put(
        &self,
        session: &AttendanceSession,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Loads every readable session. Unreadable records are skipped
    /// (and logged) rather than failing the whole listing.
    fn list(&self) -> impl Future<Output = Result<Vec<AttendanceSession>, StoreError>> + Send;

    /// Removes a session. Returns `false` if it didn't exist.
    fn delete(&self, id: &SessionId) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

/// Write-once persistence for history snapshots.
pub trait HistoryStore: Send + Sync + 'static {
    /// Stores `record` under its `history_id` unless a record with that id
    /// already exists. Returns `true` if this call created it.
    ///
    /// Existing history is never overwritten.
    fn insert_history(
        &self,
        record: &HistoryRecord,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Loads a history record by its `history_id`.
    fn get_history(
        &self,
        history_id: &str,
    ) -> impl Future<Output = Result<Option<HistoryRecord>, StoreError>> + Send;

    /// Finds the history record of a session by session id.
    fn find_history(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<Option<HistoryRecord>, StoreError>> + Send;

    /// Loads every readable history record, in no particular order.
    fn list_history(&self) -> impl Future<Output = Result<Vec<HistoryRecord>, StoreError>> + Send;
}
