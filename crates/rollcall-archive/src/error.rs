//! Error types for the archive layer.

use rollcall_protocol::SessionId;
use rollcall_store::StoreError;

/// Errors that can occur while archiving or reading history.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// No history exists for this session.
    #[error("history for session {0} not found")]
    NotFound(SessionId),

    /// The history belongs to another instructor.
    #[error("not authorized for session {0}")]
    Forbidden(SessionId),

    /// Only stopped sessions can be archived.
    #[error("session {0} is still active")]
    StillActive(SessionId),

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
