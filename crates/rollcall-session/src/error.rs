//! Error types for the session engine.

use rollcall_archive::ArchiveError;
use rollcall_protocol::SessionId;
use rollcall_store::StoreError;

/// Errors that can occur while running attendance sessions.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    /// No session exists with this id.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The submitted code matches no live session.
    ///
    /// Wrong, expired, and stopped-session codes all produce this same
    /// error so callers can't tell them apart.
    #[error("invalid or expired code")]
    CodeNotFound,

    /// The session belongs to another instructor.
    #[error("not authorized for session {0}")]
    Forbidden(SessionId),

    /// The check-in location is outside the configured fence.
    #[error("check-in location is outside the allowed area")]
    OutsideFence,

    /// A required value was missing or malformed.
    #[error("{0}")]
    InvalidInput(String),

    /// Every attempt to allocate a fresh session id collided.
    #[error("could not allocate a session id after {attempts} attempts")]
    Conflict { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
