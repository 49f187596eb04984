//! The live roster view.

use rollcall_protocol::wire::{RosterEntry, StatusResponse};
use rollcall_protocol::{AttendanceSession, CheckinCode, SessionId, TeacherId};
use rollcall_store::{HistoryStore, SessionStore};

use crate::{AttendanceError, AttendanceManager};

/// What an instructor sees while polling a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub session_id: SessionId,
    /// `None` only for a damaged, stopped record.
    pub current_code: Option<CheckinCode>,
    pub active: bool,
    /// Sorted by name, case-insensitively, then by id.
    pub students: Vec<RosterEntry>,
}

impl From<&AttendanceSession> for SessionStatus {
    fn from(session: &AttendanceSession) -> Self {
        Self {
            session_id: session.session_id.clone(),
            current_code: session.current_code.clone(),
            active: session.active,
            students: session.roster(),
        }
    }
}

impl From<SessionStatus> for StatusResponse {
    fn from(status: SessionStatus) -> Self {
        Self {
            session_id: status.session_id.to_string(),
            current_code: status
                .current_code
                .map(|code| code.to_string())
                .unwrap_or_default(),
            active: status.active,
            students: status.students,
        }
    }
}

impl<S: SessionStore + HistoryStore> AttendanceManager<S> {
    /// Returns the current code and roster of a session.
    ///
    /// Reading an active session rotates its code if the code has gone
    /// stale, so the code returned is always inside its validity window.
    /// Stopped sessions are returned as they are.
    ///
    /// # Errors
    /// - [`AttendanceError::NotFound`] if no such session exists
    /// - [`AttendanceError::Forbidden`] if it belongs to another instructor
    pub async fn status(
        &self,
        session_id: &SessionId,
        teacher: &TeacherId,
    ) -> Result<SessionStatus, AttendanceError> {
        let _guard = self.locks.lock(session_id).await;
        let mut session = self.load_owned(session_id, teacher).await?;
        self.refresh(&mut session).await?;
        Ok(SessionStatus::from(&session))
    }
}
