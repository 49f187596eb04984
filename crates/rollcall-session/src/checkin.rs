//! Check-in verification.

use chrono::Local;
use rollcall_protocol::{CheckinCode, SessionId, StudentId};
use rollcall_store::{HistoryStore, SessionStore};

use crate::{AttendanceError, AttendanceManager, Location};

/// A student's check-in attempt, as established by the caller.
#[derive(Debug, Clone)]
pub struct Checkin {
    pub code: CheckinCode,
    pub student: StudentId,
    /// Display name. Blank or missing falls back to the student id.
    pub name: Option<String>,
    /// Device location, only required when a fence is enforced.
    pub location: Option<Location>,
}

impl<S: SessionStore + HistoryStore> AttendanceManager<S> {
    /// Marks a student present in the live session whose current code is
    /// `attempt.code`.
    ///
    /// Candidates come from the code index and are re-checked one by one
    /// under their session lock: the session must still be active, its
    /// code is rotated first if stale, and only then compared. The first
    /// candidate that still matches wins.
    ///
    /// Returns the id of the session the student was recorded in.
    ///
    /// # Errors
    /// - [`AttendanceError::CodeNotFound`] for any code that doesn't match
    ///   a live session right now, whether wrong, expired, or stopped
    /// - [`AttendanceError::InvalidInput`] if the fence is enforced and the
    ///   attempt carries no usable location
    /// - [`AttendanceError::OutsideFence`] if the location is outside it
    pub async fn checkin(&self, attempt: Checkin) -> Result<SessionId, AttendanceError> {
        self.check_fence(attempt.location)?;

        for session_id in self.index.candidates(&attempt.code) {
            let _guard = self.locks.lock(&session_id).await;

            let Some(mut session) = self.store.get(&session_id).await? else {
                self.index.remove(&attempt.code, &session_id);
                continue;
            };
            if !session.active {
                self.index.remove(&attempt.code, &session_id);
                continue;
            }

            self.refresh(&mut session).await?;
            if !session.accepts(&attempt.code) {
                continue;
            }

            let time = self.clock.now().with_timezone(&Local).format("%H:%M").to_string();
            session.record_presence(
                attempt.student.clone(),
                attempt.name.as_deref().unwrap_or_default(),
                time,
            );
            self.store.put(&session).await?;

            tracing::info!(
                %session_id,
                student_id = %attempt.student,
                students = session.students.len(),
                "check-in recorded"
            );
            return Ok(session_id);
        }

        tracing::debug!(student_id = %attempt.student, "check-in code matched no live session");
        Err(AttendanceError::CodeNotFound)
    }

    /// Applies the fence before any session is touched.
    fn check_fence(&self, location: Option<Location>) -> Result<(), AttendanceError> {
        if !self.fence.enforced() {
            return Ok(());
        }
        let location = location
            .filter(|l| l.lat.is_finite() && l.lng.is_finite())
            .ok_or_else(|| AttendanceError::InvalidInput("location is required".into()))?;
        if !self.fence.contains(location) {
            tracing::debug!(lat = location.lat, lng = location.lng, "check-in outside fence");
            return Err(AttendanceError::OutsideFence);
        }
        Ok(())
    }
}
