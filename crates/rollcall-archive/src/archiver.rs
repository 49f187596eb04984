//! The archiver: freezes stopped sessions and serves them back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rollcall_protocol::{
    AttendanceSession, HistoryRecord, SessionId, TeacherId, clean_identifier,
};
use rollcall_store::HistoryStore;

use crate::{ArchiveError, CsvExport};

/// Derives the archive name of a stopped session:
/// `{course_code|course_id}_{section}_{YYYYMMDD}_{session_id}`.
///
/// Blank parts fall back to `course` and `sec`. The date comes from
/// `stopped_at` so the name is the same no matter when (or how often)
/// archiving runs. Collisions between instructors can't happen because
/// the session id is unique.
pub fn history_id(session: &AttendanceSession) -> String {
    let course = non_empty(clean_identifier(session.course.label()), "course");
    let section = non_empty(clean_identifier(&session.course.section), "sec");
    let date = session
        .stopped_at
        .unwrap_or(session.created_at)
        .format("%Y%m%d");
    format!("{course}_{section}_{date}_{}", session.session_id)
}

fn non_empty(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

/// Writes and reads history records.
///
/// Generic over the store so tests and alternative backends plug in
/// without touching this code. Holding an `Arc<S>` lets the session engine
/// share one store between live sessions and history.
pub struct Archiver<S: HistoryStore> {
    store: Arc<S>,
}

impl<S: HistoryStore> Clone for Archiver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: HistoryStore> Archiver<S> {
    /// Creates an archiver over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Freezes a stopped session into a history record.
    ///
    /// Create-if-absent: archiving the same session twice keeps the first
    /// snapshot and returns the same id. This makes it safe to call again
    /// after a crash between "session stopped" and "history written".
    ///
    /// # Errors
    /// - [`ArchiveError::StillActive`]: the session hasn't been stopped
    /// - [`ArchiveError::Store`]: the write failed
    pub async fn archive(
        &self,
        session: &AttendanceSession,
        archived_at: DateTime<Utc>,
    ) -> Result<String, ArchiveError> {
        if session.active {
            return Err(ArchiveError::StillActive(session.session_id.clone()));
        }

        let record = HistoryRecord {
            history_id: history_id(session),
            archived_at,
            session: session.clone(),
        };

        let created = self.store.insert_history(&record).await?;
        if created {
            tracing::info!(
                session_id = %session.session_id,
                history_id = %record.history_id,
                students = session.students.len(),
                "session archived"
            );
        } else {
            tracing::debug!(
                session_id = %session.session_id,
                history_id = %record.history_id,
                "history already present, keeping original snapshot"
            );
        }
        Ok(record.history_id)
    }

    /// Lists the history visible to `teacher`, most recently stopped first.
    ///
    /// Visible means owned by `teacher` or unowned.
    pub async fn list(&self, teacher: &TeacherId) -> Result<Vec<HistoryRecord>, ArchiveError> {
        let mut records: Vec<HistoryRecord> = self
            .store
            .list_history()
            .await?
            .into_iter()
            .filter(|r| r.session.is_visible_to(teacher))
            .collect();

        records.sort_by(|a, b| {
            b.sort_key()
                .cmp(&a.sort_key())
                .then_with(|| a.history_id.cmp(&b.history_id))
        });
        Ok(records)
    }

    /// Loads one session's history.
    ///
    /// # Errors
    /// - [`ArchiveError::NotFound`]: no history for this session
    /// - [`ArchiveError::Forbidden`]: it belongs to another instructor
    pub async fn detail(
        &self,
        session_id: &SessionId,
        teacher: &TeacherId,
    ) -> Result<HistoryRecord, ArchiveError> {
        let record = self
            .store
            .find_history(session_id)
            .await?
            .ok_or_else(|| ArchiveError::NotFound(session_id.clone()))?;

        if !record.session.is_visible_to(teacher) {
            tracing::warn!(%session_id, %teacher, "history access denied");
            return Err(ArchiveError::Forbidden(session_id.clone()));
        }
        Ok(record)
    }

    /// Renders one session's history as CSV, one row per student sorted
    /// by name. Same errors as [`detail`](Self::detail).
    pub async fn export_csv(
        &self,
        session_id: &SessionId,
        teacher: &TeacherId,
    ) -> Result<CsvExport, ArchiveError> {
        let record = self.detail(session_id, teacher).await?;
        Ok(CsvExport::render(&record))
    }
}
