//! The attendance manager: session lifecycle and lazy code rotation.
//!
//! One `AttendanceManager` serves every session. It keeps two pieces of
//! in-memory state next to the store:
//!
//! - a lock table, one async mutex per session id, that serializes every
//!   read-modify-write of a session's record
//! - the code index, `code → [session ids]`, that check-in uses to find
//!   the session a code belongs to
//!
//! Both are rebuilt from scratch when the manager opens; the store stays
//! the only source of truth.

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use rollcall_archive::Archiver;
use rollcall_protocol::{AttendanceSession, CheckinCode, CourseMeta, SessionId, TeacherId};
use rollcall_store::{HistoryStore, SessionStore};

use crate::fence::{CampusFence, GeoFence, OpenFence};
use crate::index::CodeIndex;
use crate::locks::SessionLocks;
use crate::{AttendanceError, Clock, CodeSource, FenceConfig, RandomCodes, SessionConfig, SystemClock};

/// Runs attendance sessions on top of a store.
///
/// ## Lifecycle
///
/// ```text
/// start() ──→ [active] ──stop()──→ [stopped] ──→ Archiver::archive()
///                │  ↺ status() / checkin() rotate a stale code
/// ```
///
/// The manager is `Send + Sync`; share it behind an `Arc`.
pub struct AttendanceManager<S: SessionStore + HistoryStore> {
    pub(crate) store: Arc<S>,
    archiver: Archiver<S>,
    config: SessionConfig,
    pub(crate) locks: SessionLocks,
    pub(crate) index: CodeIndex,
    pub(crate) clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    pub(crate) fence: Arc<dyn GeoFence>,
}

impl<S: SessionStore + HistoryStore> AttendanceManager<S> {
    /// Opens the manager over `store` and indexes the codes of every
    /// active session found in it.
    ///
    /// Uses the system clock, random codes, and no fence; swap them with
    /// the `with_*` methods.
    ///
    /// # Errors
    /// [`AttendanceError::Store`] if the stored sessions can't be listed.
    pub async fn open(store: Arc<S>, config: SessionConfig) -> Result<Self, AttendanceError> {
        let sessions = store.list().await?;
        let index = CodeIndex::rebuild(&sessions);

        tracing::info!(
            sessions = sessions.len(),
            indexed = index.len(),
            rotation_secs = config.rotation_interval.as_secs(),
            "attendance manager ready"
        );

        Ok(Self {
            archiver: Archiver::new(Arc::clone(&store)),
            store,
            config,
            locks: SessionLocks::default(),
            index,
            clock: Arc::new(SystemClock),
            codes: Arc::new(RandomCodes),
            fence: Arc::new(OpenFence),
        })
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the id and code source.
    pub fn with_codes(mut self, codes: Arc<dyn CodeSource>) -> Self {
        self.codes = codes;
        self
    }

    /// Replaces the check-in fence.
    pub fn with_fence(mut self, fence: Arc<dyn GeoFence>) -> Self {
        self.fence = fence;
        self
    }

    /// Installs the fence described by `config`: a [`CampusFence`] when
    /// enabled, otherwise an [`OpenFence`].
    pub fn with_fence_config(self, config: &FenceConfig) -> Self {
        if config.enabled {
            self.with_fence(Arc::new(CampusFence::from_config(config)))
        } else {
            self.with_fence(Arc::new(OpenFence))
        }
    }

    /// The archive of stopped sessions, for history queries.
    pub fn archiver(&self) -> &Archiver<S> {
        &self.archiver
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------
    // start
    // -----------------------------------------------------------------

    /// Opens a new session owned by `teacher` and returns its id and
    /// first code.
    ///
    /// Draws up to `id_attempts` random ids. Each candidate is checked
    /// and written while holding its lock, so two concurrent starts can
    /// never claim the same id.
    ///
    /// # Errors
    /// - [`AttendanceError::Conflict`] if every candidate id was taken
    /// - [`AttendanceError::Store`] if the record can't be written
    pub async fn start(
        &self,
        teacher: &TeacherId,
        course: CourseMeta,
    ) -> Result<(SessionId, CheckinCode), AttendanceError> {
        for attempt in 1..=self.config.id_attempts {
            let session_id = self.codes.session_id();
            let _guard = self.locks.lock(&session_id).await;

            if self.store.get(&session_id).await?.is_some() {
                tracing::debug!(%session_id, attempt, "session id collision, retrying");
                continue;
            }

            let now = self.clock.now();
            let code = self.mint_code(&session_id);
            let session = AttendanceSession::new(
                session_id.clone(),
                teacher,
                course.clone(),
                code.clone(),
                now,
                now.trunc_subsecs(0),
            );
            self.store.put(&session).await?;
            self.index.insert(&code, &session_id);

            tracing::info!(
                %session_id,
                %teacher,
                course = %session.course.label(),
                section = %session.course.section,
                "attendance session started"
            );
            return Ok((session_id, code));
        }

        tracing::warn!(
            %teacher,
            attempts = self.config.id_attempts,
            "could not allocate a session id"
        );
        Err(AttendanceError::Conflict {
            attempts: self.config.id_attempts,
        })
    }

    // -----------------------------------------------------------------
    // rotation
    // -----------------------------------------------------------------

    /// Returns the session's current code, minting a new one first if the
    /// old one has outlived the rotation interval.
    ///
    /// Stopped sessions are never rotated; their last code is returned
    /// unchanged (or `None` for a damaged record).
    ///
    /// # Errors
    /// [`AttendanceError::NotFound`] if no such session exists.
    pub async fn rotate_if_stale(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<CheckinCode>, AttendanceError> {
        let _guard = self.locks.lock(session_id).await;
        let mut session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound(session_id.clone()))?;
        self.refresh(&mut session).await?;
        Ok(session.current_code)
    }

    /// Rotates `session`'s code in place if it is active and stale, and
    /// persists the change. The caller must hold the session's lock.
    ///
    /// The index is only updated once the write has succeeded.
    pub(crate) async fn refresh(
        &self,
        session: &mut AttendanceSession,
    ) -> Result<bool, AttendanceError> {
        let now = self.clock.now();
        if !session.active || !session.code_is_stale(now, self.config.rotation_interval) {
            return Ok(false);
        }

        let old = session.current_code.clone();
        let code = self.mint_code(&session.session_id);
        session.replace_code(code.clone(), now);
        self.store.put(session).await?;
        self.index.replace(&session.session_id, old.as_ref(), &code);

        tracing::debug!(session_id = %session.session_id, %code, "check-in code rotated");
        Ok(true)
    }

    /// Draws a code, redrawing up to `code_attempts` times while another
    /// live session holds it.
    fn mint_code(&self, session_id: &SessionId) -> CheckinCode {
        let mut code = self.codes.checkin_code();
        for _ in 1..self.config.code_attempts {
            if !self.index.held_by_other(&code, session_id) {
                break;
            }
            code = self.codes.checkin_code();
        }
        code
    }

    // -----------------------------------------------------------------
    // stop
    // -----------------------------------------------------------------

    /// Stops a session and archives it. Returns when it stopped.
    ///
    /// Stopping an already stopped session changes nothing and returns
    /// the original `stopped_at`. The archive step runs every time and is
    /// create-if-absent, so a crash between the two writes is repaired by
    /// simply stopping again.
    ///
    /// # Errors
    /// - [`AttendanceError::NotFound`] if no such session exists
    /// - [`AttendanceError::Forbidden`] if it belongs to another instructor
    /// - [`AttendanceError::Store`] / [`AttendanceError::Archive`] if a
    ///   write fails
    pub async fn stop(
        &self,
        session_id: &SessionId,
        teacher: &TeacherId,
    ) -> Result<DateTime<Utc>, AttendanceError> {
        let _guard = self.locks.lock(session_id).await;
        let mut session = self.load_owned(session_id, teacher).await?;

        let stopped_at = match (session.active, session.stopped_at) {
            (false, Some(stopped_at)) => {
                tracing::debug!(%session_id, "session already stopped");
                stopped_at
            }
            _ => {
                let now = self.clock.now().trunc_subsecs(0);
                session.mark_stopped(now);
                self.store.put(&session).await?;
                if let Some(code) = &session.current_code {
                    self.index.remove(code, session_id);
                }
                tracing::info!(
                    %session_id,
                    students = session.students.len(),
                    "attendance session stopped"
                );
                now
            }
        };

        self.archiver.archive(&session, self.clock.now()).await?;
        Ok(stopped_at)
    }

    // -----------------------------------------------------------------
    // helpers
    // -----------------------------------------------------------------

    /// Loads a session and checks that `teacher` may act on it.
    /// Existence is checked first, then ownership.
    pub(crate) async fn load_owned(
        &self,
        session_id: &SessionId,
        teacher: &TeacherId,
    ) -> Result<AttendanceSession, AttendanceError> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AttendanceError::NotFound(session_id.clone()))?;

        if !session.is_visible_to(teacher) {
            tracing::warn!(%session_id, %teacher, "session access denied");
            return Err(AttendanceError::Forbidden(session_id.clone()));
        }
        Ok(session)
    }
}
