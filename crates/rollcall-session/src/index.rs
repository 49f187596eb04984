//! In-memory map from live codes to the sessions holding them.
//!
//! Lets check-in jump straight to the right session instead of reading
//! every stored record. The index is a hint, not the truth: callers
//! re-check each candidate under its session lock before trusting it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use rollcall_protocol::{AttendanceSession, CheckinCode, SessionId};

#[derive(Debug, Default)]
pub(crate) struct CodeIndex {
    by_code: Mutex<HashMap<CheckinCode, Vec<SessionId>>>,
}

impl CodeIndex {
    /// Builds the index from stored sessions. Stopped sessions are skipped.
    pub(crate) fn rebuild<'a>(sessions: impl IntoIterator<Item = &'a AttendanceSession>) -> Self {
        let index = Self::default();
        for session in sessions.into_iter().filter(|s| s.active) {
            if let Some(code) = &session.current_code {
                index.insert(code, &session.session_id);
            }
        }
        index
    }

    pub(crate) fn insert(&self, code: &CheckinCode, id: &SessionId) {
        let mut map = self.by_code.lock().unwrap_or_else(PoisonError::into_inner);
        let ids = map.entry(code.clone()).or_default();
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }

    pub(crate) fn remove(&self, code: &CheckinCode, id: &SessionId) {
        let mut map = self.by_code.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ids) = map.get_mut(code) {
            ids.retain(|held| held != id);
            if ids.is_empty() {
                map.remove(code);
            }
        }
    }

    /// Moves `id` from `old` (if any) to `new`.
    pub(crate) fn replace(&self, id: &SessionId, old: Option<&CheckinCode>, new: &CheckinCode) {
        if let Some(old) = old {
            self.remove(old, id);
        }
        self.insert(new, id);
    }

    /// Sessions that held `code` when last indexed.
    pub(crate) fn candidates(&self, code: &CheckinCode) -> Vec<SessionId> {
        let map = self.by_code.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(code).cloned().unwrap_or_default()
    }

    /// `true` if some session other than `id` currently holds `code`.
    pub(crate) fn held_by_other(&self, code: &CheckinCode, id: &SessionId) -> bool {
        let map = self.by_code.lock().unwrap_or_else(PoisonError::into_inner);
        map.get(code)
            .is_some_and(|ids| ids.iter().any(|held| held != id))
    }

    pub(crate) fn len(&self) -> usize {
        self.by_code
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> CheckinCode {
        CheckinCode::parse(raw).unwrap()
    }

    fn sid(raw: &str) -> SessionId {
        SessionId::parse(raw).unwrap()
    }

    #[test]
    fn test_replace_moves_session_to_new_code() {
        let index = CodeIndex::default();
        index.insert(&code("11111"), &sid("AAAAA"));

        index.replace(&sid("AAAAA"), Some(&code("11111")), &code("22222"));

        assert!(index.candidates(&code("11111")).is_empty());
        assert_eq!(index.candidates(&code("22222")), vec![sid("AAAAA")]);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_candidates_shared_code_lists_every_holder() {
        let index = CodeIndex::default();
        index.insert(&code("11111"), &sid("AAAAA"));
        index.insert(&code("11111"), &sid("BBBBB"));
        index.insert(&code("11111"), &sid("AAAAA"));

        assert_eq!(index.candidates(&code("11111")), vec![sid("AAAAA"), sid("BBBBB")]);
    }

    #[test]
    fn test_held_by_other_ignores_own_entry() {
        let index = CodeIndex::default();
        index.insert(&code("11111"), &sid("AAAAA"));

        assert!(!index.held_by_other(&code("11111"), &sid("AAAAA")));
        assert!(index.held_by_other(&code("11111"), &sid("BBBBB")));
        assert!(!index.held_by_other(&code("99999"), &sid("BBBBB")));
    }

    #[test]
    fn test_remove_last_holder_drops_code() {
        let index = CodeIndex::default();
        index.insert(&code("11111"), &sid("AAAAA"));
        index.remove(&code("11111"), &sid("AAAAA"));
        assert_eq!(index.len(), 0);
    }
}
