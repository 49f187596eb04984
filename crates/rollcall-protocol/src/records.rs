//! Persisted records: what an attendance session looks like on disk.
//!
//! One [`AttendanceSession`] document exists per open or closed session.
//! When a session stops, a frozen copy is written as a [`HistoryRecord`].
//!
//! Most fields carry `#[serde(default)]` so that a record missing an
//! optional field (an old file, a hand edit) still loads instead of taking
//! the whole session down with it.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::wire::RosterEntry;
use crate::{CheckinCode, SessionId, StudentId, TeacherId};

// ---------------------------------------------------------------------------
// CourseMeta
// ---------------------------------------------------------------------------

/// Free-form descriptive metadata about the class being taken.
///
/// Any field may be empty. `#[serde(flatten)]` on the session stores these
/// as top-level keys (`"course_code": "CS101"`) rather than as a nested
/// object, which keeps the file format flat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseMeta {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub section: String,
}

impl CourseMeta {
    /// The course label used for display and archive names: the course
    /// code, falling back to the course id.
    pub fn label(&self) -> &str {
        if self.course_code.trim().is_empty() {
            &self.course_id
        } else {
            &self.course_code
        }
    }
}

// ---------------------------------------------------------------------------
// StudentRecord
// ---------------------------------------------------------------------------

/// Presence status of a student within a session.
///
/// Check-in only ever produces `Present`. `Pending` exists for aggregated
/// views: it is what a record with a missing or unrecognised status reads
/// as. `#[serde(other)]` routes any unknown string to `Pending` instead of
/// failing the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    #[default]
    #[serde(other)]
    Pending,
}

impl AttendanceStatus {
    /// The lowercase wire name (`"present"`, `"pending"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Pending => "pending",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's entry in a session roster.
///
/// Decoding never fails: a field of the wrong type reads as its default
/// and an entry that isn't an object reads as an empty, pending record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawStudentRecord")]
pub struct StudentRecord {
    /// Display name. Falls back to the student id when blank.
    pub name: String,
    pub status: AttendanceStatus,
    /// Local wall-clock time of check-in, `HH:MM`.
    pub time: String,
}

/// A value that falls back to `T::default()` when it doesn't decode as `T`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Value(T),
    Other(#[allow(dead_code)] IgnoredAny),
}

impl<T: Default> Lenient<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Value(value) => value,
            Self::Other(_) => T::default(),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Lenient::deserialize(deserializer).map(Lenient::into_inner)
}

#[derive(Default, Deserialize)]
struct StudentFields {
    #[serde(default, deserialize_with = "lenient")]
    name: String,
    #[serde(default, deserialize_with = "lenient")]
    status: AttendanceStatus,
    #[serde(default, deserialize_with = "lenient")]
    time: String,
}

#[derive(Deserialize)]
#[serde(transparent)]
struct RawStudentRecord(Lenient<StudentFields>);

impl From<RawStudentRecord> for StudentRecord {
    fn from(raw: RawStudentRecord) -> Self {
        let fields = raw.0.into_inner();
        Self {
            name: fields.name,
            status: fields.status,
            time: fields.time,
        }
    }
}

impl StudentRecord {
    /// A record for a student who just checked in.
    pub fn present(name: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: AttendanceStatus::Present,
            time: time.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AttendanceSession
// ---------------------------------------------------------------------------

/// The durable record of one attendance session.
///
/// ```text
///   start() ──→ [active] ──(stop)──→ [stopped] ──→ HistoryRecord
///                  │  ↺ rotate code / check-in
/// ```
///
/// Once `active` is `false` the record is frozen: no more check-ins and
/// no more code rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub session_id: SessionId,

    /// Owning instructor. Empty means unowned (legacy records), which
    /// every instructor may read.
    #[serde(default)]
    pub teacher_id: String,

    #[serde(flatten)]
    pub course: CourseMeta,

    /// Creation time, whole seconds.
    pub created_at: DateTime<Utc>,

    /// The code students must submit right now. `None` only for damaged
    /// records; the next read mints one.
    #[serde(default)]
    pub current_code: Option<CheckinCode>,

    /// When `current_code` was minted.
    #[serde(default)]
    pub code_issued_at: Option<DateTime<Utc>>,

    pub active: bool,

    /// Set exactly when `active` becomes `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,

    /// Roster keyed by student id. A `BTreeMap` keeps the file stable
    /// between writes; display order is decided by the roster view.
    #[serde(default)]
    pub students: BTreeMap<StudentId, StudentRecord>,
}

impl AttendanceSession {
    /// Builds a freshly started, active session.
    pub fn new(
        session_id: SessionId,
        teacher: &TeacherId,
        course: CourseMeta,
        code: CheckinCode,
        now: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            teacher_id: teacher.to_string(),
            course,
            created_at,
            current_code: Some(code),
            code_issued_at: Some(now),
            active: true,
            stopped_at: None,
            students: BTreeMap::new(),
        }
    }

    /// The recorded owner, or `None` if the session is unowned.
    pub fn owner(&self) -> Option<&str> {
        let owner = self.teacher_id.trim();
        (!owner.is_empty()).then_some(owner)
    }

    /// `true` if `teacher` may read or stop this session: either they own
    /// it, or nobody does.
    pub fn is_visible_to(&self, teacher: &TeacherId) -> bool {
        self.owner().is_none_or(|owner| owner == teacher.as_str())
    }

    /// `true` if the current code must be replaced before it is used.
    ///
    /// A code is valid on `[code_issued_at, code_issued_at + interval)`.
    /// A missing code or issue time always counts as stale.
    pub fn code_is_stale(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        let (Some(_), Some(issued_at)) = (&self.current_code, self.code_issued_at) else {
            return true;
        };
        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(issued_at) >= interval
    }

    /// Installs a freshly minted code.
    pub fn replace_code(&mut self, code: CheckinCode, now: DateTime<Utc>) {
        self.current_code = Some(code);
        self.code_issued_at = Some(now);
    }

    /// `true` if this session is live and `code` is its current code.
    pub fn accepts(&self, code: &CheckinCode) -> bool {
        self.active && self.current_code.as_ref() == Some(code)
    }

    /// Inserts or refreshes a student's presence.
    ///
    /// A repeat check-in overwrites the name and time. The status only
    /// ever moves towards `Present`, never back.
    pub fn record_presence(&mut self, student: StudentId, name: &str, time: String) {
        let name = match name.trim() {
            "" => student.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.students
            .entry(student)
            .and_modify(|record| {
                record.name.clone_from(&name);
                record.time.clone_from(&time);
                record.status = AttendanceStatus::Present;
            })
            .or_insert_with(|| StudentRecord::present(name.clone(), time.clone()));
    }

    /// Freezes the session.
    pub fn mark_stopped(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.stopped_at = Some(now);
    }

    /// Flattens the roster into display order.
    ///
    /// Entries are sorted case-insensitively by name (the id stands in for
    /// a blank name), ties broken by id so the order is deterministic.
    /// Students who never checked in don't appear at all: there is no
    /// expected-roster concept to derive them from.
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<RosterEntry> = self
            .students
            .iter()
            .map(|(id, record)| {
                let name = match record.name.trim() {
                    "" => id.to_string(),
                    trimmed => trimmed.to_string(),
                };
                RosterEntry {
                    id: id.to_string(),
                    name,
                    status: record.status.to_string(),
                    time: record.time.clone(),
                }
            })
            .collect();

        // `sort_by_cached_key` lowercases each name once instead of on
        // every comparison.
        entries.sort_by_cached_key(|e| (e.name.to_lowercase(), e.id.clone()));
        entries
    }
}

// ---------------------------------------------------------------------------
// HistoryRecord
// ---------------------------------------------------------------------------

/// An immutable snapshot of a session taken when it stopped.
///
/// Stored under `history_id`, a human-legible name such as
/// `CS101_1_20240902_AB12C`. Never rewritten after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub history_id: String,
    pub archived_at: DateTime<Utc>,
    #[serde(flatten)]
    pub session: AttendanceSession,
}

impl HistoryRecord {
    /// Sort key for history listings: stop time, falling back to
    /// creation time.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.session.stopped_at.unwrap_or(self.session.created_at)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_725_000_000 + secs, 0).unwrap()
    }

    fn session() -> AttendanceSession {
        AttendanceSession::new(
            SessionId::parse("AB12C").unwrap(),
            &TeacherId::parse("T1").unwrap(),
            CourseMeta {
                course_code: "CS101".into(),
                section: "1".into(),
                ..CourseMeta::default()
            },
            CheckinCode::parse("48213").unwrap(),
            t(0),
            t(0),
        )
    }

    #[test]
    fn test_code_is_stale_window_is_half_open() {
        let s = session();
        let ten = Duration::from_secs(10);
        assert!(!s.code_is_stale(t(0), ten));
        assert!(!s.code_is_stale(t(9), ten));
        assert!(s.code_is_stale(t(10), ten));
    }

    #[test]
    fn test_code_is_stale_missing_code_is_stale() {
        let mut s = session();
        s.current_code = None;
        assert!(s.code_is_stale(t(0), Duration::from_secs(3600)));
    }

    #[test]
    fn test_accepts_rejects_stopped_session() {
        let mut s = session();
        let code = CheckinCode::parse("48213").unwrap();
        assert!(s.accepts(&code));
        s.mark_stopped(t(5));
        assert!(!s.accepts(&code), "stopped sessions never match");
    }

    #[test]
    fn test_record_presence_blank_name_falls_back_to_id() {
        let mut s = session();
        s.record_presence(StudentId::parse("S1").unwrap(), "  ", "09:05".into());
        let rec = &s.students[&StudentId::parse("S1").unwrap()];
        assert_eq!(rec.name, "S1");
        assert_eq!(rec.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_record_presence_repeat_overwrites_name_and_time() {
        let mut s = session();
        let id = StudentId::parse("S1").unwrap();
        s.record_presence(id.clone(), "Ann", "09:05".into());
        s.record_presence(id.clone(), "Ann B", "09:07".into());
        assert_eq!(s.students.len(), 1);
        assert_eq!(s.students[&id], StudentRecord::present("Ann B", "09:07"));
    }

    #[test]
    fn test_is_visible_to_unowned_session_is_public() {
        let mut s = session();
        let other = TeacherId::parse("T2").unwrap();
        assert!(!s.is_visible_to(&other));
        s.teacher_id = "  ".into();
        assert!(s.is_visible_to(&other));
    }

    #[test]
    fn test_student_record_unknown_status_reads_as_pending() {
        let rec: StudentRecord =
            serde_json::from_str(r#"{"name":"Bo","status":"late"}"#).unwrap();
        assert_eq!(rec.status, AttendanceStatus::Pending);
        assert_eq!(rec.time, "");
    }

    #[test]
    fn test_student_record_null_status_reads_as_pending() {
        let rec: StudentRecord =
            serde_json::from_str(r#"{"name":"Ann","status":null,"time":7}"#).unwrap();
        assert_eq!(rec.name, "Ann");
        assert_eq!(rec.status, AttendanceStatus::Pending);
        assert_eq!(rec.time, "");
    }

    #[test]
    fn test_session_with_malformed_student_entries_still_decodes() {
        let mut json = serde_json::to_value(session()).unwrap();
        json["students"] = serde_json::json!({
            "S1": "garbage",
            "S2": {"name": "Bo", "status": null},
            "S3": null,
            "S4": {"name": "Cy", "status": "present", "time": "09:05"},
        });

        let s: AttendanceSession = serde_json::from_value(json).unwrap();
        assert_eq!(s.students.len(), 4);
        assert_eq!(
            s.students[&StudentId::parse("S1").unwrap()],
            StudentRecord::default()
        );
        assert_eq!(
            s.students[&StudentId::parse("S2").unwrap()].status,
            AttendanceStatus::Pending
        );
        assert_eq!(
            s.students[&StudentId::parse("S4").unwrap()],
            StudentRecord::present("Cy", "09:05")
        );

        let roster = s.roster();
        assert_eq!(roster.iter().filter(|e| e.status == "pending").count(), 3);
    }

    #[test]
    fn test_session_json_is_flat() {
        let json = serde_json::to_value(session()).unwrap();
        assert_eq!(json["course_code"], "CS101");
        assert_eq!(json["current_code"], "48213");
        assert_eq!(json["active"], true);
        assert!(json.get("stopped_at").is_none());
        assert!(json.get("course").is_none());
    }

    #[test]
    fn test_roster_sorts_case_insensitively_with_id_tiebreak() {
        let mut s = session();
        for (id, name) in [("S3", "bob"), ("S2", "Ann"), ("S9", ""), ("S1", "Bob")] {
            s.record_presence(StudentId::parse(id).unwrap(), name, "09:00".into());
        }

        let order: Vec<(String, String)> =
            s.roster().into_iter().map(|e| (e.id, e.name)).collect();

        assert_eq!(
            order,
            vec![
                ("S2".to_string(), "Ann".to_string()),
                ("S1".to_string(), "Bob".to_string()),
                ("S3".to_string(), "bob".to_string()),
                ("S9".to_string(), "S9".to_string()),
            ]
        );
    }

    #[test]
    fn test_roster_malformed_record_reads_as_pending() {
        let mut s = session();
        s.students
            .insert(StudentId::parse("S5").unwrap(), StudentRecord::default());

        let roster = s.roster();

        assert_eq!(roster[0].status, "pending");
        assert_eq!(roster[0].name, "S5");
    }

    #[test]
    fn test_course_label_falls_back_to_course_id() {
        let course = CourseMeta {
            course_id: "TEST101".into(),
            ..CourseMeta::default()
        };
        assert_eq!(course.label(), "TEST101");
    }
}
