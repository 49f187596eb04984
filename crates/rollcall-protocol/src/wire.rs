//! JSON bodies of the HTTP API.
//!
//! Request types are lenient: every field has a default and accepts the
//! camelCase spellings older clients send (`#[serde(alias = ...)]`).
//! Validation happens later, when the raw strings are turned into
//! identifier newtypes.
//!
//! Response types are exactly what clients see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CourseMeta, HistoryRecord};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// `POST /api/teacher/attendance/start`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default, alias = "courseId")]
    pub course_id: String,
    #[serde(default, alias = "courseTitle")]
    pub course_title: String,
    #[serde(default, alias = "courseCode")]
    pub course_code: String,
    #[serde(default)]
    pub section: String,
}

impl StartRequest {
    /// Trims every field into a [`CourseMeta`].
    pub fn into_course(self) -> CourseMeta {
        CourseMeta {
            course_id: self.course_id.trim().to_string(),
            course_title: self.course_title.trim().to_string(),
            course_code: self.course_code.trim().to_string(),
            section: self.section.trim().to_string(),
        }
    }
}

/// `POST /api/teacher/attendance/stop`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopRequest {
    #[serde(default, alias = "sessionId")]
    pub session_id: String,
}

/// `POST /api/student/attendance/checkin`
///
/// `lat`/`lng` are only consulted when the geofence is enabled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckinRequest {
    #[serde(
        default,
        alias = "session_token",
        alias = "sessionToken",
        alias = "sessionId",
        alias = "token"
    )]
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
    pub current_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopResponse {
    pub ok: bool,
    pub message: String,
    pub session_id: String,
    pub stopped_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub ok: bool,
    pub message: String,
}

/// One flattened roster line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub name: String,
    pub status: String,
    pub time: String,
}

/// `GET /api/teacher/attendance/{id}/status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session_id: String,
    pub current_code: String,
    pub active: bool,
    pub students: Vec<RosterEntry>,
}

/// Session metadata as shown in history views.
///
/// `timestamp` is the session's creation time; the name is kept for
/// compatibility with existing dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub session_id: String,
    pub course_title: String,
    pub course_code: String,
    pub section: String,
    pub timestamp: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub student_count: usize,
}

impl From<&HistoryRecord> for HistorySummary {
    fn from(record: &HistoryRecord) -> Self {
        let session = &record.session;
        Self {
            session_id: session.session_id.to_string(),
            course_title: session.course.course_title.clone(),
            course_code: session.course.label().to_string(),
            section: session.course.section.clone(),
            timestamp: session.created_at,
            stopped_at: session.stopped_at,
            student_count: session.students.len(),
        }
    }
}

/// `GET /api/teacher/attendance/history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryListResponse {
    pub ok: bool,
    pub history: Vec<HistorySummary>,
}

/// `GET /api/teacher/attendance/history/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDetailResponse {
    pub ok: bool,
    pub session: HistorySummary,
    pub students: Vec<RosterEntry>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    /// Stable, machine-readable error kind (`not_found`, `forbidden`, ...).
    pub kind: String,
    /// Human-readable message, safe to show to end users.
    pub error: String,
}
