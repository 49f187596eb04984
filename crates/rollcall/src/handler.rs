//! HTTP handlers and the router.
//!
//! Each handler follows the same shape:
//!   1. Authenticate the bearer token and check the caller's role
//!   2. Validate path and body into identifier newtypes
//!   3. Call the session engine or the archive
//!   4. Map the result onto a wire body
//!
//! Any error along the way becomes a [`RollcallError`], which renders
//! itself as `{ "ok": false, "kind": ..., "error": ... }`.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use rollcall_protocol::wire::{
    CheckinRequest, CheckinResponse, HistoryDetailResponse, HistoryListResponse,
    HistorySummary, StartRequest, StartResponse, StatusResponse, StopRequest, StopResponse,
};
use rollcall_protocol::{CheckinCode, SessionId, StudentId, TeacherId};
use rollcall_session::{AttendanceManager, Checkin, Location};
use rollcall_store::FileStore;
use serde::de::DeserializeOwned;

use crate::{Authenticator, Identity, RollcallError};

/// Shared state passed to every handler.
///
/// Wrapped in `Arc`s so axum can clone it per request for free.
pub struct AppState<A: Authenticator> {
    pub manager: Arc<AttendanceManager<FileStore>>,
    pub auth: Arc<A>,
}

impl<A: Authenticator> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            auth: Arc::clone(&self.auth),
        }
    }
}

/// Builds the full route table over `state`.
pub fn router<A: Authenticator>(state: AppState<A>) -> Router {
    Router::new()
        .route("/api/teacher/attendance/start", post(start::<A>))
        .route("/api/teacher/attendance/stop", post(stop::<A>))
        .route("/api/teacher/attendance/{id}/status", get(status::<A>))
        .route("/api/teacher/attendance/history", get(history_list::<A>))
        .route("/api/teacher/attendance/history/{id}", get(history_detail::<A>))
        .route(
            "/api/teacher/attendance/history/{id}/export",
            get(history_export::<A>),
        )
        .route("/api/student/attendance/checkin", post(checkin::<A>))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Teacher routes
// ---------------------------------------------------------------------------

/// `POST /api/teacher/attendance/start`
async fn start<A: Authenticator>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StartResponse>, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;
    let request: StartRequest = parse_body(&body)?;

    let (session_id, code) = state.manager.start(&teacher, request.into_course()).await?;

    Ok(Json(StartResponse {
        session_id: session_id.to_string(),
        current_code: code.to_string(),
    }))
}

/// `POST /api/teacher/attendance/stop`
async fn stop<A: Authenticator>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StopResponse>, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;
    let request: StopRequest = parse_body(&body)?;
    let session_id = SessionId::parse(&request.session_id)?;

    let stopped_at = state.manager.stop(&session_id, &teacher).await?;

    Ok(Json(StopResponse {
        ok: true,
        message: "attendance stopped".to_string(),
        session_id: session_id.to_string(),
        stopped_at,
    }))
}

/// `GET /api/teacher/attendance/{id}/status`
async fn status<A: Authenticator>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;
    let session_id = SessionId::parse(&id)?;

    let status = state.manager.status(&session_id, &teacher).await?;

    Ok(Json(status.into()))
}

/// `GET /api/teacher/attendance/history`
async fn history_list<A: Authenticator>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
) -> Result<Json<HistoryListResponse>, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;

    let records = state.manager.archiver().list(&teacher).await?;

    Ok(Json(HistoryListResponse {
        ok: true,
        history: records.iter().map(HistorySummary::from).collect(),
    }))
}

/// `GET /api/teacher/attendance/history/{id}`
async fn history_detail<A: Authenticator>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HistoryDetailResponse>, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;
    let session_id = SessionId::parse(&id)?;

    let record = state.manager.archiver().detail(&session_id, &teacher).await?;

    Ok(Json(HistoryDetailResponse {
        ok: true,
        session: HistorySummary::from(&record),
        students: record.session.roster(),
    }))
}

/// `GET /api/teacher/attendance/history/{id}/export`
async fn history_export<A: Authenticator>(
    State(state): State<AppState<A>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, RollcallError> {
    let teacher = require_teacher(&state, &headers).await?;
    let session_id = SessionId::parse(&id)?;

    let export = state.manager.archiver().export_csv(&session_id, &teacher).await?;

    // Filenames are built from cleaned session ids.
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Student routes
// ---------------------------------------------------------------------------

/// `POST /api/student/attendance/checkin`
async fn checkin<A: Authenticator>(
    State(state): State<AppState<A>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckinResponse>, RollcallError> {
    let (student, known_name) = require_student(&state, &headers).await?;
    let request: CheckinRequest = parse_body(&body)?;
    let code = CheckinCode::parse(&request.code)?;

    // A name typed on the check-in form wins over the one on the account.
    let name = request
        .name
        .filter(|name| !name.trim().is_empty())
        .or(known_name);
    let location = match (request.lat, request.lng) {
        (Some(lat), Some(lng)) => Some(Location { lat, lng }),
        _ => None,
    };

    state
        .manager
        .checkin(Checkin {
            code,
            student,
            name,
            location,
        })
        .await?;

    Ok(Json(CheckinResponse {
        ok: true,
        message: "checked in".to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extracts the token from `Authorization: Bearer <token>`.
fn bearer(headers: &HeaderMap) -> Result<&str, RollcallError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(RollcallError::Unauthenticated)
}

async fn require_teacher<A: Authenticator>(
    state: &AppState<A>,
    headers: &HeaderMap,
) -> Result<TeacherId, RollcallError> {
    match state.auth.authenticate(bearer(headers)?).await? {
        Identity::Teacher { id } => Ok(id),
        Identity::Student { .. } => Err(RollcallError::WrongRole("teacher")),
    }
}

async fn require_student<A: Authenticator>(
    state: &AppState<A>,
    headers: &HeaderMap,
) -> Result<(StudentId, Option<String>), RollcallError> {
    match state.auth.authenticate(bearer(headers)?).await? {
        Identity::Student { id, name } => Ok((id, name)),
        Identity::Teacher { .. } => Err(RollcallError::WrongRole("student")),
    }
}

/// Parses a JSON body. An empty body reads as `{}`, so every field
/// takes its default and validation reports what's missing.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, RollcallError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| RollcallError::BadBody(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_missing_header_is_unauthenticated() {
        assert!(matches!(
            bearer(&HeaderMap::new()),
            Err(RollcallError::Unauthenticated)
        ));
    }

    #[test]
    fn test_bearer_strips_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer teacher:T1"),
        );
        assert_eq!(bearer(&headers).unwrap(), "teacher:T1");
    }

    #[test]
    fn test_parse_body_empty_reads_as_defaults() {
        let request: StopRequest = parse_body(&Bytes::new()).unwrap();
        assert_eq!(request.session_id, "");
    }

    #[test]
    fn test_parse_body_malformed_json_is_bad_body() {
        let result: Result<StopRequest, _> = parse_body(&Bytes::from_static(b"{nope"));
        assert!(matches!(result, Err(RollcallError::BadBody(_))));
    }
}
