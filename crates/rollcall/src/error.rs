//! Unified error type for the Rollcall service.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rollcall_archive::ArchiveError;
use rollcall_protocol::ProtocolError;
use rollcall_protocol::wire::ErrorBody;
use rollcall_session::AttendanceError;
use rollcall_store::StoreError;

/// The stable classes of failure clients see.
///
/// Every [`RollcallError`] maps to exactly one kind, and every kind to
/// one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    InvalidInput,
    Conflict,
    StorageFailure,
}

impl ErrorKind {
    /// The snake_case name used in error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Conflict => "conflict",
            Self::StorageFailure => "storage_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Top-level error that wraps all crate-specific errors.
///
/// Handlers return this and `?` converts the layer errors through the
/// `#[from]` impls. [`IntoResponse`] turns it into the JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum RollcallError {
    /// No usable credentials on the request.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but as the wrong kind of user for this route.
    #[error("this endpoint requires a {0} account")]
    WrongRole(&'static str),

    /// The request body isn't valid JSON of the expected shape.
    #[error("invalid request body: {0}")]
    BadBody(String),

    /// A configuration value couldn't be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Binding or serving failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Attendance(#[from] AttendanceError),
}

impl RollcallError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::WrongRole(_) => ErrorKind::Forbidden,
            Self::BadBody(_) => ErrorKind::InvalidInput,
            Self::Config(_) | Self::Io(_) | Self::Store(_) => ErrorKind::StorageFailure,
            Self::Protocol(ProtocolError::InvalidInput(_)) => ErrorKind::InvalidInput,
            Self::Protocol(_) => ErrorKind::StorageFailure,
            Self::Archive(e) => archive_kind(e),
            Self::Attendance(e) => match e {
                AttendanceError::NotFound(_) | AttendanceError::CodeNotFound => {
                    ErrorKind::NotFound
                }
                AttendanceError::Forbidden(_) | AttendanceError::OutsideFence => {
                    ErrorKind::Forbidden
                }
                AttendanceError::InvalidInput(_) => ErrorKind::InvalidInput,
                AttendanceError::Conflict { .. } => ErrorKind::Conflict,
                AttendanceError::Store(_) => ErrorKind::StorageFailure,
                AttendanceError::Archive(e) => archive_kind(e),
            },
        }
    }
}

fn archive_kind(e: &ArchiveError) -> ErrorKind {
    match e {
        ArchiveError::NotFound(_) => ErrorKind::NotFound,
        ArchiveError::Forbidden(_) => ErrorKind::Forbidden,
        ArchiveError::StillActive(_) => ErrorKind::Conflict,
        ArchiveError::Store(_) => ErrorKind::StorageFailure,
    }
}

impl IntoResponse for RollcallError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match kind {
            // Paths and I/O details stay in the log.
            ErrorKind::StorageFailure => {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };
        let body = ErrorBody {
            ok: false,
            kind: kind.as_str().to_string(),
            error: message,
        };
        (kind.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use rollcall_protocol::SessionId;

    use super::*;

    fn sid() -> SessionId {
        SessionId::parse("AB12C").unwrap()
    }

    #[test]
    fn test_kind_attendance_errors_map_to_taxonomy() {
        let cases = [
            (AttendanceError::NotFound(sid()), ErrorKind::NotFound),
            (AttendanceError::CodeNotFound, ErrorKind::NotFound),
            (AttendanceError::Forbidden(sid()), ErrorKind::Forbidden),
            (AttendanceError::OutsideFence, ErrorKind::Forbidden),
            (AttendanceError::InvalidInput("x".into()), ErrorKind::InvalidInput),
            (AttendanceError::Conflict { attempts: 5 }, ErrorKind::Conflict),
        ];
        for (err, kind) in cases {
            assert_eq!(RollcallError::from(err).kind(), kind);
        }
    }

    #[test]
    fn test_kind_nested_archive_error_uses_archive_mapping() {
        let err = RollcallError::from(AttendanceError::Archive(ArchiveError::Forbidden(sid())));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_kind_protocol_invalid_input_is_bad_request() {
        let err = RollcallError::from(ProtocolError::InvalidInput("code must be 5 digits".into()));
        assert_eq!(err.kind().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_into_response_storage_failure_hides_details() {
        let io = std::io::Error::other("/srv/data/attendance/AB12C.json: disk full");
        let response = RollcallError::Io(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_wrong_role_is_forbidden() {
        let response = RollcallError::WrongRole("teacher").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
