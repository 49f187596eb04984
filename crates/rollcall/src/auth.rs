//! Authentication hook for establishing who is calling.
//!
//! Rollcall doesn't log anyone in itself. Every request carries a bearer
//! token and an [`Authenticator`] turns that token into an [`Identity`]:
//! an instructor or a student. Plug in whatever validates your tokens
//! (a JWT check, a session lookup) by implementing the trait.

use std::future::Future;

use rollcall_protocol::{StudentId, TeacherId};

use crate::RollcallError;

/// Who is making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Teacher { id: TeacherId },
    Student {
        id: StudentId,
        /// Display name known to the identity provider, if any.
        name: Option<String>,
    },
}

/// Validates a bearer token and returns the caller's identity.
///
/// # Trait bounds
///
/// - `Send + Sync` → one authenticator is shared by every request task.
/// - `'static` → it lives as long as the server.
pub trait Authenticator: Send + Sync + 'static {
    /// # Returns
    /// - `Ok(Identity)` for a valid token
    /// - `Err(RollcallError::Unauthenticated)` otherwise
    fn authenticate(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Identity, RollcallError>> + Send;
}

/// Trusts the token text. For local development and tests only.
///
/// Accepted tokens:
///
/// - `teacher:<id>`
/// - `student:<id>` or `student:<id>:<display name>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DevAuthenticator;

impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Identity, RollcallError> {
        let mut parts = token.trim().splitn(3, ':');
        let role = parts.next().unwrap_or_default();
        let id = parts.next().unwrap_or_default();

        match role {
            "teacher" => Ok(Identity::Teacher {
                id: TeacherId::parse(id).map_err(|_| RollcallError::Unauthenticated)?,
            }),
            "student" => Ok(Identity::Student {
                id: StudentId::parse(id).map_err(|_| RollcallError::Unauthenticated)?,
                name: parts
                    .next()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            }),
            _ => Err(RollcallError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_authenticate_teacher_token() {
        let identity = DevAuthenticator.authenticate("teacher:T1").await.unwrap();
        assert_eq!(
            identity,
            Identity::Teacher {
                id: TeacherId::parse("T1").unwrap()
            }
        );
    }

    #[tokio::test]
    async fn test_authenticate_student_token_with_name() {
        let identity = DevAuthenticator
            .authenticate("student:S1:Ann Lee")
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity::Student {
                id: StudentId::parse("S1").unwrap(),
                name: Some("Ann Lee".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_authenticate_unknown_role_is_unauthenticated() {
        for token in ["", "admin:A1", "teacher:", "student", "T1"] {
            let result = DevAuthenticator.authenticate(token).await;
            assert!(
                matches!(result, Err(RollcallError::Unauthenticated)),
                "{token:?}"
            );
        }
    }
}
