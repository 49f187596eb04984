//! Random session ids and check-in codes.

use rand::Rng;
use rollcall_protocol::{CheckinCode, SessionId};

/// Produces fresh identifiers.
///
/// The engine only ever asks for "another one"; uniqueness is checked by
/// the caller against the store and the code index.
pub trait CodeSource: Send + Sync + 'static {
    /// A new 5-character session id from `A-Z0-9`.
    fn session_id(&self) -> SessionId;

    /// A new 5-digit check-in code.
    fn checkin_code(&self) -> CheckinCode;
}

/// The production source.
///
/// `rand::rng()` is a thread-local ChaCha-based CSPRNG reseeded from the
/// OS, so one code says nothing about the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodes;

impl CodeSource for RandomCodes {
    fn session_id(&self) -> SessionId {
        let mut rng = rand::rng();
        SessionId::generate_with(|alphabet| alphabet[rng.random_range(0..alphabet.len())])
    }

    fn checkin_code(&self) -> CheckinCode {
        let mut rng = rand::rng();
        CheckinCode::generate_with(|digits| digits[rng.random_range(0..digits.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_uses_uppercase_alphanumerics() {
        for _ in 0..100 {
            let id = RandomCodes.session_id();
            assert_eq!(id.as_str().len(), SessionId::LEN);
            assert!(
                id.as_str()
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()),
                "{id}"
            );
        }
    }

    #[test]
    fn test_checkin_code_parses_as_valid_code() {
        for _ in 0..100 {
            let code = RandomCodes.checkin_code();
            assert_eq!(CheckinCode::parse(code.as_str()).unwrap(), code);
        }
    }

    #[test]
    fn test_checkin_code_successive_draws_differ() {
        let codes: std::collections::HashSet<_> =
            (0..50).map(|_| RandomCodes.checkin_code()).collect();
        assert!(codes.len() > 1);
    }
}
