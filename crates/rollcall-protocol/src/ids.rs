//! Identifier newtypes.
//!
//! Every identifier that crosses the HTTP boundary ends up in a file name
//! or a map key, so each one is validated once, at construction, and
//! carried around as its own type afterwards. You can't accidentally pass
//! a `StudentId` where a `SessionId` is expected, even though both are
//! strings underneath.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Keeps only ASCII alphanumerics, `-` and `_`.
///
/// This is the single sanitizer for caller-supplied identifiers. The
/// result is always safe to use as a path component: no separators, no
/// dots, no whitespace.
pub fn clean_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Longest identifier accepted after cleaning. Keeps every id well under
/// the file name limit of common filesystems.
pub const MAX_ID_LEN: usize = 64;

/// Cleans `raw` and rejects an empty or over-long result.
fn cleaned(raw: &str, field: &str) -> Result<String, ProtocolError> {
    let clean = clean_identifier(raw);
    if clean.is_empty() {
        return Err(ProtocolError::InvalidInput(format!("{field} is required")));
    }
    if clean.len() > MAX_ID_LEN {
        return Err(ProtocolError::InvalidInput(format!(
            "{field} is longer than {MAX_ID_LEN} characters"
        )));
    }
    Ok(clean)
}

/// Implements `Display` and `as_str` for a string newtype.
macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Identifies one attendance session, e.g. `AB12C`.
///
/// Generated ids are 5 characters from `A-Z0-9`. Ids arriving from callers
/// are cleaned and capped at [`MAX_ID_LEN`] but not held to the generated
/// shape, so that lookups of legacy or hand-made records still work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Length of generated session ids.
    pub const LEN: usize = 5;

    /// Alphabet generated session ids are drawn from.
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

    /// Cleans and validates a caller-supplied session id.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if nothing usable remains after
    /// cleaning, or more than [`MAX_ID_LEN`] characters do.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        cleaned(raw, "session_id").map(Self)
    }

    /// Builds a fresh id of [`Self::LEN`] characters, asking `draw` for
    /// each one. `draw` must return a byte of the alphabet it is given.
    pub fn generate_with(mut draw: impl FnMut(&'static [u8]) -> u8) -> Self {
        Self((0..Self::LEN).map(|_| char::from(draw(Self::ALPHABET))).collect())
    }
}

string_id!(SessionId);

// ---------------------------------------------------------------------------
// CheckinCode
// ---------------------------------------------------------------------------

/// The short digits-only code students type to check in, e.g. `48213`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckinCode(String);

impl CheckinCode {
    /// Number of digits in a check-in code.
    pub const LEN: usize = 5;

    /// Alphabet codes are drawn from.
    pub const DIGITS: &'static [u8] = b"0123456789";

    /// Validates a submitted code: exactly [`Self::LEN`] ASCII digits,
    /// surrounding whitespace ignored.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] for anything else. The message is
    /// the same for every malformed code.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let trimmed = raw.trim();
        if trimmed.len() != Self::LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidInput(format!(
                "code must be {} digits",
                Self::LEN
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds a fresh code, one [`Self::DIGITS`] byte per call to `draw`.
    pub fn generate_with(mut draw: impl FnMut(&'static [u8]) -> u8) -> Self {
        Self((0..Self::LEN).map(|_| char::from(draw(Self::DIGITS))).collect())
    }
}

string_id!(CheckinCode);

// ---------------------------------------------------------------------------
// StudentId / TeacherId
// ---------------------------------------------------------------------------

/// A student's identity, as established by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentId(String);

impl StudentId {
    /// Cleans and validates a student id.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if nothing usable remains.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        cleaned(raw, "student_id").map(Self)
    }
}

string_id!(StudentId);

/// An instructor's identity, as established by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeacherId(String);

impl TeacherId {
    /// Cleans and validates a teacher id.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidInput`] if nothing usable remains.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        cleaned(raw, "teacher_id").map(Self)
    }
}

string_id!(TeacherId);
