//! Error types for the protocol layer.
//!
//! Each crate in Rollcall defines its own error enum. When you see a
//! `ProtocolError`, the problem is in the shape of some data (a bad
//! identifier, a record that doesn't parse), never in storage or locking.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a record into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a record).
    ///
    /// Common causes: a truncated file, a hand-edited record with the
    /// wrong field types, or a document written by something else.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A caller-supplied value is missing or malformed.
    ///
    /// The string names the offending field so the HTTP layer can hand
    /// it straight back to the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
