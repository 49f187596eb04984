//! Error types for the storage layer.

use rollcall_protocol::ProtocolError;

/// Errors that can occur while reading or writing records.
///
/// Messages include file names for the logs. The HTTP layer never shows
/// them to clients.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A filesystem operation failed.
    ///
    /// `op` says which step ("read", "rename", ...) so a log line is
    /// enough to tell a full disk from a permissions problem.
    #[error("storage {op} failed for {name}: {source}")]
    Io {
        op: &'static str,
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("could not encode record {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: ProtocolError,
    },

    /// A stored record exists but doesn't parse.
    #[error("record {name} is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: ProtocolError,
    },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            name: name.into(),
            source,
        }
    }
}
