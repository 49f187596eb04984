//! Codec trait and implementations for serializing/deserializing records.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The store doesn't care HOW records are serialized: it just needs
//! something that implements the [`Codec`] trait. Today that is
//! [`JsonCodec`], so the files on disk stay readable with any text editor.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between threads (the store is shared
///   by every request task).
/// - `'static` → the codec owns everything it needs, so it can live
///   inside long-lived state.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the decoded value
/// doesn't borrow from the input bytes, so the read buffer can be dropped
/// right after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that writes pretty-printed JSON (via `serde_json`).
///
/// Records are small and rarely written, so readability wins over size.
/// An instructor can open `data/attendance/AB12C.json` and see exactly
/// who checked in.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use rollcall_protocol::{Codec, JsonCodec, StudentRecord};
///
/// let codec = JsonCodec;
/// let record = StudentRecord::present("Ann", "09:05");
///
/// let bytes = codec.encode(&record).unwrap();
/// let decoded: StudentRecord = codec.decode(&bytes).unwrap();
/// assert_eq!(record, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec_pretty(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<crate::StudentRecord, _> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_json_codec_encode_is_human_readable() {
        let bytes = JsonCodec
            .encode(&crate::StudentRecord::present("Ann", "09:05"))
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains('\n'), "pretty output spans multiple lines");
        assert!(text.contains("\"present\""));
    }
}
