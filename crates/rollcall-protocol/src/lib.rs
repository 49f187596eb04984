//! Shared vocabulary for Rollcall.
//!
//! This crate defines the "nouns" every other layer talks about:
//!
//! - **Identifiers** ([`SessionId`], [`CheckinCode`], [`StudentId`],
//!   [`TeacherId`]): validated newtypes, safe to use as file names.
//! - **Records** ([`AttendanceSession`], [`StudentRecord`],
//!   [`HistoryRecord`]): what gets persisted, one document per session.
//! - **Wire bodies** (the [`wire`] module): the JSON shapes of the HTTP API.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how records become bytes.
//!
//! # Architecture
//!
//! ```text
//! HTTP (rollcall) → Session engine → Archive → Store → Protocol (this crate)
//! ```
//!
//! Nothing here does I/O. The store decides where bytes go; this crate only
//! decides what they look like.

mod codec;
mod error;
mod ids;
mod records;
pub mod wire;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use ids::{CheckinCode, MAX_ID_LEN, SessionId, StudentId, TeacherId, clean_identifier};
pub use records::{
    AttendanceSession, AttendanceStatus, CourseMeta, HistoryRecord,
    StudentRecord,
};
