//! Durable storage for Rollcall.
//!
//! Two traits describe what the engine needs from persistence:
//!
//! - [`SessionStore`]: one mutable record per attendance session,
//!   `get`/`put`/`list`/`delete` by session id.
//! - [`HistoryStore`]: write-once snapshots of stopped sessions.
//!
//! [`FileStore`] implements both on the local filesystem, one JSON file per
//! record, every write going through a temporary file and an atomic rename.
//! Swapping in an embedded database means implementing these two traits;
//! nothing above this crate touches paths.
//!
//! # What this crate does NOT do
//!
//! It does not serialize concurrent read-modify-write cycles. Each single
//! write is atomic, but two writers racing on the same session would still
//! lose an update. Per-session locking lives in the session engine.

mod error;
mod file;
mod traits;

pub use error::StoreError;
pub use file::FileStore;
pub use traits::{HistoryStore, SessionStore};
