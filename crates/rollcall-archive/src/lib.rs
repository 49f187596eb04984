//! Archival and reporting for stopped attendance sessions.
//!
//! When an instructor stops a session, the session engine hands the final
//! record to the [`Archiver`], which freezes it into a
//! [`HistoryRecord`](rollcall_protocol::HistoryRecord) under a
//! human-legible name. The same type answers the reporting questions:
//!
//! - [`Archiver::list`]: an instructor's past sessions, newest first
//! - [`Archiver::detail`]: one past session with its sorted roster
//! - [`Archiver::export_csv`]: the roster as a downloadable CSV

mod archiver;
mod csv;
mod error;

pub use archiver::{Archiver, history_id};
pub use csv::CsvExport;
pub use error::ArchiveError;
