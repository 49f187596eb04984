//! The attendance session engine.
//!
//! This crate owns everything that happens between "instructor opens a
//! window" and "instructor closes it":
//!
//! 1. **Lifecycle** ([`AttendanceManager::start`], [`AttendanceManager::stop`])
//!    allocates session ids, mints the first code, and hands stopped
//!    sessions to the archive.
//! 2. **Rotation** ([`AttendanceManager::rotate_if_stale`]) replaces a code
//!    once it is older than the rotation interval, but only when the
//!    session is read. There is no background timer.
//! 3. **Check-in** ([`AttendanceManager::checkin`]) matches a submitted
//!    code to a live session and records the student as present.
//! 4. **Roster** ([`AttendanceManager::status`]) returns the live code and
//!    the sorted student list.
//!
//! # Concurrency
//!
//! Every read-modify-write of a session runs under that session's own
//! async mutex, so two students checking in at the same moment can't
//! overwrite each other. Different sessions never contend.
//!
//! ```text
//! HTTP (above)  ← turns requests into calls on AttendanceManager
//!     ↕
//! Session engine (this crate)  ← locks, code index, lazy rotation
//!     ↕
//! Archive / Store (below)  ← durable records
//! ```

mod checkin;
mod clock;
mod codes;
mod config;
mod error;
mod fence;
mod index;
mod locks;
mod manager;
mod roster;

pub use checkin::Checkin;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codes::{CodeSource, RandomCodes};
pub use config::{FenceConfig, SessionConfig};
pub use error::AttendanceError;
pub use fence::{CampusFence, GeoFence, Location, OpenFence, haversine_m};
pub use manager::AttendanceManager;
pub use roster::SessionStatus;
