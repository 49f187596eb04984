//! # Rollcall
//!
//! Attendance taking over HTTP with rotating check-in codes.
//!
//! An instructor starts a session and gets a short id plus a 5-digit
//! code. The code is shown in the room and replaced every few seconds;
//! students submit whatever code is on screen to be marked present. When
//! the instructor stops the session, the roster is archived and can be
//! listed, inspected, or downloaded as CSV.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::prelude::*;
//!
//! # async fn run() -> Result<(), RollcallError> {
//! let server = RollcallServer::<DevAuthenticator>::builder()
//!     .bind("127.0.0.1:5000")
//!     .data_dir("./data")
//!     .build(DevAuthenticator)
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Caller |
//! |---|---|---|
//! | POST | `/api/teacher/attendance/start` | teacher |
//! | POST | `/api/teacher/attendance/stop` | teacher |
//! | GET | `/api/teacher/attendance/{id}/status` | teacher |
//! | GET | `/api/teacher/attendance/history` | teacher |
//! | GET | `/api/teacher/attendance/history/{id}` | teacher |
//! | GET | `/api/teacher/attendance/history/{id}/export` | teacher |
//! | POST | `/api/student/attendance/checkin` | student |

mod auth;
mod config;
mod error;
mod handler;
mod server;

pub use auth::{Authenticator, DevAuthenticator, Identity};
pub use config::ServerConfig;
pub use error::{ErrorKind, RollcallError};
pub use handler::{AppState, router};
pub use server::{RollcallServer, RollcallServerBuilder};

/// Everything needed to run a server, in one import.
pub mod prelude {
    pub use crate::{
        Authenticator, DevAuthenticator, ErrorKind, Identity, RollcallError,
        RollcallServer, ServerConfig,
    };
    pub use rollcall_protocol::{StudentId, TeacherId};
    pub use rollcall_session::{FenceConfig, SessionConfig};
}
