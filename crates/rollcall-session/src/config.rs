//! Tunables for the session engine.

use std::time::Duration;

/// Session engine configuration.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rollcall_session::SessionConfig;
///
/// let config = SessionConfig {
///     rotation_interval: Duration::from_secs(30),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.id_attempts, 5);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a check-in code stays valid after it is minted.
    ///
    /// Default: 10 seconds. A code is replaced the first time its session
    /// is read after the interval has passed.
    pub rotation_interval: Duration,

    /// How many random session ids `start` tries before giving up with
    /// a conflict. Default: 5.
    pub id_attempts: usize,

    /// How many times a freshly minted code is redrawn when another live
    /// session already holds it. Default: 5. After the last attempt the
    /// duplicate is kept; check-in re-validates every candidate anyway.
    pub code_attempts: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotation_interval: Duration::from_secs(10),
            id_attempts: 5,
            code_attempts: 5,
        }
    }
}

/// Configuration of the optional check-in geofence.
#[derive(Debug, Clone, PartialEq)]
pub struct FenceConfig {
    /// Off by default: check-ins are accepted from anywhere.
    pub enabled: bool,
    /// Centre of the allowed area, decimal degrees.
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of the allowed area in metres, inclusive.
    pub radius_m: f64,
}

impl Default for FenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            latitude: 13.720399,
            longitude: 100.453165,
            radius_m: 300.0,
        }
    }
}
