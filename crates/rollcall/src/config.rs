//! Server configuration.
//!
//! Defaults cover local development. [`ServerConfig::from_env`] overrides
//! them from the process environment:
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ROLLCALL_BIND` | `bind_addr` | `127.0.0.1:5000` |
//! | `ROLLCALL_DATA_DIR` | `data_dir` | `./data` |
//! | `ROLLCALL_ROTATION_SECS` | `session.rotation_interval` | `10` |
//! | `ROLLCALL_FENCE_ENABLED` | `fence.enabled` | `false` |
//! | `ROLLCALL_FENCE_LAT` | `fence.latitude` | `13.720399` |
//! | `ROLLCALL_FENCE_LNG` | `fence.longitude` | `100.453165` |
//! | `ROLLCALL_FENCE_RADIUS_M` | `fence.radius_m` | `300` |
//! | `ALLOW_OFFCAMPUS` | forces `fence.enabled = false` when truthy | unset |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rollcall_session::{FenceConfig, SessionConfig};

use crate::RollcallError;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Root of the file store. Sessions go in `attendance/`, history in
    /// `attendance_history/`.
    pub data_dir: PathBuf,
    pub session: SessionConfig,
    pub fence: FenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            data_dir: PathBuf::from("./data"),
            session: SessionConfig::default(),
            fence: FenceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// [`RollcallError::Config`] naming the variable whose value couldn't
    /// be parsed. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, RollcallError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RollcallError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("ROLLCALL_BIND") {
            config.bind_addr = bind;
        }
        if let Some(dir) = lookup("ROLLCALL_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse::<u64>(&lookup, "ROLLCALL_ROTATION_SECS")? {
            // A zero interval would replace every code before it could be used.
            if secs == 0 {
                return Err(RollcallError::Config(
                    "ROLLCALL_ROTATION_SECS must be at least 1".to_string(),
                ));
            }
            config.session.rotation_interval = Duration::from_secs(secs);
        }
        if let Some(enabled) = flag(&lookup, "ROLLCALL_FENCE_ENABLED")? {
            config.fence.enabled = enabled;
        }
        if let Some(lat) = parse(&lookup, "ROLLCALL_FENCE_LAT")? {
            config.fence.latitude = lat;
        }
        if let Some(lng) = parse(&lookup, "ROLLCALL_FENCE_LNG")? {
            config.fence.longitude = lng;
        }
        if let Some(radius) = parse(&lookup, "ROLLCALL_FENCE_RADIUS_M")? {
            config.fence.radius_m = radius;
        }
        if flag(&lookup, "ALLOW_OFFCAMPUS")? == Some(true) {
            config.fence.enabled = false;
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, RollcallError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| RollcallError::Config(format!("{key}={raw:?} is not a valid value")))
        })
        .transpose()
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, RollcallError> {
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(RollcallError::Config(format!("{key}={raw:?} is not a boolean"))),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, RollcallError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_empty_env_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert_eq!(config.session.rotation_interval, Duration::from_secs(10));
        assert!(!config.fence.enabled);
    }

    #[test]
    fn test_from_lookup_overrides_fields() {
        let config = config_from(&[
            ("ROLLCALL_BIND", "0.0.0.0:8080"),
            ("ROLLCALL_DATA_DIR", "/srv/rollcall"),
            ("ROLLCALL_ROTATION_SECS", "30"),
            ("ROLLCALL_FENCE_ENABLED", "yes"),
            ("ROLLCALL_FENCE_RADIUS_M", "150.5"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.data_dir, PathBuf::from("/srv/rollcall"));
        assert_eq!(config.session.rotation_interval, Duration::from_secs(30));
        assert!(config.fence.enabled);
        assert_eq!(config.fence.radius_m, 150.5);
    }

    #[test]
    fn test_from_lookup_allow_offcampus_disables_fence() {
        let config = config_from(&[
            ("ROLLCALL_FENCE_ENABLED", "true"),
            ("ALLOW_OFFCAMPUS", "1"),
        ])
        .unwrap();
        assert!(!config.fence.enabled);
    }

    #[test]
    fn test_from_lookup_bad_number_names_variable() {
        let err = config_from(&[("ROLLCALL_ROTATION_SECS", "ten")]).unwrap_err();
        assert!(matches!(&err, RollcallError::Config(m) if m.contains("ROLLCALL_ROTATION_SECS")));
    }

    #[test]
    fn test_from_lookup_zero_rotation_is_config_error() {
        let err = config_from(&[("ROLLCALL_ROTATION_SECS", "0")]).unwrap_err();
        assert!(matches!(&err, RollcallError::Config(m) if m.contains("ROLLCALL_ROTATION_SECS")));
    }

    #[test]
    fn test_from_lookup_bad_flag_is_config_error() {
        let err = config_from(&[("ALLOW_OFFCAMPUS", "maybe")]).unwrap_err();
        assert!(matches!(err, RollcallError::Config(_)));
    }
}
