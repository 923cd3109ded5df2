//! Application-level configuration loading: admin credentials, venue offset and booking rules.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use time::UtcOffset;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CINEMA_BOOKING_CONFIG_PATH";
/// Environment variable that overrides the admin token from the file.
const ADMIN_TOKEN_ENV: &str = "ADMIN_TOKEN";

/// Business rules governing scheduling, seat locks and maintenance cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRules {
    /// Minimum idle time between two showtimes of the same theater.
    pub min_gap: time::Duration,
    /// Minimum distance between start times of the same movie within a branch.
    pub same_movie_spacing: time::Duration,
    /// Ticket sales must be opened at least this long before the screening.
    pub open_order_lead: time::Duration,
    /// Lifetime of a seat lock.
    pub seat_lock_ttl: time::Duration,
    pub max_seats_per_order: usize,
    pub lock_sweep_interval: Duration,
    pub showtime_close_interval: Duration,
    pub movie_refresh_interval: Duration,
    /// Upper bound for a gated mutation before it is reported as timed out.
    pub operation_timeout: Duration,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_gap: time::Duration::minutes(10),
            same_movie_spacing: time::Duration::minutes(30),
            open_order_lead: time::Duration::hours(2),
            seat_lock_ttl: time::Duration::minutes(3),
            max_seats_per_order: 8,
            lock_sweep_interval: Duration::from_secs(120),
            showtime_close_interval: Duration::from_secs(60),
            movie_refresh_interval: Duration::from_secs(24 * 60 * 60),
            operation_timeout: Duration::from_millis(5_000),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    admin_token: Option<String>,
    utc_offset: UtcOffset,
    rules: BookingRules,
}

impl AppConfig {
    /// Load the configuration from disk, then apply environment overrides.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        offset = %config.utc_offset,
                        "loaded booking configuration"
                    );
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        match env::var(ADMIN_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => config.with_admin_token(token),
            _ => config,
        }
    }

    /// Parse a JSON document; absent keys keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(contents)?;
        raw.try_into()
    }

    /// Replace the admin token.
    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Replace the booking rules.
    pub fn with_rules(mut self, rules: BookingRules) -> Self {
        self.rules = rules;
        self
    }

    /// Token expected in the `X-Admin-Token` header. `None` disables the admin API.
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }

    /// Offset of the venue's wall clock.
    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_token: None,
            utc_offset: UtcOffset::UTC,
            rules: BookingRules::default(),
        }
    }
}

/// Reasons a configuration document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("utc_offset_minutes {0} is out of range")]
    Offset(i32),
    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    admin_token: Option<String>,
    utc_offset_minutes: i32,
    min_gap_minutes: Option<u32>,
    same_movie_spacing_minutes: Option<u32>,
    open_order_lead_minutes: Option<u32>,
    seat_lock_ttl_seconds: Option<u32>,
    max_seats_per_order: Option<usize>,
    lock_sweep_interval_seconds: Option<u64>,
    showtime_close_interval_seconds: Option<u64>,
    movie_refresh_interval_seconds: Option<u64>,
    operation_timeout_ms: Option<u64>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let seconds = raw
            .utc_offset_minutes
            .checked_mul(60)
            .ok_or(ConfigError::Offset(raw.utc_offset_minutes))?;
        let utc_offset = UtcOffset::from_whole_seconds(seconds)
            .map_err(|_| ConfigError::Offset(raw.utc_offset_minutes))?;

        let defaults = BookingRules::default();
        let minutes = |value: Option<u32>, fallback| {
            value.map_or(fallback, |m| time::Duration::minutes(i64::from(m)))
        };
        let secs = |value: Option<u64>, fallback| value.map_or(fallback, Duration::from_secs);

        let rules = BookingRules {
            min_gap: minutes(raw.min_gap_minutes, defaults.min_gap),
            same_movie_spacing: minutes(raw.same_movie_spacing_minutes, defaults.same_movie_spacing),
            open_order_lead: minutes(raw.open_order_lead_minutes, defaults.open_order_lead),
            seat_lock_ttl: raw
                .seat_lock_ttl_seconds
                .map_or(defaults.seat_lock_ttl, |s| {
                    time::Duration::seconds(i64::from(s))
                }),
            max_seats_per_order: raw
                .max_seats_per_order
                .unwrap_or(defaults.max_seats_per_order),
            lock_sweep_interval: secs(raw.lock_sweep_interval_seconds, defaults.lock_sweep_interval),
            showtime_close_interval: secs(
                raw.showtime_close_interval_seconds,
                defaults.showtime_close_interval,
            ),
            movie_refresh_interval: secs(
                raw.movie_refresh_interval_seconds,
                defaults.movie_refresh_interval,
            ),
            operation_timeout: raw
                .operation_timeout_ms
                .map_or(defaults.operation_timeout, Duration::from_millis),
        };

        for (name, zero) in [
            ("seat_lock_ttl_seconds", rules.seat_lock_ttl.is_zero()),
            ("max_seats_per_order", rules.max_seats_per_order == 0),
            ("lock_sweep_interval_seconds", rules.lock_sweep_interval.is_zero()),
            (
                "showtime_close_interval_seconds",
                rules.showtime_close_interval.is_zero(),
            ),
            (
                "movie_refresh_interval_seconds",
                rules.movie_refresh_interval.is_zero(),
            ),
            ("operation_timeout_ms", rules.operation_timeout.is_zero()),
        ] {
            if zero {
                return Err(ConfigError::Zero(name));
            }
        }

        Ok(Self {
            admin_token: raw.admin_token.filter(|token| !token.trim().is_empty()),
            utc_offset,
            rules,
        })
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.rules(), &BookingRules::default());
        assert_eq!(config.utc_offset(), UtcOffset::UTC);
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json(
            r#"{
                "admin_token": "s3cret",
                "utc_offset_minutes": 420,
                "min_gap_minutes": 15,
                "seat_lock_ttl_seconds": 90,
                "max_seats_per_order": 4
            }"#,
        )
        .unwrap();

        assert_eq!(config.admin_token(), Some("s3cret"));
        assert_eq!(config.utc_offset().whole_hours(), 7);
        assert_eq!(config.rules().min_gap, time::Duration::minutes(15));
        assert_eq!(config.rules().seat_lock_ttl, time::Duration::seconds(90));
        assert_eq!(config.rules().max_seats_per_order, 4);
        assert_eq!(
            config.rules().same_movie_spacing,
            time::Duration::minutes(30)
        );
    }

    #[test]
    fn blank_admin_token_disables_admin_api() {
        let config = AppConfig::from_json(r#"{"admin_token": "  "}"#).unwrap();
        assert!(config.admin_token().is_none());
    }

    #[test]
    fn rejects_out_of_range_offset_and_zero_limits() {
        assert!(matches!(
            AppConfig::from_json(r#"{"utc_offset_minutes": 2000}"#),
            Err(ConfigError::Offset(2000))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"max_seats_per_order": 0}"#),
            Err(ConfigError::Zero("max_seats_per_order"))
        ));
    }
}
