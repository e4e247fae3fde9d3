//! Runtime configuration for the task core.
//!
//! Values come from environment variables with fallbacks suitable for local
//! development. Lookups go through a closure so tests can supply a map
//! instead of mutating the process environment.

use crate::task::domain::BusinessCalendar;
use chrono::FixedOffset;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the sensitive title marker.
pub const SENSITIVE_MARKER_ENV: &str = "TAREAS_SENSITIVE_MARKER";
/// Environment variable holding the quality department name marker.
pub const QUALITY_MARKER_ENV: &str = "TAREAS_QUALITY_MARKER";
/// Environment variable holding the business UTC offset in seconds.
pub const BUSINESS_OFFSET_ENV: &str = "TAREAS_BUSINESS_UTC_OFFSET_SECS";
/// Environment variable holding the notification icon.
pub const NOTIFICATION_ICON_ENV: &str = "TAREAS_NOTIFICATION_ICON";
/// Environment variable holding the deep-link prefix.
pub const LINK_PREFIX_ENV: &str = "TAREAS_LINK_PREFIX";
/// Environment variable holding the database connection string.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable holding the connection pool size.
pub const POOL_SIZE_ENV: &str = "TAREAS_DB_POOL_SIZE";

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure description.
        reason: String,
    },

    /// A required variable is unset.
    #[error("missing required setting {0}")]
    Missing(&'static str),

    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(String),
}

/// Business policy knobs consumed by the services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Title prefix marking sensitive (process-improvement) tasks.
    pub sensitive_marker: String,
    /// Name fragment adapters use to flag quality departments.
    pub quality_department_marker: String,
    /// Business timezone as seconds east of UTC.
    pub business_utc_offset_secs: i32,
    /// Icon sent with every push payload.
    pub notification_icon: String,
    /// Prefix of task deep links.
    pub link_prefix: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            sensitive_marker: "KAIZEN".to_owned(),
            quality_department_marker: "CALIDAD".to_owned(),
            business_utc_offset_secs: -6 * 3600,
            notification_icon: "/icons/icon-192x192.png".to_owned(),
            link_prefix: "/tareas".to_owned(),
        }
    }
}

impl PolicyConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable offset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, defaulting unset values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unparseable or
    /// out-of-range offset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let business_utc_offset_secs = match lookup(BUSINESS_OFFSET_ENV) {
            Some(raw) => parse_offset(&raw)?,
            None => defaults.business_utc_offset_secs,
        };
        Ok(Self {
            sensitive_marker: lookup(SENSITIVE_MARKER_ENV).unwrap_or(defaults.sensitive_marker),
            quality_department_marker: lookup(QUALITY_MARKER_ENV)
                .unwrap_or(defaults.quality_department_marker),
            business_utc_offset_secs,
            notification_icon: lookup(NOTIFICATION_ICON_ENV)
                .unwrap_or(defaults.notification_icon),
            link_prefix: lookup(LINK_PREFIX_ENV).unwrap_or(defaults.link_prefix),
        })
    }

    /// Returns the business calendar for the configured offset.
    #[must_use]
    pub fn calendar(&self) -> BusinessCalendar {
        FixedOffset::east_opt(self.business_utc_offset_secs)
            .map_or_else(BusinessCalendar::utc, BusinessCalendar::new)
    }

    /// Builds the deep link for a task.
    #[must_use]
    pub fn task_link(&self, task_id: impl std::fmt::Display) -> String {
        format!("{}/{task_id}", self.link_prefix.trim_end_matches('/'))
    }

    /// Returns `true` when a department name carries the quality marker,
    /// ignoring case.
    ///
    /// Only adapters loading departments without an explicit flag use this.
    #[must_use]
    pub fn looks_like_quality_department(&self, name: &str) -> bool {
        let marker = self.quality_department_marker.trim();
        !marker.is_empty() && name.to_lowercase().contains(&marker.to_lowercase())
    }
}

fn parse_offset(raw: &str) -> Result<i32, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        name: BUSINESS_OFFSET_ENV,
        value: raw.to_owned(),
        reason,
    };
    let seconds = raw
        .trim()
        .parse::<i32>()
        .map_err(|err| invalid(err.to_string()))?;
    if FixedOffset::east_opt(seconds).is_none() {
        return Err(invalid("offset must be within ±24h".to_owned()));
    }
    Ok(seconds)
}

/// `PostgreSQL` connection pool type used by the adapters.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Connection string.
    pub url: String,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl DatabaseConfig {
    /// Pool size used when none is configured.
    pub const DEFAULT_POOL_SIZE: u32 = 10;

    /// Reads the settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] without `DATABASE_URL` and
    /// [`ConfigError::InvalidValue`] for a bad pool size.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] without a URL and
    /// [`ConfigError::InvalidValue`] for a zero or unparseable pool size.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(DATABASE_URL_ENV).ok_or(ConfigError::Missing(DATABASE_URL_ENV))?;
        let pool_size = match lookup(POOL_SIZE_ENV) {
            None => Self::DEFAULT_POOL_SIZE,
            Some(raw) => {
                let parsed = raw.trim().parse::<u32>();
                match parsed {
                    Ok(size) if size > 0 => size,
                    Ok(_) => {
                        return Err(ConfigError::InvalidValue {
                            name: POOL_SIZE_ENV,
                            value: raw,
                            reason: "pool size must be positive".to_owned(),
                        });
                    }
                    Err(err) => {
                        return Err(ConfigError::InvalidValue {
                            name: POOL_SIZE_ENV,
                            value: raw,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        };
        Ok(Self { url, pool_size })
    }

    /// Builds the shared connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Pool`] if the pool cannot be created.
    pub fn build_pool(&self) -> Result<PgPool, ConfigError> {
        let manager = ConnectionManager::<PgConnection>::new(self.url.clone());
        Pool::builder()
            .max_size(self.pool_size)
            .build(manager)
            .map_err(|err| ConfigError::Pool(err.to_string()))
    }
}
