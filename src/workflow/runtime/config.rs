//! Worker configuration.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`WorkerConfig::namespace`].
pub const NAMESPACE_ENV: &str = "RELAI_NAMESPACE";
/// Environment variable overriding [`WorkerConfig::task_queue`].
pub const TASK_QUEUE_ENV: &str = "RELAI_TASK_QUEUE";
/// Environment variable overriding [`WorkerConfig::max_concurrent_activities`].
pub const MAX_CONCURRENT_ACTIVITIES_ENV: &str = "RELAI_MAX_CONCURRENT_ACTIVITIES";
/// Environment variable overriding [`WorkerConfig::closed_retention_days`].
pub const RETENTION_DAYS_ENV: &str = "RELAI_RETENTION_DAYS";
/// Environment variable overriding [`WorkerConfig::state_dir`].
pub const STATE_DIR_ENV: &str = "RELAI_STATE_DIR";

/// Settings for a workflow worker process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Logical namespace the worker serves.
    pub namespace: String,
    /// Task queue instances are bound to.
    pub task_queue: String,
    /// Upper bound on activity attempts executing at once.
    pub max_concurrent_activities: usize,
    /// Days a closed instance is kept before purging.
    pub closed_retention_days: u32,
    /// Directory holding the persisted workflow instances.
    pub state_dir: Utf8PathBuf,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_owned(),
            task_queue: "relai-task-queue".to_owned(),
            max_concurrent_activities: 16,
            closed_retention_days: 7,
            state_dir: Utf8PathBuf::from("relai-state"),
        }
    }
}

/// Errors raised while loading worker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`WorkerConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A setting has an unusable value.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
    },
}

impl WorkerConfig {
    /// How long closed instances are retained.
    #[must_use]
    pub fn closed_retention(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.closed_retention_days))
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] for unusable settings.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str::<Self>(text)?.validated()
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be opened, or any
    /// error from [`WorkerConfig::from_json`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: path.to_owned(),
            source,
        };
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            read_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "config path has no file name",
            ))
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let text = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_json(&text)
    }

    /// Applies overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when an override is unusable.
    pub fn with_process_env(self) -> Result<Self, ConfigError> {
        self.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when an override is unusable.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(namespace) = lookup(NAMESPACE_ENV) {
            self.namespace = namespace;
        }
        if let Some(task_queue) = lookup(TASK_QUEUE_ENV) {
            self.task_queue = task_queue;
        }
        if let Some(raw) = lookup(MAX_CONCURRENT_ACTIVITIES_ENV) {
            self.max_concurrent_activities = parse_number(MAX_CONCURRENT_ACTIVITIES_ENV, &raw)?;
        }
        if let Some(raw) = lookup(RETENTION_DAYS_ENV) {
            self.closed_retention_days = parse_number(RETENTION_DAYS_ENV, &raw)?;
        }
        if let Some(state_dir) = lookup(STATE_DIR_ENV) {
            self.state_dir = Utf8PathBuf::from(state_dir);
        }
        self.validated()
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        self.namespace = non_blank("namespace", &self.namespace)?;
        self.task_queue = non_blank("task_queue", &self.task_queue)?;
        if self.state_dir.as_str().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "state_dir",
                value: self.state_dir.into_string(),
            });
        }
        if self.max_concurrent_activities == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_concurrent_activities",
                value: "0".to_owned(),
            });
        }
        Ok(self)
    }
}

fn non_blank(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_owned(),
    })
}
