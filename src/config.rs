use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::insights::score::ScoreDeductions;

/// Application-level constants
pub const APP_NAME: &str = "Vitalwatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "VITALWATCH_CONFIG";

/// Reminder windows open at most a day before the dose.
pub const MAX_REMINDER_LEAD_MINUTES: i64 = 24 * 60;

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "vitalwatch=info,warn"
}

/// Get the default config directory
/// <platform config dir>/vitalwatch/
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("vitalwatch"))
}

/// Get the default config file path
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.json"))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Runtime configuration shared by every pipeline in the process.
///
/// Every field has a default, so a partial JSON file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Primary alert channel (EMERGENCY and CRITICAL conditions).
    pub alert_channel: String,
    /// Direct/urgent channel (CRITICAL conditions only).
    pub urgent_channel: String,
    /// Medication reminder channel.
    pub reminder_channel: String,
    pub emergency_metrics_namespace: String,
    pub medication_metrics_namespace: String,
    pub vitals_metrics_namespace: String,
    /// Insight window used when a request does not name one.
    pub default_window_days: u32,
    /// Age assumed when the subject profile has none.
    pub default_age: u32,
    /// Minutes before the next dose at which the reminder window opens.
    pub reminder_lead_minutes: i64,
    pub score_deductions: ScoreDeductions,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            alert_channel: "health-alerts".into(),
            urgent_channel: "health-alerts-direct".into(),
            reminder_channel: "medication-reminders".into(),
            emergency_metrics_namespace: "HealthAssistant/Emergencies".into(),
            medication_metrics_namespace: "HealthAssistant/Medications".into(),
            vitals_metrics_namespace: "HealthAssistant/Vitals".into(),
            default_window_days: 30,
            default_age: 30,
            reminder_lead_minutes: 15,
            score_deductions: ScoreDeductions::default(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `$VITALWATCH_CONFIG` if set, else the default config file if it exists,
    /// else built-in defaults.
    pub fn resolve() -> Result<Self, ConfigError> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
            tracing::debug!(path = %explicit, "Loading config from VITALWATCH_CONFIG");
            return Self::load(Path::new(&explicit));
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading default config file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("alertChannel", &self.alert_channel),
            ("urgentChannel", &self.urgent_channel),
            ("reminderChannel", &self.reminder_channel),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "channel id must not be empty".into(),
                });
            }
        }
        if self.default_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "defaultWindowDays",
                reason: "window must be at least one day".into(),
            });
        }
        if self.reminder_lead_minutes <= 0 {
            return Err(ConfigError::Invalid {
                field: "reminderLeadMinutes",
                reason: format!("must be positive, got {}", self.reminder_lead_minutes),
            });
        }
        if self.reminder_lead_minutes > MAX_REMINDER_LEAD_MINUTES {
            return Err(ConfigError::Invalid {
                field: "reminderLeadMinutes",
                reason: format!(
                    "must be at most {MAX_REMINDER_LEAD_MINUTES}, got {}",
                    self.reminder_lead_minutes
                ),
            });
        }
        Ok(())
    }

    pub fn reminder_lead(&self) -> chrono::Duration {
        // Clamped so a config that skipped validate() still yields a valid span.
        chrono::Duration::minutes(self.reminder_lead_minutes.clamp(1, MAX_REMINDER_LEAD_MINUTES))
    }
}
