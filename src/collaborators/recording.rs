//! Collaborators that keep what they receive in memory, with an optional
//! always-fail mode for exercising contained-failure paths.

use std::sync::Mutex;

use uuid::Uuid;

use crate::alerts::EmergencyLogEntry;
use crate::error::CollaboratorError;

use super::{EmergencyLog, MetricsSink, NotificationChannel, NotificationMessage, NotificationSeverity};

/// A notification as it reached the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedNotification {
    pub message_id: String,
    pub channel_id: String,
    pub severity: NotificationSeverity,
    pub message: NotificationMessage,
}

pub struct RecordingChannel {
    published: Mutex<Vec<PublishedNotification>>,
    fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn published(&self) -> Vec<PublishedNotification> {
        self.published
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn published_on(&self, channel_id: &str) -> Vec<PublishedNotification> {
        self.published()
            .into_iter()
            .filter(|p| p.channel_id == channel_id)
            .collect()
    }
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationChannel for RecordingChannel {
    fn publish(
        &self,
        channel_id: &str,
        severity: NotificationSeverity,
        message: &NotificationMessage,
    ) -> Result<String, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable(format!(
                "channel {channel_id} is not accepting messages"
            )));
        }

        let message_id = Uuid::new_v4().to_string();
        let mut published = self
            .published
            .lock()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        published.push(PublishedNotification {
            message_id: message_id.clone(),
            channel_id: channel_id.to_string(),
            severity,
            message: message.clone(),
        });
        Ok(message_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricIncrement {
    pub namespace: String,
    pub metric_name: String,
    pub dimensions: Vec<(String, String)>,
}

pub struct RecordingMetrics {
    increments: Mutex<Vec<MetricIncrement>>,
    fail: bool,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self {
            increments: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            increments: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn increments(&self) -> Vec<MetricIncrement> {
        self.increments
            .lock()
            .map(|i| i.clone())
            .unwrap_or_default()
    }

    /// Number of increments recorded for a metric, across all dimensions.
    pub fn count(&self, namespace: &str, metric_name: &str) -> usize {
        self.increments()
            .iter()
            .filter(|i| i.namespace == namespace && i.metric_name == metric_name)
            .count()
    }
}

impl Default for RecordingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for RecordingMetrics {
    fn increment(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[(&str, &str)],
    ) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("metrics sink offline".into()));
        }

        let mut increments = self
            .increments
            .lock()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        increments.push(MetricIncrement {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimensions: dimensions
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Ok(())
    }
}

pub struct RecordingEmergencyLog {
    entries: Mutex<Vec<EmergencyLogEntry>>,
    fail: bool,
}

impl RecordingEmergencyLog {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn entries(&self) -> Vec<EmergencyLogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for RecordingEmergencyLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EmergencyLog for RecordingEmergencyLog {
    fn append(&self, entry: &EmergencyLogEntry) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("emergency log offline".into()));
        }

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        entries.push(entry.clone());
        Ok(())
    }
}
