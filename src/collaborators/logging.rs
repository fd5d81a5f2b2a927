//! Log-only collaborators used by the CLI runner when no real delivery
//! backend is wired in.

use uuid::Uuid;

use crate::alerts::EmergencyLogEntry;
use crate::error::CollaboratorError;

use super::{EmergencyLog, MetricsSink, NotificationChannel, NotificationMessage, NotificationSeverity};

pub struct TracingChannel;

impl NotificationChannel for TracingChannel {
    fn publish(
        &self,
        channel_id: &str,
        severity: NotificationSeverity,
        message: &NotificationMessage,
    ) -> Result<String, CollaboratorError> {
        let message_id = Uuid::new_v4().to_string();
        tracing::info!(
            channel = channel_id,
            severity = severity.as_str(),
            subject_id = %message.subject_id,
            message_id = %message_id,
            title = %message.title,
            "Notification published"
        );
        Ok(message_id)
    }
}

pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn increment(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[(&str, &str)],
    ) -> Result<(), CollaboratorError> {
        tracing::debug!(namespace, metric = metric_name, ?dimensions, "Metric incremented");
        Ok(())
    }
}

pub struct TracingEmergencyLog;

impl EmergencyLog for TracingEmergencyLog {
    fn append(&self, entry: &EmergencyLogEntry) -> Result<(), CollaboratorError> {
        let conditions = serde_json::to_string(&entry.conditions)
            .map_err(|e| CollaboratorError::Rejected(e.to_string()))?;
        tracing::warn!(
            entry_id = %entry.id,
            subject_id = %entry.subject_id,
            channel = %entry.channel_id,
            severity = entry.severity.as_str(),
            recorded_at = %entry.recorded_at.to_rfc3339(),
            conditions = %conditions,
            "Emergency event logged"
        );
        Ok(())
    }
}
