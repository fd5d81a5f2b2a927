//! Alert dispatch.
//!
//! Turns the conditions raised for one snapshot into at most two
//! notifications: one on the primary channel covering every EMERGENCY and
//! CRITICAL condition, and a second on the urgent channel when anything is
//! CRITICAL. Each dispatched notification is counted and logged. Delivery,
//! metric and log failures are contained here and reported in the
//! [`DispatchReport`]; they never reach the caller as errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::collaborators::{
    EmergencyLog, MetricsSink, NotificationChannel, NotificationMessage, NotificationSeverity,
};
use crate::config::ServiceConfig;
use crate::medications::ReminderEvent;
use crate::monitoring::{highest_tier, Condition, SeverityTier};

// ═══════════════════════════════════════════
// Records
// ═══════════════════════════════════════════

/// One entry in the append-only emergency log, written per dispatched
/// notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyLogEntry {
    pub id: Uuid,
    pub subject_id: String,
    pub channel_id: String,
    pub severity: NotificationSeverity,
    pub recorded_at: DateTime<Utc>,
    pub conditions: Vec<Condition>,
}

/// Which notification of a dispatch a delivery belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryRoute {
    Primary,
    Urgent,
    Reminder,
}

/// Outcome of one publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub route: DeliveryRoute,
    pub channel_id: String,
    /// Channel-assigned id, absent when publishing failed.
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl Delivery {
    pub fn delivered(&self) -> bool {
        self.message_id.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub deliveries: Vec<Delivery>,
    /// Metric increments or log appends that failed and were skipped.
    pub contained_failures: usize,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    pub fn route(&self, route: DeliveryRoute) -> Option<&Delivery> {
        self.deliveries.iter().find(|d| d.route == route)
    }
}

// ═══════════════════════════════════════════
// Coordinator
// ═══════════════════════════════════════════

pub struct AlertDispatchCoordinator {
    channel: Arc<dyn NotificationChannel>,
    metrics: Arc<dyn MetricsSink>,
    log: Arc<dyn EmergencyLog>,
    alert_channel: String,
    urgent_channel: String,
    reminder_channel: String,
    metrics_namespace: String,
}

impl AlertDispatchCoordinator {
    pub fn new(
        channel: Arc<dyn NotificationChannel>,
        metrics: Arc<dyn MetricsSink>,
        log: Arc<dyn EmergencyLog>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            channel,
            metrics,
            log,
            alert_channel: config.alert_channel.clone(),
            urgent_channel: config.urgent_channel.clone(),
            reminder_channel: config.reminder_channel.clone(),
            metrics_namespace: config.emergency_metrics_namespace.clone(),
        }
    }

    /// Dispatch alerts for the conditions raised on one snapshot.
    /// WARNING and NORMAL conditions never dispatch.
    pub fn dispatch(
        &self,
        subject_id: &str,
        conditions: &[Condition],
        now: DateTime<Utc>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        let alerting: Vec<Condition> = conditions
            .iter()
            .filter(|c| c.tier.is_alerting())
            .cloned()
            .collect();
        if alerting.is_empty() {
            return report;
        }

        let top = highest_tier(&alerting);
        let primary_severity = if top == SeverityTier::Critical {
            NotificationSeverity::Critical
        } else {
            NotificationSeverity::High
        };
        self.notify(
            &mut report,
            DeliveryRoute::Primary,
            subject_id,
            primary_severity,
            alerting,
            now,
        );

        let critical: Vec<Condition> = conditions
            .iter()
            .filter(|c| c.tier == SeverityTier::Critical)
            .cloned()
            .collect();
        if !critical.is_empty() {
            self.notify(
                &mut report,
                DeliveryRoute::Urgent,
                subject_id,
                NotificationSeverity::Critical,
                critical,
                now,
            );
        }

        tracing::info!(
            subject_id,
            tier = %top,
            notifications = report.deliveries.len(),
            delivered = report.deliveries.iter().filter(|d| d.delivered()).count(),
            contained_failures = report.contained_failures,
            "Alert dispatch complete"
        );
        report
    }

    /// Publish medication reminders on the reminder channel, one message each.
    pub fn dispatch_reminders(&self, events: &[ReminderEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        for event in events {
            let message = NotificationMessage {
                title: format!("Medication Reminder: {}", event.medication_name),
                subject_id: event.subject_id.clone(),
                payload: json!({
                    "type": "MEDICATION_REMINDER",
                    "reminder": event,
                }),
            };
            let delivery = self.publish(
                DeliveryRoute::Reminder,
                &self.reminder_channel,
                NotificationSeverity::Info,
                &message,
            );
            report.deliveries.push(delivery);
        }
        report
    }

    // ── helpers ──────────────────────────────────────────

    fn notify(
        &self,
        report: &mut DispatchReport,
        route: DeliveryRoute,
        subject_id: &str,
        severity: NotificationSeverity,
        conditions: Vec<Condition>,
        now: DateTime<Utc>,
    ) {
        let channel_id = match route {
            DeliveryRoute::Urgent => self.urgent_channel.clone(),
            _ => self.alert_channel.clone(),
        };

        let title = match route {
            DeliveryRoute::Urgent => format!("URGENT: Critical health alert for {subject_id}"),
            _ => format!("Health Alert: {} for {subject_id}", severity.as_str()),
        };
        let message = NotificationMessage {
            title,
            subject_id: subject_id.to_string(),
            payload: json!({
                "type": "EMERGENCY_ALERT",
                "severity": severity,
                "timestamp": now,
                "conditions": conditions,
            }),
        };

        report
            .deliveries
            .push(self.publish(route, &channel_id, severity, &message));

        for condition in &conditions {
            let condition_type = condition.condition_type();
            if let Err(e) = self.metrics.increment(
                &self.metrics_namespace,
                "EmergencyEvent",
                &[("SubjectId", subject_id), ("ConditionType", &condition_type)],
            ) {
                tracing::warn!(subject_id, condition_type = %condition_type, error = %e, "Emergency metric not recorded");
                report.contained_failures += 1;
            }
        }
        if let Err(e) = self
            .metrics
            .increment(&self.metrics_namespace, "TotalEmergencies", &[])
        {
            tracing::warn!(subject_id, error = %e, "Total emergencies metric not recorded");
            report.contained_failures += 1;
        }

        let entry = EmergencyLogEntry {
            id: Uuid::new_v4(),
            subject_id: subject_id.to_string(),
            channel_id,
            severity,
            recorded_at: now,
            conditions,
        };
        if let Err(e) = self.log.append(&entry) {
            tracing::warn!(subject_id, entry_id = %entry.id, error = %e, "Emergency log append failed");
            report.contained_failures += 1;
        }
    }

    fn publish(
        &self,
        route: DeliveryRoute,
        channel_id: &str,
        severity: NotificationSeverity,
        message: &NotificationMessage,
    ) -> Delivery {
        match self.channel.publish(channel_id, severity, message) {
            Ok(message_id) => {
                tracing::debug!(
                    subject_id = %message.subject_id,
                    channel = channel_id,
                    message_id = %message_id,
                    "Notification delivered"
                );
                Delivery {
                    route,
                    channel_id: channel_id.to_string(),
                    message_id: Some(message_id),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(
                    subject_id = %message.subject_id,
                    channel = channel_id,
                    error = %e,
                    "Notification not delivered"
                );
                Delivery {
                    route,
                    channel_id: channel_id.to_string(),
                    message_id: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
