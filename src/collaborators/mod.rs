//! External collaborator contracts.
//!
//! Persistence, notification delivery, metrics and the emergency log live
//! outside the core. Each is a synchronous `Send + Sync` trait constructed
//! once per process and handed to the engines explicitly.

pub mod logging;
pub mod memory;
pub mod recording;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::EmergencyLogEntry;
use crate::error::CollaboratorError;
use crate::models::{Medication, MeasurementSnapshot, SubjectProfile};

pub use logging::{TracingChannel, TracingEmergencyLog, TracingMetrics};
pub use memory::{InMemoryHistoryStore, InMemoryMedicationStore, InMemoryProfileStore};
pub use recording::{RecordingChannel, RecordingEmergencyLog, RecordingMetrics};

// ═══════════════════════════════════════════
// Stores
// ═══════════════════════════════════════════

/// Time-ordered measurement history per subject.
pub trait HistoryStore: Send + Sync {
    /// Snapshots at or after `since`, oldest first.
    fn query(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MeasurementSnapshot>, CollaboratorError>;

    /// Appending a snapshot whose (subject, timestamp) is already stored is
    /// not an error; redelivery of the same measurement must succeed.
    fn append(&self, snapshot: &MeasurementSnapshot) -> Result<AppendOutcome, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Recorded,
    /// A snapshot with the same subject and timestamp was stored earlier and
    /// was left untouched.
    AlreadyRecorded,
}

/// Which dose counter an atomic increment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoseCounter {
    /// Taken doses; also moves `lastTaken` to the increment instant.
    Total,
    Missed,
}

pub trait MedicationStore: Send + Sync {
    fn get(
        &self,
        subject_id: &str,
        medication_id: &str,
    ) -> Result<Option<Medication>, CollaboratorError>;

    fn list_active(&self, subject_id: &str) -> Result<Vec<Medication>, CollaboratorError>;

    fn put(&self, medication: &Medication) -> Result<(), CollaboratorError>;

    /// Atomic read-modify-write of one dose counter on an active medication.
    /// Returns the updated record, or `None` when no active medication matches.
    fn increment_dose_counters(
        &self,
        subject_id: &str,
        medication_id: &str,
        counter: DoseCounter,
        delta: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<Medication>, CollaboratorError>;
}

pub trait ProfileStore: Send + Sync {
    fn get(&self, subject_id: &str) -> Result<Option<SubjectProfile>, CollaboratorError>;
}

// ═══════════════════════════════════════════
// Delivery
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationSeverity {
    Info,
    High,
    Critical,
}

impl NotificationSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

/// Message handed to a notification channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub title: String,
    pub subject_id: String,
    pub payload: serde_json::Value,
}

/// Pub/sub delivery. Callers assume at-least-once semantics.
pub trait NotificationChannel: Send + Sync {
    /// Returns the channel-assigned message id.
    fn publish(
        &self,
        channel_id: &str,
        severity: NotificationSeverity,
        message: &NotificationMessage,
    ) -> Result<String, CollaboratorError>;
}

pub trait MetricsSink: Send + Sync {
    fn increment(
        &self,
        namespace: &str,
        metric_name: &str,
        dimensions: &[(&str, &str)],
    ) -> Result<(), CollaboratorError>;
}

/// Append-only record of dispatched emergencies.
pub trait EmergencyLog: Send + Sync {
    fn append(&self, entry: &EmergencyLogEntry) -> Result<(), CollaboratorError>;
}
