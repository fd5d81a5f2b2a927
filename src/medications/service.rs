use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborators::{DoseCounter, MedicationStore, MetricsSink};
use crate::error::{CollaboratorError, CoreError};
use crate::models::{Medication, MedicationStatus};

use super::adherence::AdherenceReport;
use super::frequency::Frequency;
use super::schedule::{due_reminders, ReminderEvent};

const STORE: &str = "medication store";

/// Caller-supplied medication fields. All optional at the wire level; `add`
/// requires name, dosage and frequency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MedicationFields {
    pub medication_name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub instructions: Option<String>,
    /// Accepted on the wire so it can be rejected explicitly: status only
    /// changes through `remove`.
    pub status: Option<String>,
}

/// Medication lifecycle and adherence operations for one subject at a time.
pub struct MedicationService {
    store: Arc<dyn MedicationStore>,
    metrics: Arc<dyn MetricsSink>,
    metrics_namespace: String,
    reminder_lead: Duration,
}

impl MedicationService {
    pub fn new(
        store: Arc<dyn MedicationStore>,
        metrics: Arc<dyn MetricsSink>,
        metrics_namespace: impl Into<String>,
        reminder_lead: Duration,
    ) -> Self {
        Self {
            store,
            metrics,
            metrics_namespace: metrics_namespace.into(),
            reminder_lead,
        }
    }

    pub fn add(
        &self,
        subject_id: &str,
        medication_id: Option<&str>,
        fields: MedicationFields,
        now: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        const OP: &str = "add_medication";

        let name = required(OP, subject_id, "medicationName", fields.medication_name)?;
        let dosage = required(OP, subject_id, "dosage", fields.dosage)?;
        let frequency = required(OP, subject_id, "frequency", fields.frequency)?;
        validate_frequency(OP, subject_id, &frequency)?;
        if fields.status.is_some() {
            return Err(CoreError::validation(
                OP,
                subject_id,
                "status cannot be set on add; new medications are active",
            ));
        }

        let medication_id = match medication_id {
            Some(id) if id.trim().is_empty() => {
                return Err(CoreError::validation(OP, subject_id, "medicationId is empty"))
            }
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        if self
            .store
            .get(subject_id, &medication_id)
            .map_err(|e| CoreError::dependency(STORE, OP, subject_id, e))?
            .is_some()
        {
            return Err(CoreError::validation(
                OP,
                subject_id,
                format!("medication {medication_id} already exists"),
            ));
        }

        let start_date = fields.start_date.unwrap_or(now);
        check_dates(OP, subject_id, start_date, fields.end_date)?;

        let medication = Medication {
            subject_id: subject_id.to_string(),
            medication_id,
            name,
            dosage,
            frequency,
            start_date,
            end_date: fields.end_date,
            instructions: fields.instructions.unwrap_or_default(),
            status: MedicationStatus::Active,
            last_taken: None,
            last_missed: None,
            total_doses: 0,
            missed_doses: 0,
            created_at: now,
            updated_at: now,
        };

        self.store
            .put(&medication)
            .map_err(|e| CoreError::dependency(STORE, OP, subject_id, e))?;

        tracing::info!(
            subject_id,
            medication_id = %medication.medication_id,
            frequency = %medication.frequency,
            "Medication added"
        );
        self.record_metric("MedicationAdded", subject_id);
        Ok(medication)
    }

    /// Change name, dosage, frequency, end date or instructions of an active
    /// medication. A new frequency is validated like on `add`.
    pub fn update(
        &self,
        subject_id: &str,
        medication_id: &str,
        fields: MedicationFields,
        now: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        const OP: &str = "update_medication";

        if fields.status.is_some() {
            return Err(CoreError::validation(
                OP,
                subject_id,
                "status cannot be changed by update; use remove to deactivate",
            ));
        }

        let mut medication = self.active(OP, subject_id, medication_id)?;

        if let Some(name) = fields.medication_name {
            medication.name = non_empty(OP, subject_id, "medicationName", name)?;
        }
        if let Some(dosage) = fields.dosage {
            medication.dosage = non_empty(OP, subject_id, "dosage", dosage)?;
        }
        if let Some(frequency) = fields.frequency {
            let frequency = non_empty(OP, subject_id, "frequency", frequency)?;
            validate_frequency(OP, subject_id, &frequency)?;
            medication.frequency = frequency;
        }
        if let Some(start_date) = fields.start_date {
            medication.start_date = start_date;
        }
        if let Some(end_date) = fields.end_date {
            medication.end_date = Some(end_date);
        }
        if let Some(instructions) = fields.instructions {
            medication.instructions = instructions;
        }
        check_dates(OP, subject_id, medication.start_date, medication.end_date)?;
        medication.updated_at = now;

        self.store
            .put(&medication)
            .map_err(|e| CoreError::dependency(STORE, OP, subject_id, e))?;

        tracing::info!(subject_id, medication_id, "Medication updated");
        Ok(medication)
    }

    /// Soft delete. The record stays, inactive, and no longer accepts changes.
    pub fn remove(
        &self,
        subject_id: &str,
        medication_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        const OP: &str = "remove_medication";

        let mut medication = self.active(OP, subject_id, medication_id)?;
        medication.status = MedicationStatus::Inactive;
        medication.updated_at = now;

        self.store
            .put(&medication)
            .map_err(|e| CoreError::dependency(STORE, OP, subject_id, e))?;

        tracing::info!(subject_id, medication_id, "Medication removed");
        self.record_metric("MedicationRemoved", subject_id);
        Ok(medication)
    }

    pub fn log_dose(
        &self,
        subject_id: &str,
        medication_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        let medication = self.increment("log_dose", subject_id, medication_id, DoseCounter::Total, at)?;
        tracing::info!(
            subject_id,
            medication_id,
            total_doses = medication.total_doses,
            adherence_rate = medication.adherence_rate(),
            "Dose logged"
        );
        self.record_metric("DoseLogged", subject_id);
        Ok(medication)
    }

    /// Missed-dose transition, driven by the external reminder sweep.
    pub fn log_missed(
        &self,
        subject_id: &str,
        medication_id: &str,
        at: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        let medication =
            self.increment("log_missed", subject_id, medication_id, DoseCounter::Missed, at)?;
        tracing::info!(
            subject_id,
            medication_id,
            missed_doses = medication.missed_doses,
            adherence_rate = medication.adherence_rate(),
            "Missed dose recorded"
        );
        self.record_metric("DoseMissed", subject_id);
        Ok(medication)
    }

    pub fn get_all(&self, subject_id: &str) -> Result<Vec<Medication>, CoreError> {
        self.store
            .list_active(subject_id)
            .map_err(|e| CoreError::dependency(STORE, "get_medications", subject_id, e))
    }

    /// Reminders due for the subject's active medications at `now`.
    pub fn check_reminders(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<ReminderEvent>, CoreError> {
        let medications = self
            .store
            .list_active(subject_id)
            .map_err(|e| CoreError::dependency(STORE, "check_reminders", subject_id, e))?;
        let events = due_reminders(&medications, now, self.reminder_lead);
        tracing::debug!(
            subject_id,
            active = medications.len(),
            due = events.len(),
            "Reminder check complete"
        );
        Ok(events)
    }

    pub fn adherence_report(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
        period_days: u32,
    ) -> Result<AdherenceReport, CoreError> {
        let medications = self
            .store
            .list_active(subject_id)
            .map_err(|e| CoreError::dependency(STORE, "adherence_report", subject_id, e))?;
        Ok(AdherenceReport::build(subject_id, &medications, now, period_days))
    }

    // ── helpers ──────────────────────────────────────────

    fn active(
        &self,
        operation: &'static str,
        subject_id: &str,
        medication_id: &str,
    ) -> Result<Medication, CoreError> {
        self.store
            .get(subject_id, medication_id)
            .map_err(|e| CoreError::dependency(STORE, operation, subject_id, e))?
            .filter(Medication::is_active)
            .ok_or_else(|| CoreError::not_found("Medication", subject_id, medication_id))
    }

    fn increment(
        &self,
        operation: &'static str,
        subject_id: &str,
        medication_id: &str,
        counter: DoseCounter,
        at: DateTime<Utc>,
    ) -> Result<Medication, CoreError> {
        self.store
            .increment_dose_counters(subject_id, medication_id, counter, 1, at)
            .map_err(|e| CoreError::dependency(STORE, operation, subject_id, e))?
            .ok_or_else(|| CoreError::not_found("Medication", subject_id, medication_id))
    }

    fn record_metric(&self, metric_name: &str, subject_id: &str) {
        if let Err(e) = self.metrics.increment(
            &self.metrics_namespace,
            metric_name,
            &[("SubjectId", subject_id)],
        ) {
            log_metric_failure(metric_name, subject_id, &e);
        }
    }
}

fn log_metric_failure(metric_name: &str, subject_id: &str, error: &CollaboratorError) {
    tracing::warn!(subject_id, metric = metric_name, error = %error, "Medication metric not recorded");
}

fn required(
    operation: &'static str,
    subject_id: &str,
    field: &str,
    value: Option<String>,
) -> Result<String, CoreError> {
    match value {
        Some(v) => non_empty(operation, subject_id, field, v),
        None => Err(CoreError::validation(
            operation,
            subject_id,
            format!("{field} is required"),
        )),
    }
}

fn non_empty(
    operation: &'static str,
    subject_id: &str,
    field: &str,
    value: String,
) -> Result<String, CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::validation(
            operation,
            subject_id,
            format!("{field} must not be empty"),
        ))
    } else {
        Ok(value)
    }
}

fn validate_frequency(
    operation: &'static str,
    subject_id: &str,
    frequency: &str,
) -> Result<(), CoreError> {
    Frequency::parse(frequency)
        .map(|_| ())
        .map_err(|e| CoreError::validation(operation, subject_id, e.to_string()))
}

fn check_dates(
    operation: &'static str,
    subject_id: &str,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), CoreError> {
    match end {
        Some(end) if end < start => Err(CoreError::validation(
            operation,
            subject_id,
            "endDate is before startDate",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{InMemoryMedicationStore, RecordingMetrics};

    const NS: &str = "HealthAssistant/Medications";

    fn t0() -> DateTime<Utc> {
        "2026-03-01T08:00:00Z".parse().unwrap()
    }

    fn setup() -> (MedicationService, Arc<RecordingMetrics>) {
        let metrics = Arc::new(RecordingMetrics::new());
        let service = MedicationService::new(
            Arc::new(InMemoryMedicationStore::new()),
            metrics.clone(),
            NS,
            Duration::minutes(15),
        );
        (service, metrics)
    }

    fn fields(frequency: &str) -> MedicationFields {
        MedicationFields {
            medication_name: Some("Metformin".into()),
            dosage: Some("500mg".into()),
            frequency: Some(frequency.into()),
            ..Default::default()
        }
    }

    #[test]
    fn add_generates_id_and_defaults() {
        let (service, metrics) = setup();
        let med = service.add("u1", None, fields("2x daily"), t0()).unwrap();

        assert!(Uuid::parse_str(&med.medication_id).is_ok());
        assert_eq!(med.status, MedicationStatus::Active);
        assert_eq!(med.start_date, t0());
        assert_eq!(med.adherence_rate(), 0.0);
        assert_eq!(metrics.count(NS, "MedicationAdded"), 1);
    }

    #[test]
    fn add_keeps_caller_id_and_rejects_duplicates() {
        let (service, _) = setup();
        service.add("u1", Some("med-1"), fields("once daily"), t0()).unwrap();
        let err = service
            .add("u1", Some("med-1"), fields("once daily"), t0())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn add_rejects_unparseable_frequency() {
        let (service, metrics) = setup();
        let err = service.add("u1", None, fields("sometimes"), t0()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(service.get_all("u1").unwrap().is_empty());
        assert_eq!(metrics.count(NS, "MedicationAdded"), 0);
    }

    #[test]
    fn add_requires_core_fields() {
        let (service, _) = setup();
        let missing_dosage = MedicationFields {
            dosage: None,
            ..fields("once daily")
        };
        let err = service.add("u1", None, missing_dosage, t0()).unwrap_err();
        assert!(err.to_string().contains("dosage is required"));
    }

    #[test]
    fn add_rejects_end_before_start() {
        let (service, _) = setup();
        let backwards = MedicationFields {
            end_date: Some(t0() - Duration::days(1)),
            ..fields("once daily")
        };
        assert!(service.add("u1", None, backwards, t0()).is_err());
    }

    #[test]
    fn update_revalidates_frequency() {
        let (service, _) = setup();
        let med = service.add("u1", Some("m1"), fields("once daily"), t0()).unwrap();

        let bad = MedicationFields {
            frequency: Some("whenever".into()),
            ..Default::default()
        };
        assert!(service.update("u1", &med.medication_id, bad, t0()).is_err());

        let good = MedicationFields {
            frequency: Some("every 6 hours".into()),
            instructions: Some("with food".into()),
            ..Default::default()
        };
        let updated = service.update("u1", "m1", good, t0() + Duration::hours(1)).unwrap();
        assert_eq!(updated.frequency, "every 6 hours");
        assert_eq!(updated.instructions, "with food");
        assert_eq!(updated.updated_at, t0() + Duration::hours(1));
    }

    #[test]
    fn update_cannot_change_status() {
        let (service, _) = setup();
        service.add("u1", Some("m1"), fields("once daily"), t0()).unwrap();
        let reactivate = MedicationFields {
            status: Some("active".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update("u1", "m1", reactivate, t0()),
            Err(CoreError::Validation { .. })
        ));
    }

    #[test]
    fn removed_medication_is_terminal() {
        let (service, metrics) = setup();
        service.add("u1", Some("m1"), fields("once daily"), t0()).unwrap();
        let removed = service.remove("u1", "m1", t0()).unwrap();
        assert_eq!(removed.status, MedicationStatus::Inactive);
        assert_eq!(metrics.count(NS, "MedicationRemoved"), 1);

        assert_eq!(
            service.update("u1", "m1", fields("once daily"), t0()).unwrap_err().status_code(),
            404
        );
        assert_eq!(service.remove("u1", "m1", t0()).unwrap_err().status_code(), 404);
        assert_eq!(service.log_dose("u1", "m1", t0()).unwrap_err().status_code(), 404);
        assert!(service.get_all("u1").unwrap().is_empty());
    }

    #[test]
    fn unknown_medication_is_not_found() {
        let (service, _) = setup();
        assert!(matches!(
            service.log_dose("u1", "nope", t0()),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            service.remove("u1", "nope", t0()),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn dose_and_miss_drive_adherence() {
        let (service, metrics) = setup();
        service.add("u1", Some("m1"), fields("2x daily"), t0()).unwrap();

        for h in [0, 12, 24] {
            service.log_dose("u1", "m1", t0() + Duration::hours(h)).unwrap();
        }
        let med = service.log_missed("u1", "m1", t0() + Duration::hours(37)).unwrap();

        assert_eq!(med.total_doses, 3);
        assert_eq!(med.missed_doses, 1);
        assert_eq!(med.adherence_rate(), 0.75);
        assert_eq!(med.last_taken, Some(t0() + Duration::hours(24)));
        assert_eq!(metrics.count(NS, "DoseLogged"), 3);
        assert_eq!(metrics.count(NS, "DoseMissed"), 1);
    }

    #[test]
    fn reminders_follow_due_windows() {
        let (service, _) = setup();
        service.add("u1", Some("m1"), fields("2x daily"), t0()).unwrap();
        service.add("u1", Some("m2"), fields("as needed"), t0()).unwrap();

        // Never taken: due at once.
        let events = service.check_reminders("u1", t0()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].medication_id, "m1");

        service.log_dose("u1", "m1", t0()).unwrap();
        assert!(service
            .check_reminders("u1", t0() + Duration::hours(11))
            .unwrap()
            .is_empty());
        assert_eq!(
            service
                .check_reminders("u1", t0() + Duration::hours(12) - Duration::minutes(10))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn adherence_report_lists_active_medications() {
        let (service, _) = setup();
        service.add("u1", Some("m1"), fields("once daily"), t0()).unwrap();
        service.add("u1", Some("m2"), fields("once daily"), t0()).unwrap();
        service.remove("u1", "m2", t0()).unwrap();
        service.log_dose("u1", "m1", t0()).unwrap();

        let report = service.adherence_report("u1", t0(), 30).unwrap();
        assert_eq!(report.total_medications, 1);
        assert_eq!(report.medications[0].adherence_rate, 1.0);
    }

    #[test]
    fn metric_failures_do_not_fail_operations() {
        let service = MedicationService::new(
            Arc::new(InMemoryMedicationStore::new()),
            Arc::new(RecordingMetrics::failing()),
            NS,
            Duration::minutes(15),
        );
        assert!(service.add("u1", None, fields("once daily"), t0()).is_ok());
    }
}
