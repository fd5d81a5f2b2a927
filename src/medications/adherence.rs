use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Medication, MedicationStatus};

use super::schedule::current_slot;

/// One dose taken at `at`. Counters saturate rather than wrap.
pub fn record_dose(medication: &Medication, at: DateTime<Utc>) -> Medication {
    Medication {
        total_doses: medication.total_doses.saturating_add(1),
        last_taken: Some(at),
        updated_at: medication.updated_at.max(at),
        ..medication.clone()
    }
}

/// One dose missed, as detected by the reminder sweep. Consumes the current
/// dose window so the sweep does not count it again.
pub fn record_miss(medication: &Medication, at: DateTime<Utc>) -> Medication {
    Medication {
        missed_doses: medication.missed_doses.saturating_add(1),
        last_missed: current_slot(medication).or(medication.last_missed),
        updated_at: medication.updated_at.max(at),
        ..medication.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceEntry {
    pub medication_id: String,
    pub medication_name: String,
    pub adherence_rate: f64,
    pub total_doses: u32,
    pub missed_doses: u32,
    pub last_taken: Option<DateTime<Utc>>,
    pub status: MedicationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
    pub subject_id: String,
    pub report_date: DateTime<Utc>,
    pub period_days: u32,
    pub total_medications: usize,
    pub medications: Vec<AdherenceEntry>,
}

impl AdherenceReport {
    /// Only active medications are reported.
    pub fn build(
        subject_id: &str,
        medications: &[Medication],
        report_date: DateTime<Utc>,
        period_days: u32,
    ) -> Self {
        let entries: Vec<AdherenceEntry> = medications
            .iter()
            .filter(|m| m.is_active())
            .map(|m| AdherenceEntry {
                medication_id: m.medication_id.clone(),
                medication_name: m.name.clone(),
                adherence_rate: m.adherence_rate(),
                total_doses: m.total_doses,
                missed_doses: m.missed_doses,
                last_taken: m.last_taken,
                status: m.status,
            })
            .collect();

        Self {
            subject_id: subject_id.to_string(),
            report_date,
            period_days,
            total_medications: entries.len(),
            medications: entries,
        }
    }
}
