//! Medication scheduling and adherence.
//!
//! Frequency text is parsed into a dosing interval, the interval drives the
//! reminder window, and dose/miss events move the adherence counters. The
//! lifecycle (add, update, remove) lives in [`service::MedicationService`].

pub mod adherence;
pub mod frequency;
pub mod schedule;
pub mod service;

use serde::Serialize;

use crate::models::Medication;

pub use adherence::{record_dose, record_miss, AdherenceEntry, AdherenceReport};
pub use frequency::{Frequency, FrequencyError};
pub use schedule::{
    due_reminders, has_missed_window, is_due, is_due_within, next_dose, NextDose, ReminderEvent,
};
pub use service::{MedicationFields, MedicationService};

/// A medication as returned to callers, with the derived adherence rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationCard {
    #[serde(flatten)]
    pub medication: Medication,
    pub adherence_rate: f64,
}

impl From<Medication> for MedicationCard {
    fn from(medication: Medication) -> Self {
        let adherence_rate = medication.adherence_rate();
        Self {
            medication,
            adherence_rate,
        }
    }
}
