//! In-process stores backed by `RwLock`. Used by the CLI runner and tests;
//! production deployments plug their own persistence in behind the same traits.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::error::CollaboratorError;
use crate::medications::adherence::{record_dose, record_miss};
use crate::models::{Medication, MeasurementSnapshot, SubjectProfile};

use super::{AppendOutcome, DoseCounter, HistoryStore, MedicationStore, ProfileStore};

#[derive(Default)]
pub struct InMemoryHistoryStore {
    by_subject: RwLock<HashMap<String, Vec<MeasurementSnapshot>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn query(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<MeasurementSnapshot>, CollaboratorError> {
        let by_subject = self
            .by_subject
            .read()
            .map_err(|_| CollaboratorError::LockPoisoned)?;

        Ok(by_subject
            .get(subject_id)
            .map(|snapshots| {
                snapshots
                    .iter()
                    .filter(|s| s.timestamp() >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn append(&self, snapshot: &MeasurementSnapshot) -> Result<AppendOutcome, CollaboratorError> {
        let mut by_subject = self
            .by_subject
            .write()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        let snapshots = by_subject
            .entry(snapshot.subject_id().to_string())
            .or_default();

        // (subject, timestamp) identifies a snapshot; keep the vector sorted.
        match snapshots.binary_search_by_key(&snapshot.timestamp(), |s| s.timestamp()) {
            Ok(_) => Ok(AppendOutcome::AlreadyRecorded),
            Err(pos) => {
                snapshots.insert(pos, snapshot.clone());
                Ok(AppendOutcome::Recorded)
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryMedicationStore {
    records: RwLock<HashMap<(String, String), Medication>>,
}

impl InMemoryMedicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MedicationStore for InMemoryMedicationStore {
    fn get(
        &self,
        subject_id: &str,
        medication_id: &str,
    ) -> Result<Option<Medication>, CollaboratorError> {
        let records = self
            .records
            .read()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        Ok(records
            .get(&(subject_id.to_string(), medication_id.to_string()))
            .cloned())
    }

    fn list_active(&self, subject_id: &str) -> Result<Vec<Medication>, CollaboratorError> {
        let records = self
            .records
            .read()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        let mut active: Vec<Medication> = records
            .values()
            .filter(|m| m.subject_id == subject_id && m.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.medication_id.cmp(&b.medication_id))
        });
        Ok(active)
    }

    fn put(&self, medication: &Medication) -> Result<(), CollaboratorError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        records.insert(
            (
                medication.subject_id.clone(),
                medication.medication_id.clone(),
            ),
            medication.clone(),
        );
        Ok(())
    }

    fn increment_dose_counters(
        &self,
        subject_id: &str,
        medication_id: &str,
        counter: DoseCounter,
        delta: u32,
        at: DateTime<Utc>,
    ) -> Result<Option<Medication>, CollaboratorError> {
        let mut records = self
            .records
            .write()
            .map_err(|_| CollaboratorError::LockPoisoned)?;

        let Some(current) = records
            .get_mut(&(subject_id.to_string(), medication_id.to_string()))
            .filter(|m| m.is_active())
        else {
            return Ok(None);
        };

        let mut updated = current.clone();
        for _ in 0..delta {
            updated = match counter {
                DoseCounter::Total => record_dose(&updated, at),
                DoseCounter::Missed => record_miss(&updated, at),
            };
        }
        *current = updated.clone();
        Ok(Some(updated))
    }
}

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, SubjectProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: SubjectProfile) -> Result<(), CollaboratorError> {
        let mut profiles = self
            .profiles
            .write()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        profiles.insert(profile.subject_id.clone(), profile);
        Ok(())
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn get(&self, subject_id: &str) -> Result<Option<SubjectProfile>, CollaboratorError> {
        let profiles = self
            .profiles
            .read()
            .map_err(|_| CollaboratorError::LockPoisoned)?;
        Ok(profiles.get(subject_id).cloned())
    }
}
