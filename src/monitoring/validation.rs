use crate::error::CoreError;
use crate::models::{MeasurementSnapshot, VitalSign};

const OPERATION: &str = "ingest";

/// Rejects snapshots the classifier cannot meaningfully judge.
///
/// Unrecognized vital names pass through untouched; they are stored and
/// trended but never classified.
pub fn validate_snapshot(snapshot: &MeasurementSnapshot) -> Result<(), CoreError> {
    let subject_id = snapshot.subject_id();
    if subject_id.trim().is_empty() {
        return Err(CoreError::validation(OPERATION, subject_id, "subject id is empty"));
    }

    if snapshot.vitals().is_empty() && !snapshot.signals().any() {
        return Err(CoreError::validation(
            OPERATION,
            subject_id,
            "snapshot carries no vitals and no signals",
        ));
    }

    for (name, value) in snapshot.vitals().iter() {
        if name.trim().is_empty() {
            return Err(CoreError::validation(OPERATION, subject_id, "vital name is empty"));
        }
        if !value.is_finite() {
            return Err(CoreError::validation(
                OPERATION,
                subject_id,
                format!("{name} is not a finite number"),
            ));
        }
        if let Some(vital) = VitalSign::from_name(name) {
            let (low, high) = vital.representable_range();
            if value < low || value > high {
                return Err(CoreError::validation(
                    OPERATION,
                    subject_id,
                    format!("{name} {value} is outside the plausible range {low}-{high}"),
                ));
            }
        }
    }

    Ok(())
}
