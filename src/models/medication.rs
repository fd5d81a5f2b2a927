use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::MedicationStatus;

/// A medication tracked for one subject.
///
/// `inactive` is terminal: removal is a soft delete and the record is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub subject_id: String,
    pub medication_id: String,
    #[serde(rename = "medicationName")]
    pub name: String,
    pub dosage: String,
    /// Free-text frequency descriptor; validated at creation and update.
    pub frequency: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub instructions: String,
    pub status: MedicationStatus,
    pub last_taken: Option<DateTime<Utc>>,
    /// Scheduled time of the most recent dose window recorded as missed.
    #[serde(default)]
    pub last_missed: Option<DateTime<Utc>>,
    pub total_doses: u32,
    pub missed_doses: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    pub fn is_active(&self) -> bool {
        self.status == MedicationStatus::Active
    }

    /// Always derived from the current counters.
    pub fn adherence_rate(&self) -> f64 {
        adherence_rate(self.total_doses, self.missed_doses)
    }
}

/// totalDoses / (totalDoses + missedDoses), or 0 when nothing has been recorded.
pub fn adherence_rate(total_doses: u32, missed_doses: u32) -> f64 {
    let denominator = u64::from(total_doses) + u64::from(missed_doses);
    if denominator == 0 {
        0.0
    } else {
        f64::from(total_doses) / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_taken_one_missed_is_three_quarters() {
        assert_eq!(adherence_rate(3, 1), 0.75);
    }

    #[test]
    fn nothing_recorded_is_zero() {
        assert_eq!(adherence_rate(0, 0), 0.0);
    }

    #[test]
    fn all_missed_is_zero() {
        assert_eq!(adherence_rate(0, 4), 0.0);
    }

    #[test]
    fn counters_near_max_do_not_overflow() {
        let rate = adherence_rate(u32::MAX, u32::MAX);
        assert!((rate - 0.5).abs() < 1e-9);
    }
}
