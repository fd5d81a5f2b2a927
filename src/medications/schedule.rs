use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Medication;

use super::frequency::Frequency;

/// Reminders open this many minutes before the next dose.
pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 15;

pub fn default_reminder_lead() -> Duration {
    Duration::minutes(DEFAULT_REMINDER_LEAD_MINUTES)
}

/// When the next dose falls for a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextDose {
    /// Never taken: the first reminder fires straight away.
    Immediately,
    At(DateTime<Utc>),
    /// As-needed, or a descriptor that no longer parses.
    Unscheduled,
}

pub fn next_dose(medication: &Medication) -> NextDose {
    let interval = match Frequency::parse(&medication.frequency) {
        Ok(frequency) => frequency.interval(),
        Err(e) => {
            tracing::warn!(
                medication_id = %medication.medication_id,
                error = %e,
                "Stored frequency no longer parses"
            );
            None
        }
    };

    let Some(interval) = interval else {
        return NextDose::Unscheduled;
    };

    match schedule_anchor(medication) {
        None => NextDose::Immediately,
        Some(anchor) => anchor
            .checked_add_signed(interval)
            .map_or(NextDose::Unscheduled, NextDose::At),
    }
}

/// The last dose taken, moved forward to the last missed slot when that is
/// newer. `None` until a first dose is taken.
fn schedule_anchor(medication: &Medication) -> Option<DateTime<Utc>> {
    let taken = medication.last_taken?;
    Some(medication.last_missed.map_or(taken, |missed| missed.max(taken)))
}

/// Scheduled time of the dose window currently open for a miss, if the
/// medication runs on a fixed interval and has been taken at least once.
pub fn current_slot(medication: &Medication) -> Option<DateTime<Utc>> {
    match next_dose(medication) {
        NextDose::At(slot) => Some(slot),
        NextDose::Immediately | NextDose::Unscheduled => None,
    }
}

/// Closed window `[next - lead, next]`.
pub fn reminder_window(next: DateTime<Utc>, lead: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (next - lead, next)
}

/// Active, started, and not past its end date.
pub fn in_effect(medication: &Medication, now: DateTime<Utc>) -> bool {
    medication.is_active()
        && now >= medication.start_date
        && medication.end_date.map_or(true, |end| now <= end)
}

/// Due with the default 15-minute lead.
pub fn is_due(medication: &Medication, now: DateTime<Utc>) -> bool {
    is_due_within(medication, now, default_reminder_lead())
}

pub fn is_due_within(medication: &Medication, now: DateTime<Utc>, lead: Duration) -> bool {
    if !in_effect(medication, now) {
        return false;
    }
    match next_dose(medication) {
        NextDose::Immediately => true,
        NextDose::At(next) => {
            let (opens, closes) = reminder_window(next, lead);
            opens <= now && now <= closes
        }
        NextDose::Unscheduled => false,
    }
}

/// The scheduled dose time has passed with no newer dose logged and no miss
/// recorded for it. This is the predicate an external sweep uses before
/// recording a miss.
pub fn has_missed_window(medication: &Medication, now: DateTime<Utc>) -> bool {
    in_effect(medication, now) && current_slot(medication).is_some_and(|slot| now > slot)
}

/// A reminder produced for dispatch. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderEvent {
    pub subject_id: String,
    pub medication_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: String,
    pub due_at: DateTime<Utc>,
    pub message: String,
}

impl ReminderEvent {
    pub fn for_medication(medication: &Medication, due_at: DateTime<Utc>) -> Self {
        Self {
            subject_id: medication.subject_id.clone(),
            medication_id: medication.medication_id.clone(),
            medication_name: medication.name.clone(),
            dosage: medication.dosage.clone(),
            frequency: medication.frequency.clone(),
            due_at,
            message: format!(
                "Time to take {} ({}) - {}",
                medication.name, medication.dosage, medication.frequency
            ),
        }
    }
}

/// Reminder events for every medication due at `now`, in input order.
pub fn due_reminders(
    medications: &[Medication],
    now: DateTime<Utc>,
    lead: Duration,
) -> Vec<ReminderEvent> {
    medications
        .iter()
        .filter(|m| is_due_within(m, now, lead))
        .map(|m| {
            let due_at = match next_dose(m) {
                NextDose::At(next) => next,
                _ => now,
            };
            ReminderEvent::for_medication(m, due_at)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medications::adherence::{record_dose, record_miss};
    use crate::models::MedicationStatus;

    fn t0() -> DateTime<Utc> {
        "2026-03-01T08:00:00Z".parse().unwrap()
    }

    fn medication(frequency: &str, last_taken: Option<DateTime<Utc>>) -> Medication {
        Medication {
            subject_id: "u1".into(),
            medication_id: "m1".into(),
            name: "Lisinopril".into(),
            dosage: "10mg".into(),
            frequency: frequency.into(),
            start_date: t0() - Duration::days(30),
            end_date: None,
            instructions: String::new(),
            status: MedicationStatus::Active,
            last_taken,
            last_missed: None,
            total_doses: 0,
            missed_doses: 0,
            created_at: t0() - Duration::days(30),
            updated_at: t0() - Duration::days(30),
        }
    }

    #[test]
    fn never_taken_is_due_immediately() {
        let med = medication("twice daily", None);
        assert_eq!(next_dose(&med), NextDose::Immediately);
        assert!(is_due(&med, t0()));
    }

    #[test]
    fn twelve_hour_window_is_closed_on_both_ends() {
        let med = medication("2x daily", Some(t0()));
        let at = |m: i64| t0() + Duration::minutes(m);

        assert!(!is_due(&med, at(11 * 60)));
        assert!(!is_due(&med, at(11 * 60 + 44)));
        assert!(is_due(&med, at(11 * 60 + 45)));
        assert!(is_due(&med, at(11 * 60 + 55)));
        assert!(is_due(&med, at(12 * 60)));
        assert!(!is_due(&med, at(12 * 60 + 1)));
    }

    #[test]
    fn as_needed_is_never_due() {
        let med = medication("PRN", None);
        assert_eq!(next_dose(&med), NextDose::Unscheduled);
        assert!(!is_due(&med, t0()));
        assert!(!has_missed_window(&med, t0() + Duration::days(3)));
    }

    #[test]
    fn inactive_or_out_of_range_is_never_due() {
        let mut med = medication("once daily", None);
        med.status = MedicationStatus::Inactive;
        assert!(!is_due(&med, t0()));

        let mut med = medication("once daily", None);
        med.start_date = t0() + Duration::days(1);
        assert!(!is_due(&med, t0()));

        let mut med = medication("once daily", None);
        med.end_date = Some(t0() - Duration::days(1));
        assert!(!is_due(&med, t0()));
    }

    #[test]
    fn custom_lead_widens_window() {
        let med = medication("every 8 hours", Some(t0()));
        let now = t0() + Duration::hours(7) + Duration::minutes(30);
        assert!(!is_due(&med, now));
        assert!(is_due_within(&med, now, Duration::minutes(30)));
    }

    #[test]
    fn missed_window_once_next_dose_has_passed() {
        let med = medication("every 8 hours", Some(t0()));
        assert!(!has_missed_window(&med, t0() + Duration::hours(8)));
        assert!(has_missed_window(&med, t0() + Duration::hours(8) + Duration::seconds(1)));

        let never = medication("every 8 hours", None);
        assert!(!has_missed_window(&never, t0() + Duration::days(2)));
    }

    #[test]
    fn recorded_miss_consumes_its_window() {
        let med = medication("every 8 hours", Some(t0()));
        let sweep = t0() + Duration::hours(9);
        assert!(has_missed_window(&med, sweep));

        let med = record_miss(&med, sweep);
        assert_eq!(med.last_missed, Some(t0() + Duration::hours(8)));
        assert!(!has_missed_window(&med, sweep));
        assert!(!has_missed_window(&med, t0() + Duration::hours(16)));
        assert!(has_missed_window(&med, t0() + Duration::hours(16) + Duration::seconds(1)));
    }

    #[test]
    fn repeated_sweeps_count_each_window_once() {
        let mut med = medication("every 8 hours", Some(t0()));
        for minutes in (0..=20 * 60).step_by(30) {
            let now = t0() + Duration::minutes(minutes);
            if has_missed_window(&med, now) {
                med = record_miss(&med, now);
            }
        }
        // Slots at +8h and +16h have elapsed by +20h; +24h has not.
        assert_eq!(med.missed_doses, 2);
        assert_eq!(next_dose(&med), NextDose::At(t0() + Duration::hours(24)));
    }

    #[test]
    fn dose_after_a_miss_restarts_the_schedule() {
        let med = medication("every 8 hours", Some(t0()));
        let med = record_miss(&med, t0() + Duration::hours(9));
        let taken = t0() + Duration::hours(10);
        let med = record_dose(&med, taken);
        assert_eq!(next_dose(&med), NextDose::At(taken + Duration::hours(8)));
        assert!(!has_missed_window(&med, taken + Duration::hours(8)));
    }

    #[test]
    fn due_reminders_carry_message_and_due_time() {
        let taken = medication("2x daily", Some(t0()));
        let mut fresh = medication("once daily", None);
        fresh.medication_id = "m2".into();
        let prn = medication("as needed", None);

        let now = t0() + Duration::hours(12) - Duration::minutes(5);
        let events = due_reminders(&[taken, fresh, prn], now, default_reminder_lead());

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].medication_id, "m1");
        assert_eq!(events[0].due_at, t0() + Duration::hours(12));
        assert_eq!(events[0].message, "Time to take Lisinopril (10mg) - 2x daily");
        assert_eq!(events[1].medication_id, "m2");
        assert_eq!(events[1].due_at, now);
    }

    #[test]
    fn window_bounds() {
        let (opens, closes) = reminder_window(t0(), default_reminder_lead());
        assert_eq!(closes - opens, Duration::minutes(15));
        assert_eq!(closes, t0());
    }
}
