use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SeverityTier
// ---------------------------------------------------------------------------

/// Total order: NORMAL < WARNING < EMERGENCY < CRITICAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityTier {
    Normal,
    Warning,
    Emergency,
    Critical,
}

impl SeverityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Emergency => "EMERGENCY",
            Self::Critical => "CRITICAL",
        }
    }

    /// EMERGENCY and above are dispatched as alerts.
    pub fn is_alerting(self) -> bool {
        self >= Self::Emergency
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ConditionKind
// ---------------------------------------------------------------------------

/// What a condition was raised for: a classified vital or a device signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionKind {
    HeartRate,
    BloodPressure,
    Temperature,
    OxygenSaturation,
    PanicButton,
    FallDetected,
}

impl ConditionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeartRate => "heartRate",
            Self::BloodPressure => "bloodPressure",
            Self::Temperature => "temperature",
            Self::OxygenSaturation => "oxygenSaturation",
            Self::PanicButton => "panicButton",
            Self::FallDetected => "fallDetected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::HeartRate => "Heart rate",
            Self::BloodPressure => "Blood pressure",
            Self::Temperature => "Temperature",
            Self::OxygenSaturation => "Oxygen saturation",
            Self::PanicButton => "Panic button",
            Self::FallDetected => "Fall detection",
        }
    }

    /// Metric dimension value, e.g. `CRITICAL_HEART_RATE`.
    pub fn condition_type(self, tier: SeverityTier) -> String {
        let suffix = match self {
            Self::HeartRate => "HEART_RATE",
            Self::BloodPressure => "BLOOD_PRESSURE",
            Self::Temperature => "TEMPERATURE",
            Self::OxygenSaturation => "OXYGEN_SATURATION",
            Self::PanicButton => return "PANIC_BUTTON_ACTIVATED".into(),
            Self::FallDetected => return "FALL_DETECTED".into(),
        };
        format!("{}_{suffix}", tier.as_str())
    }
}

// ---------------------------------------------------------------------------
// ObservedValue / ActionRequired
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservedValue {
    Reading(f64),
    Pair { systolic: f64, diastolic: f64 },
    Signal(bool),
}

impl fmt::Display for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading(value) => write!(f, "{value}"),
            Self::Pair {
                systolic,
                diastolic,
            } => write!(f, "{systolic}/{diastolic}"),
            Self::Signal(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionRequired {
    ImmediateMedicalAttention,
    UrgentMedicalCare,
    MonitorClosely,
    ImmediateEmergencyResponse,
    CheckPatientCondition,
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// One classified finding. Carries exactly one tier per vital or signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "name")]
    pub kind: ConditionKind,
    pub tier: SeverityTier,
    pub value: ObservedValue,
    pub message: String,
    pub action_required: ActionRequired,
}

impl Condition {
    pub fn condition_type(&self) -> String {
        self.kind.condition_type(self.tier)
    }
}

/// Highest tier present, or NORMAL for an empty set.
pub fn highest_tier(conditions: &[Condition]) -> SeverityTier {
    conditions
        .iter()
        .map(|c| c.tier)
        .max()
        .unwrap_or(SeverityTier::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_totally_ordered() {
        assert!(SeverityTier::Normal < SeverityTier::Warning);
        assert!(SeverityTier::Warning < SeverityTier::Emergency);
        assert!(SeverityTier::Emergency < SeverityTier::Critical);
        assert!(!SeverityTier::Warning.is_alerting());
        assert!(SeverityTier::Emergency.is_alerting());
    }

    #[test]
    fn condition_type_names() {
        assert_eq!(
            ConditionKind::HeartRate.condition_type(SeverityTier::Critical),
            "CRITICAL_HEART_RATE"
        );
        assert_eq!(
            ConditionKind::PanicButton.condition_type(SeverityTier::Critical),
            "PANIC_BUTTON_ACTIVATED"
        );
    }

    #[test]
    fn observed_values_display() {
        assert_eq!(ObservedValue::Reading(98.6).to_string(), "98.6");
        assert_eq!(
            ObservedValue::Pair {
                systolic: 250.0,
                diastolic: 150.0
            }
            .to_string(),
            "250/150"
        );
    }

    #[test]
    fn highest_tier_of_empty_is_normal() {
        assert_eq!(highest_tier(&[]), SeverityTier::Normal);
    }
}
