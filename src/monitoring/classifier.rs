use crate::models::{MeasurementSnapshot, VitalSign};

use super::thresholds::{ThresholdError, ThresholdTable, CANONICAL};
use super::types::{ActionRequired, Condition, ConditionKind, ObservedValue, SeverityTier};

/// Maps a snapshot onto severity-tiered conditions.
///
/// Pure: the same snapshot and table always give the same conditions, in the
/// same order. Vitals come first in the order they were supplied (the blood
/// pressure pair sits where its first component appeared), device signals
/// last. NORMAL findings are dropped.
#[derive(Debug, Clone)]
pub struct VitalClassifier {
    table: ThresholdTable,
}

impl VitalClassifier {
    /// Rejects tables whose tiers do not nest.
    pub fn new(table: ThresholdTable) -> Result<Self, ThresholdError> {
        table.validate()?;
        Ok(Self { table })
    }

    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    pub fn classify(&self, snapshot: &MeasurementSnapshot) -> Vec<Condition> {
        let vitals = snapshot.vitals();
        let mut conditions = Vec::new();
        let mut blood_pressure_seen = false;

        for (name, value) in vitals.iter() {
            let Some(vital) = VitalSign::from_name(name) else {
                continue;
            };
            if !value.is_finite() {
                tracing::warn!(vital = name, "Skipping non-finite reading");
                continue;
            }

            let finding = match vital {
                VitalSign::HeartRate => {
                    Some(single(ConditionKind::HeartRate, &self.table, vital, value))
                }
                VitalSign::Temperature => {
                    Some(single(ConditionKind::Temperature, &self.table, vital, value))
                }
                VitalSign::OxygenSaturation => Some(single(
                    ConditionKind::OxygenSaturation,
                    &self.table,
                    vital,
                    value,
                )),
                VitalSign::SystolicBp | VitalSign::DiastolicBp => {
                    if blood_pressure_seen {
                        continue;
                    }
                    blood_pressure_seen = true;
                    // A lone component is not classified.
                    match (
                        vitals.vital(VitalSign::SystolicBp),
                        vitals.vital(VitalSign::DiastolicBp),
                    ) {
                        (Some(systolic), Some(diastolic))
                            if systolic.is_finite() && diastolic.is_finite() =>
                        {
                            let tier = self.table.blood_pressure_tier(systolic, diastolic);
                            Some((
                                ConditionKind::BloodPressure,
                                tier,
                                ObservedValue::Pair {
                                    systolic,
                                    diastolic,
                                },
                                "mmHg",
                            ))
                        }
                        _ => None,
                    }
                }
            };

            if let Some((kind, tier, observed, unit)) = finding {
                if tier != SeverityTier::Normal {
                    conditions.push(vital_condition(kind, tier, observed, unit));
                }
            }
        }

        let signals = snapshot.signals();
        if signals.panic_button {
            conditions.push(Condition {
                kind: ConditionKind::PanicButton,
                tier: SeverityTier::Critical,
                value: ObservedValue::Signal(true),
                message: "CRITICAL: Panic button activated - immediate assistance required"
                    .to_string(),
                action_required: ActionRequired::ImmediateEmergencyResponse,
            });
        }
        if signals.fall_detected {
            conditions.push(Condition {
                kind: ConditionKind::FallDetected,
                tier: SeverityTier::Emergency,
                value: ObservedValue::Signal(true),
                message: "EMERGENCY: Fall detected - check on the person immediately".to_string(),
                action_required: ActionRequired::CheckPatientCondition,
            });
        }

        conditions
    }
}

impl Default for VitalClassifier {
    fn default() -> Self {
        Self { table: CANONICAL }
    }
}

/// Classify with the canonical table.
pub fn classify(snapshot: &MeasurementSnapshot) -> Vec<Condition> {
    VitalClassifier::default().classify(snapshot)
}

fn single(
    kind: ConditionKind,
    table: &ThresholdTable,
    vital: VitalSign,
    value: f64,
) -> (ConditionKind, SeverityTier, ObservedValue, &'static str) {
    let tier = table.for_vital(vital).tier_for(value);
    (kind, tier, ObservedValue::Reading(value), vital.unit())
}

fn vital_condition(
    kind: ConditionKind,
    tier: SeverityTier,
    value: ObservedValue,
    unit: &str,
) -> Condition {
    let (message, action_required) = match tier {
        SeverityTier::Critical => (
            format!("CRITICAL: {} {value} {unit} is at a life-threatening level", kind.label()),
            ActionRequired::ImmediateMedicalAttention,
        ),
        SeverityTier::Emergency => (
            format!("EMERGENCY: {} {value} {unit} needs urgent medical care", kind.label()),
            ActionRequired::UrgentMedicalCare,
        ),
        _ => (
            format!("WARNING: {} {value} {unit} is outside the normal range", kind.label()),
            ActionRequired::MonitorClosely,
        ),
    };

    Condition {
        kind,
        tier,
        value,
        message,
        action_required,
    }
}
