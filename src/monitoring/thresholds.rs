//! Canonical severity thresholds, one row per classified vital.
//!
//! Version 2 merges the former monitoring and emergency tables: per tier the
//! stricter cutoff wins, and a tier wholly covered by a stricter tier is left
//! empty. Low cutoffs fire strictly below their value; high cutoffs fire at or
//! above it, so a reading sitting on a cutoff takes the more severe side.

use thiserror::Error;

use crate::models::VitalSign;

use super::types::SeverityTier;

pub const TABLE_VERSION: u32 = 2;

/// Low/high cutoffs for one tier. `None` means the side never fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoffs {
    pub below: Option<f64>,
    pub at_or_above: Option<f64>,
}

impl Cutoffs {
    pub const NONE: Cutoffs = Cutoffs {
        below: None,
        at_or_above: None,
    };

    pub const fn low(below: f64) -> Self {
        Self {
            below: Some(below),
            at_or_above: None,
        }
    }

    pub const fn high(at_or_above: f64) -> Self {
        Self {
            below: None,
            at_or_above: Some(at_or_above),
        }
    }

    pub const fn both(below: f64, at_or_above: f64) -> Self {
        Self {
            below: Some(below),
            at_or_above: Some(at_or_above),
        }
    }

    pub fn triggered(&self, value: f64) -> bool {
        self.below.is_some_and(|low| value < low)
            || self.at_or_above.is_some_and(|high| value >= high)
    }
}

/// The three non-normal tiers for one measured quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierCutoffs {
    pub critical: Cutoffs,
    pub emergency: Cutoffs,
    pub warning: Cutoffs,
}

impl TierCutoffs {
    /// Critical first, then emergency, then warning; otherwise NORMAL.
    pub fn tier_for(&self, value: f64) -> SeverityTier {
        if self.critical.triggered(value) {
            SeverityTier::Critical
        } else if self.emergency.triggered(value) {
            SeverityTier::Emergency
        } else if self.warning.triggered(value) {
            SeverityTier::Warning
        } else {
            SeverityTier::Normal
        }
    }

    /// Each milder band must enclose every stricter band on both sides,
    /// otherwise the milder tier can never fire there.
    fn check_nesting(&self, row: &'static str) -> Result<(), ThresholdError> {
        let tiers = [
            ("critical", self.critical),
            ("emergency", self.emergency),
            ("warning", self.warning),
        ];

        for (i, (milder_name, milder)) in tiers.iter().enumerate().skip(1) {
            let stricter = &tiers[..i];
            let stricter_low = stricter.iter().filter_map(|(_, c)| c.below).reduce(f64::max);
            let stricter_high = stricter
                .iter()
                .filter_map(|(_, c)| c.at_or_above)
                .reduce(f64::min);

            if let (Some(low), Some(milder_low)) = (stricter_low, milder.below) {
                if milder_low < low {
                    return Err(ThresholdError::NotNested {
                        row,
                        detail: format!(
                            "{milder_name} low cutoff {milder_low} is below stricter cutoff {low}"
                        ),
                    });
                }
            }
            if let (Some(high), Some(milder_high)) = (stricter_high, milder.at_or_above) {
                if milder_high > high {
                    return Err(ThresholdError::NotNested {
                        row,
                        detail: format!(
                            "{milder_name} high cutoff {milder_high} is above stricter cutoff {high}"
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("Threshold row {row} is not nested: {detail}")]
    NotNested { row: &'static str, detail: String },
}

/// Versioned set of tier cutoffs for every classified vital.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    pub version: u32,
    pub heart_rate: TierCutoffs,
    pub systolic: TierCutoffs,
    pub diastolic: TierCutoffs,
    pub temperature: TierCutoffs,
    pub oxygen_saturation: TierCutoffs,
}

/// Heart rate in bpm.
const HEART_RATE: TierCutoffs = TierCutoffs {
    critical: Cutoffs::both(40.0, 200.0),
    emergency: Cutoffs::high(180.0),
    warning: Cutoffs::both(50.0, 150.0),
};

/// Systolic pressure in mmHg.
const SYSTOLIC: TierCutoffs = TierCutoffs {
    critical: Cutoffs::both(50.0, 180.0),
    emergency: Cutoffs::low(70.0),
    warning: Cutoffs::high(140.0),
};

/// Diastolic pressure in mmHg.
const DIASTOLIC: TierCutoffs = TierCutoffs {
    critical: Cutoffs::both(30.0, 110.0),
    emergency: Cutoffs::low(40.0),
    warning: Cutoffs::high(90.0),
};

/// Body temperature in °F.
const TEMPERATURE: TierCutoffs = TierCutoffs {
    critical: Cutoffs::both(95.0, 104.0),
    emergency: Cutoffs::NONE,
    warning: Cutoffs::both(97.0, 100.4),
};

/// SpO2 in percent.
const OXYGEN_SATURATION: TierCutoffs = TierCutoffs {
    critical: Cutoffs::low(90.0),
    emergency: Cutoffs::NONE,
    warning: Cutoffs::low(95.0),
};

pub const CANONICAL: ThresholdTable = ThresholdTable {
    version: TABLE_VERSION,
    heart_rate: HEART_RATE,
    systolic: SYSTOLIC,
    diastolic: DIASTOLIC,
    temperature: TEMPERATURE,
    oxygen_saturation: OXYGEN_SATURATION,
};

impl ThresholdTable {
    pub fn canonical() -> &'static ThresholdTable {
        &CANONICAL
    }

    pub fn for_vital(&self, vital: VitalSign) -> &TierCutoffs {
        match vital {
            VitalSign::HeartRate => &self.heart_rate,
            VitalSign::SystolicBp => &self.systolic,
            VitalSign::DiastolicBp => &self.diastolic,
            VitalSign::Temperature => &self.temperature,
            VitalSign::OxygenSaturation => &self.oxygen_saturation,
        }
    }

    /// The pair takes the more severe of its two components.
    pub fn blood_pressure_tier(&self, systolic: f64, diastolic: f64) -> SeverityTier {
        self.systolic
            .tier_for(systolic)
            .max(self.diastolic.tier_for(diastolic))
    }

    pub fn validate(&self) -> Result<(), ThresholdError> {
        self.heart_rate.check_nesting("heartRate")?;
        self.systolic.check_nesting("systolicBP")?;
        self.diastolic.check_nesting("diastolicBP")?;
        self.temperature.check_nesting("temperature")?;
        self.oxygen_saturation.check_nesting("oxygenSaturation")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_table_is_nested() {
        assert!(ThresholdTable::canonical().validate().is_ok());
        assert_eq!(ThresholdTable::canonical().version, TABLE_VERSION);
    }

    #[test]
    fn inverted_row_is_rejected() {
        let mut table = CANONICAL.clone();
        // Warning high above critical high.
        table.heart_rate.warning = Cutoffs::both(50.0, 210.0);
        let err = table.validate().unwrap_err();
        assert!(matches!(err, ThresholdError::NotNested { row: "heartRate", .. }));
    }

    #[test]
    fn heart_rate_boundaries() {
        let hr = &CANONICAL.heart_rate;
        assert_eq!(hr.tier_for(72.0), SeverityTier::Normal);
        assert_eq!(hr.tier_for(149.9), SeverityTier::Normal);
        assert_eq!(hr.tier_for(150.0), SeverityTier::Warning);
        assert_eq!(hr.tier_for(180.0), SeverityTier::Emergency);
        assert_eq!(hr.tier_for(200.0), SeverityTier::Critical);
        assert_eq!(hr.tier_for(45.0), SeverityTier::Warning);
        assert_eq!(hr.tier_for(39.0), SeverityTier::Critical);
    }

    #[test]
    fn blood_pressure_pair_takes_worse_component() {
        let table = ThresholdTable::canonical();
        assert_eq!(table.blood_pressure_tier(120.0, 80.0), SeverityTier::Normal);
        assert_eq!(table.blood_pressure_tier(125.0, 95.0), SeverityTier::Warning);
        assert_eq!(table.blood_pressure_tier(250.0, 150.0), SeverityTier::Critical);
        assert_eq!(table.blood_pressure_tier(65.0, 50.0), SeverityTier::Emergency);
        assert_eq!(table.blood_pressure_tier(110.0, 25.0), SeverityTier::Critical);
    }

    #[test]
    fn temperature_and_oxygen_have_no_emergency_band() {
        let table = ThresholdTable::canonical();
        assert_eq!(table.temperature.tier_for(98.6), SeverityTier::Normal);
        assert_eq!(table.temperature.tier_for(101.0), SeverityTier::Warning);
        assert_eq!(table.temperature.tier_for(107.0), SeverityTier::Critical);
        assert_eq!(table.temperature.tier_for(94.0), SeverityTier::Critical);
        assert_eq!(table.oxygen_saturation.tier_for(98.0), SeverityTier::Normal);
        assert_eq!(table.oxygen_saturation.tier_for(93.0), SeverityTier::Warning);
        assert_eq!(table.oxygen_saturation.tier_for(75.0), SeverityTier::Critical);
    }

    /// Moving away from the normal band never lowers the tier.
    #[test]
    fn tiers_are_monotonic_in_distance_from_normal() {
        let table = ThresholdTable::canonical();
        let rows = [
            (VitalSign::HeartRate, 72.0, 0.0, 320.0),
            (VitalSign::SystolicBp, 115.0, 0.0, 320.0),
            (VitalSign::DiastolicBp, 75.0, 0.0, 220.0),
            (VitalSign::Temperature, 98.6, 70.0, 130.0),
            (VitalSign::OxygenSaturation, 99.0, 0.0, 100.0),
        ];

        for (vital, normal, floor, ceiling) in rows {
            let cutoffs = table.for_vital(vital);
            assert_eq!(cutoffs.tier_for(normal), SeverityTier::Normal, "{vital}");

            let mut previous = SeverityTier::Normal;
            let mut value = normal;
            while value <= ceiling {
                let tier = cutoffs.tier_for(value);
                assert!(tier >= previous, "{vital} dropped tier going up at {value}");
                previous = tier;
                value += 0.1;
            }

            let mut previous = SeverityTier::Normal;
            let mut value = normal;
            while value >= floor {
                let tier = cutoffs.tier_for(value);
                assert!(tier >= previous, "{vital} dropped tier going down at {value}");
                previous = tier;
                value -= 0.1;
            }
        }
    }
}
