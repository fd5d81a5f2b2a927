use serde::{Deserialize, Serialize};

use crate::models::{HealthStatus, VitalSign};

use super::trend::TrendSummary;

/// Normal temperature band in °F, inclusive.
pub const TEMPERATURE_BAND: (f64, f64) = (97.0, 100.4);

/// Points removed per out-of-band vital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreDeductions {
    pub heart_rate: u32,
    pub blood_pressure_high: u32,
    pub blood_pressure_elevated: u32,
    pub temperature: u32,
    pub oxygen_critical: u32,
    pub oxygen_low: u32,
}

impl Default for ScoreDeductions {
    fn default() -> Self {
        Self {
            heart_rate: 15,
            blood_pressure_high: 20,
            blood_pressure_elevated: 10,
            temperature: 10,
            oxygen_critical: 25,
            oxygen_low: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub value: u32,
    pub status: HealthStatus,
}

/// Age-adjusted resting heart rate band (bpm, inclusive).
pub fn heart_rate_band(age: u32) -> (f64, f64) {
    match age {
        0..=19 => (60.0, 100.0),
        20..=39 => (60.0, 95.0),
        40..=59 => (60.0, 90.0),
        _ => (60.0, 85.0),
    }
}

pub fn status_for(value: u32) -> HealthStatus {
    match value {
        90.. => HealthStatus::Excellent,
        80..=89 => HealthStatus::Good,
        70..=79 => HealthStatus::Fair,
        60..=69 => HealthStatus::Poor,
        _ => HealthStatus::Critical,
    }
}

#[derive(Debug, Clone, Default)]
pub struct HealthScoreCalculator {
    deductions: ScoreDeductions,
}

impl HealthScoreCalculator {
    pub fn new(deductions: ScoreDeductions) -> Self {
        Self { deductions }
    }

    /// Start at 100, subtract each vital's deduction independently, clamp to
    /// [0, 100]. Vitals missing from the summary cost nothing.
    pub fn calculate(&self, summary: &TrendSummary, age: u32) -> HealthScore {
        let d = &self.deductions;
        let mut total: i64 = 0;

        if let Some(hr) = summary.mean_of(VitalSign::HeartRate) {
            let (low, high) = heart_rate_band(age);
            if hr < low || hr > high {
                total += i64::from(d.heart_rate);
            }
        }

        if let (Some(sys), Some(dia)) = (
            summary.mean_of(VitalSign::SystolicBp),
            summary.mean_of(VitalSign::DiastolicBp),
        ) {
            // A textbook 120/80 reading costs nothing; the elevated band
            // starts strictly above 80 diastolic.
            if sys >= 140.0 || dia >= 90.0 {
                total += i64::from(d.blood_pressure_high);
            } else if sys >= 130.0 || dia > 80.0 {
                total += i64::from(d.blood_pressure_elevated);
            }
        }

        if let Some(temp) = summary.mean_of(VitalSign::Temperature) {
            let (low, high) = TEMPERATURE_BAND;
            if temp < low || temp > high {
                total += i64::from(d.temperature);
            }
        }

        if let Some(spo2) = summary.mean_of(VitalSign::OxygenSaturation) {
            if spo2 < 90.0 {
                total += i64::from(d.oxygen_critical);
            } else if spo2 < 95.0 {
                total += i64::from(d.oxygen_low);
            }
        }

        let value = (100 - total).clamp(0, 100) as u32;
        HealthScore {
            value,
            status: status_for(value),
        }
    }
}
