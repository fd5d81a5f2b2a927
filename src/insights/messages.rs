use serde::{Deserialize, Serialize};

use crate::models::{InsightSeverity, VitalSign};

use super::score::{heart_rate_band, TEMPERATURE_BAND};
use super::trend::TrendSummary;

/// Narrative finding for one vital over the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub vital: String,
    pub severity: InsightSeverity,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodPressureCategory {
    Normal,
    Elevated,
    Stage1,
    Stage2,
}

impl BloodPressureCategory {
    pub fn from_means(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 140.0 || diastolic >= 90.0 {
            Self::Stage2
        } else if systolic >= 130.0 || diastolic >= 80.0 {
            Self::Stage1
        } else if systolic >= 120.0 {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Elevated => "Elevated",
            Self::Stage1 => "High Blood Pressure Stage 1",
            Self::Stage2 => "High Blood Pressure Stage 2",
        }
    }
}

/// One insight per classified vital present in the summary, in a fixed
/// order: heart rate, blood pressure, temperature, oxygen saturation.
pub fn vital_insights(summary: &TrendSummary, age: u32) -> Vec<Insight> {
    [
        heart_rate_insight(summary, age),
        blood_pressure_insight(summary),
        temperature_insight(summary),
        oxygen_insight(summary),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn insight(vital: &str, severity: InsightSeverity, message: String, recommendation: &str) -> Insight {
    Insight {
        vital: vital.to_string(),
        severity,
        message,
        recommendation: recommendation.to_string(),
    }
}

fn heart_rate_insight(summary: &TrendSummary, age: u32) -> Option<Insight> {
    let mean = summary.mean_of(VitalSign::HeartRate)?;
    let (low, high) = heart_rate_band(age);
    let name = VitalSign::HeartRate.as_str();

    Some(if mean < low {
        insight(
            name,
            InsightSeverity::Warning,
            format!(
                "Your average heart rate ({mean:.1} bpm) is below the normal range for your age ({low:.0}-{high:.0} bpm)."
            ),
            "Consider consulting with your healthcare provider about your low heart rate.",
        )
    } else if mean > high {
        insight(
            name,
            InsightSeverity::Warning,
            format!(
                "Your average heart rate ({mean:.1} bpm) is above the normal range for your age ({low:.0}-{high:.0} bpm)."
            ),
            "Consider lifestyle changes like regular exercise, stress management, and consulting with your healthcare provider.",
        )
    } else {
        insight(
            name,
            InsightSeverity::Info,
            format!("Your average heart rate ({mean:.1} bpm) is within the normal range for your age."),
            "Continue maintaining your current lifestyle habits.",
        )
    })
}

fn blood_pressure_insight(summary: &TrendSummary) -> Option<Insight> {
    let systolic = summary.mean_of(VitalSign::SystolicBp)?;
    let diastolic = summary.mean_of(VitalSign::DiastolicBp)?;
    let category = BloodPressureCategory::from_means(systolic, diastolic);

    let (severity, recommendation) = match category {
        BloodPressureCategory::Normal => (
            InsightSeverity::Info,
            "Your blood pressure is in the normal range. Continue maintaining a healthy lifestyle.",
        ),
        BloodPressureCategory::Elevated => (
            InsightSeverity::Warning,
            "Your blood pressure is elevated. Consider lifestyle changes like reducing sodium intake and increasing physical activity.",
        ),
        BloodPressureCategory::Stage1 => (
            InsightSeverity::Warning,
            "You have Stage 1 high blood pressure. Consult with your healthcare provider about lifestyle changes and possible medication.",
        ),
        BloodPressureCategory::Stage2 => (
            InsightSeverity::Critical,
            "You have Stage 2 high blood pressure. Immediate consultation with your healthcare provider is recommended.",
        ),
    };

    Some(insight(
        "bloodPressure",
        severity,
        format!(
            "Your average blood pressure is {systolic:.1}/{diastolic:.1} mmHg ({}).",
            category.label()
        ),
        recommendation,
    ))
}

fn temperature_insight(summary: &TrendSummary) -> Option<Insight> {
    let mean = summary.mean_of(VitalSign::Temperature)?;
    let (low, high) = TEMPERATURE_BAND;
    let name = VitalSign::Temperature.as_str();

    Some(if mean < low {
        insight(
            name,
            InsightSeverity::Warning,
            format!("Your average temperature ({mean:.1}°F) is below normal (97-99°F)."),
            "Monitor for symptoms of hypothermia or other conditions. Consult with your healthcare provider if this persists.",
        )
    } else if mean > high {
        insight(
            name,
            InsightSeverity::Warning,
            format!("Your average temperature ({mean:.1}°F) is above normal (97-99°F)."),
            "Monitor for fever symptoms. Rest, stay hydrated, and consult with your healthcare provider if symptoms worsen.",
        )
    } else {
        insight(
            name,
            InsightSeverity::Info,
            format!("Your average temperature ({mean:.1}°F) is within the normal range."),
            "Your body temperature is normal. Continue monitoring for any changes.",
        )
    })
}

fn oxygen_insight(summary: &TrendSummary) -> Option<Insight> {
    let mean = summary.mean_of(VitalSign::OxygenSaturation)?;
    let name = VitalSign::OxygenSaturation.as_str();

    Some(if mean < 90.0 {
        insight(
            name,
            InsightSeverity::Critical,
            format!("Your average oxygen saturation ({mean:.1}%) is critically low (normal: 95-100%)."),
            "Seek immediate medical attention. Low oxygen saturation can be life-threatening.",
        )
    } else if mean < 95.0 {
        insight(
            name,
            InsightSeverity::Warning,
            format!("Your average oxygen saturation ({mean:.1}%) is below normal (95-100%)."),
            "Monitor your breathing and consult with your healthcare provider. Consider factors like altitude or respiratory conditions.",
        )
    } else {
        insight(
            name,
            InsightSeverity::Info,
            format!("Your average oxygen saturation ({mean:.1}%) is within the normal range."),
            "Your oxygen levels are healthy. Continue monitoring for any changes.",
        )
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::insights::trend::analyze;
    use crate::models::{MeasurementSnapshot, Signals, VitalReadings};

    fn summary(vitals: &[(&str, f64)]) -> TrendSummary {
        let at: DateTime<Utc> = "2026-03-01T08:00:00Z".parse().unwrap();
        analyze(&[MeasurementSnapshot::new(
            "u1",
            at,
            vitals.iter().copied().collect::<VitalReadings>(),
            Signals::default(),
        )])
    }

    #[test]
    fn blood_pressure_categories() {
        assert_eq!(BloodPressureCategory::from_means(115.0, 75.0), BloodPressureCategory::Normal);
        assert_eq!(BloodPressureCategory::from_means(125.0, 75.0), BloodPressureCategory::Elevated);
        assert_eq!(BloodPressureCategory::from_means(125.0, 82.0), BloodPressureCategory::Stage1);
        assert_eq!(BloodPressureCategory::from_means(142.0, 70.0), BloodPressureCategory::Stage2);
    }

    #[test]
    fn one_insight_per_present_vital_in_fixed_order() {
        let s = summary(&[
            ("oxygenSaturation", 97.0),
            ("heartRate", 72.0),
            ("systolicBP", 118.0),
            ("diastolicBP", 76.0),
            ("temperature", 98.6),
        ]);
        let insights = vital_insights(&s, 30);
        let vitals: Vec<_> = insights.iter().map(|i| i.vital.as_str()).collect();
        assert_eq!(
            vitals,
            vec!["heartRate", "bloodPressure", "temperature", "oxygenSaturation"]
        );
        assert!(insights.iter().all(|i| i.severity == InsightSeverity::Info));
    }

    #[test]
    fn heart_rate_judged_against_age_band() {
        let s = summary(&[("heartRate", 88.0)]);
        assert_eq!(vital_insights(&s, 30)[0].severity, InsightSeverity::Info);
        let older = &vital_insights(&s, 65)[0];
        assert_eq!(older.severity, InsightSeverity::Warning);
        assert!(older.message.contains("above the normal range for your age (60-85 bpm)"));
    }

    #[test]
    fn stage_two_blood_pressure_is_critical() {
        let s = summary(&[("systolicBP", 150.0), ("diastolicBP", 95.0)]);
        let insights = vital_insights(&s, 30);
        assert_eq!(insights[0].severity, InsightSeverity::Critical);
        assert_eq!(
            insights[0].message,
            "Your average blood pressure is 150.0/95.0 mmHg (High Blood Pressure Stage 2)."
        );
    }

    #[test]
    fn oxygen_severity_bands() {
        assert_eq!(
            vital_insights(&summary(&[("oxygenSaturation", 88.0)]), 30)[0].severity,
            InsightSeverity::Critical
        );
        assert_eq!(
            vital_insights(&summary(&[("oxygenSaturation", 93.0)]), 30)[0].severity,
            InsightSeverity::Warning
        );
    }

    #[test]
    fn fever_is_a_warning() {
        let insights = vital_insights(&summary(&[("temperature", 101.2)]), 30);
        assert_eq!(insights[0].severity, InsightSeverity::Warning);
    }

    #[test]
    fn no_insights_without_classified_vitals() {
        assert!(vital_insights(&summary(&[("steps", 4000.0)]), 30).is_empty());
    }
}
