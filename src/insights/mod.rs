//! Insight generation over a subject's measurement history.
//!
//! Pipeline: history → [`trend::analyze`] → [`score::HealthScoreCalculator`]
//! → [`recommend::recommend`], plus per-vital narrative insights. Every stage
//! is a pure function of its inputs; fetching history and profile is the
//! caller's job.

pub mod messages;
pub mod recommend;
pub mod score;
pub mod trend;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{HealthStatus, MeasurementSnapshot, SubjectProfile, VitalSign};

pub use messages::{vital_insights, BloodPressureCategory, Insight};
pub use recommend::{recommend, Recommendation};
pub use score::{HealthScore, HealthScoreCalculator, ScoreDeductions};
pub use trend::{analyze, TrendSummary, VitalTrend};

// ═══════════════════════════════════════════════════════════
// Report shapes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightReport {
    pub subject_id: String,
    pub analysis_date: DateTime<Utc>,
    pub period_days: u32,
    pub health_score: HealthScore,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub trends: TrendSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub subject_id: String,
    pub generated_at: DateTime<Utc>,
    pub health_score: HealthScore,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    pub subject_id: String,
    pub analysis_date: DateTime<Utc>,
    pub period_days: u32,
    pub trends: TrendSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureMetrics {
    pub systolic: Option<VitalTrend>,
    pub diastolic: Option<VitalTrend>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub heart_rate: Option<VitalTrend>,
    pub blood_pressure: BloodPressureMetrics,
    pub temperature: Option<VitalTrend>,
    pub oxygen_saturation: Option<VitalTrend>,
}

impl KeyMetrics {
    fn from_summary(summary: &TrendSummary) -> Self {
        let pick = |vital| summary.vital(vital).cloned();
        Self {
            heart_rate: pick(VitalSign::HeartRate),
            blood_pressure: BloodPressureMetrics {
                systolic: pick(VitalSign::SystolicBp),
                diastolic: pick(VitalSign::DiastolicBp),
            },
            temperature: pick(VitalSign::Temperature),
            oxygen_saturation: pick(VitalSign::OxygenSaturation),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub subject_id: String,
    pub summary_date: DateTime<Utc>,
    pub period_days: u32,
    pub health_score: u32,
    pub overall_status: HealthStatus,
    pub key_metrics: KeyMetrics,
}

// ═══════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════

/// Everything an insight computation needs besides configuration.
pub struct InsightInput<'a> {
    pub subject_id: &'a str,
    pub history: &'a [MeasurementSnapshot],
    pub profile: &'a SubjectProfile,
    pub period_days: u32,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InsightEngine {
    calculator: HealthScoreCalculator,
    default_age: u32,
}

impl InsightEngine {
    pub fn new(deductions: ScoreDeductions, default_age: u32) -> Self {
        Self {
            calculator: HealthScoreCalculator::new(deductions),
            default_age,
        }
    }

    fn score(&self, summary: &TrendSummary, profile: &SubjectProfile) -> HealthScore {
        self.calculator
            .calculate(summary, profile.age_or(self.default_age))
    }

    /// Full report, or `None` when the window holds no readings.
    pub fn report(&self, input: &InsightInput<'_>) -> Option<InsightReport> {
        let trends = non_empty(analyze(input.history))?;
        let age = input.profile.age_or(self.default_age);
        let health_score = self.score(&trends, input.profile);

        Some(InsightReport {
            subject_id: input.subject_id.to_string(),
            analysis_date: input.now,
            period_days: input.period_days,
            health_score,
            insights: vital_insights(&trends, age),
            recommendations: recommend(&trends, input.profile, &health_score),
            trends,
        })
    }

    pub fn recommendations(&self, input: &InsightInput<'_>) -> Option<RecommendationReport> {
        let trends = non_empty(analyze(input.history))?;
        let health_score = self.score(&trends, input.profile);

        Some(RecommendationReport {
            subject_id: input.subject_id.to_string(),
            generated_at: input.now,
            health_score,
            recommendations: recommend(&trends, input.profile, &health_score),
        })
    }

    pub fn trends(&self, input: &InsightInput<'_>) -> Option<TrendReport> {
        let trends = non_empty(analyze(input.history))?;
        Some(TrendReport {
            subject_id: input.subject_id.to_string(),
            analysis_date: input.now,
            period_days: input.period_days,
            trends,
        })
    }

    pub fn summary(&self, input: &InsightInput<'_>) -> Option<HealthSummary> {
        let trends = non_empty(analyze(input.history))?;
        let health_score = self.score(&trends, input.profile);

        Some(HealthSummary {
            subject_id: input.subject_id.to_string(),
            summary_date: input.now,
            period_days: input.period_days,
            health_score: health_score.value,
            overall_status: health_score.status,
            key_metrics: KeyMetrics::from_summary(&trends),
        })
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(ScoreDeductions::default(), 30)
    }
}

fn non_empty(summary: TrendSummary) -> Option<TrendSummary> {
    (!summary.is_empty()).then_some(summary)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{Signals, VitalReadings};

    fn now() -> DateTime<Utc> {
        "2026-03-10T12:00:00Z".parse().unwrap()
    }

    fn history(rows: &[&[(&str, f64)]]) -> Vec<MeasurementSnapshot> {
        rows.iter()
            .enumerate()
            .map(|(i, vitals)| {
                MeasurementSnapshot::new(
                    "u1",
                    now() - Duration::days(rows.len() as i64 - i as i64),
                    vitals.iter().copied().collect::<VitalReadings>(),
                    Signals::default(),
                )
            })
            .collect()
    }

    fn input<'a>(history: &'a [MeasurementSnapshot], profile: &'a SubjectProfile) -> InsightInput<'a> {
        InsightInput {
            subject_id: "u1",
            history,
            profile,
            period_days: 30,
            now: now(),
        }
    }

    #[test]
    fn normal_history_scores_excellent() {
        let h = history(&[&[
            ("heartRate", 72.0),
            ("systolicBP", 120.0),
            ("diastolicBP", 80.0),
            ("temperature", 98.6),
            ("oxygenSaturation", 98.0),
        ]]);
        let profile = SubjectProfile::default();
        let report = InsightEngine::default().report(&input(&h, &profile)).unwrap();

        assert_eq!(report.health_score.value, 100);
        assert_eq!(report.health_score.status, HealthStatus::Excellent);
        assert_eq!(report.insights.len(), 4);
        // Diastolic 80 still reaches the blood pressure advice cutoff.
        assert_eq!(report.recommendations.len(), 1);
        assert_eq!(report.recommendations[0].title, "Blood Pressure Management");
        assert_eq!(report.period_days, 30);
    }

    #[test]
    fn empty_history_yields_nothing() {
        let profile = SubjectProfile::default();
        let engine = InsightEngine::default();
        assert!(engine.report(&input(&[], &profile)).is_none());
        assert!(engine.summary(&input(&[], &profile)).is_none());
        assert!(engine.trends(&input(&[], &profile)).is_none());
        assert!(engine.recommendations(&input(&[], &profile)).is_none());
    }

    #[test]
    fn profile_age_drives_heart_rate_scoring() {
        let h = history(&[&[("heartRate", 88.0)]]);
        let older = SubjectProfile {
            subject_id: "u1".into(),
            age: Some(70),
            ..Default::default()
        };
        let engine = InsightEngine::default();
        assert_eq!(
            engine.report(&input(&h, &SubjectProfile::default())).unwrap().health_score.value,
            100
        );
        assert_eq!(engine.report(&input(&h, &older)).unwrap().health_score.value, 85);
    }

    #[test]
    fn summary_exposes_key_metrics() {
        let h = history(&[
            &[("heartRate", 70.0), ("systolicBP", 118.0), ("diastolicBP", 76.0)],
            &[("heartRate", 74.0), ("systolicBP", 116.0), ("diastolicBP", 74.0)],
        ]);
        let profile = SubjectProfile::default();
        let summary = InsightEngine::default().summary(&input(&h, &profile)).unwrap();

        assert_eq!(summary.health_score, 100);
        assert_eq!(summary.overall_status, HealthStatus::Excellent);
        assert_eq!(summary.key_metrics.heart_rate.as_ref().unwrap().mean, 72.0);
        assert_eq!(summary.key_metrics.blood_pressure.systolic.as_ref().unwrap().count, 2);
        assert!(summary.key_metrics.temperature.is_none());
    }

    #[test]
    fn report_serializes_camel_case() {
        let h = history(&[&[("heartRate", 72.0)]]);
        let profile = SubjectProfile::default();
        let report = InsightEngine::default().report(&input(&h, &profile)).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["healthScore"]["value"], 100);
        assert_eq!(json["trends"]["heartRate"]["stdDev"], 0.0);
        assert_eq!(json["trends"]["heartRate"]["direction"], "stable");
    }
}
