use serde::{Deserialize, Serialize};

use crate::models::{Priority, RecommendationCategory, SubjectProfile, VitalSign};

use super::score::HealthScore;
use super::trend::TrendSummary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub title: String,
    pub description: String,
}

impl Recommendation {
    fn new(
        category: RecommendationCategory,
        priority: Priority,
        title: &str,
        description: &str,
    ) -> Self {
        Self {
            category,
            priority,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

type Rule = fn(&TrendSummary, &SubjectProfile, &HealthScore) -> Option<Recommendation>;

/// Evaluated in this order; each rule fires at most once.
const RULES: [Rule; 5] = [
    overall_score,
    heart_rate,
    blood_pressure,
    fever,
    oxygen,
];

/// Run the fixed rule list. Output keeps rule order; a rule whose vital is
/// missing from the summary is skipped.
pub fn recommend(
    summary: &TrendSummary,
    profile: &SubjectProfile,
    score: &HealthScore,
) -> Vec<Recommendation> {
    RULES
        .iter()
        .filter_map(|rule| rule(summary, profile, score))
        .collect()
}

fn overall_score(
    _summary: &TrendSummary,
    _profile: &SubjectProfile,
    score: &HealthScore,
) -> Option<Recommendation> {
    (score.value < 70).then(|| {
        Recommendation::new(
            RecommendationCategory::General,
            Priority::High,
            "Overall Health Improvement",
            "Your health metrics indicate areas for improvement. Consider consulting with your healthcare provider for a comprehensive health assessment.",
        )
    })
}

fn heart_rate(
    summary: &TrendSummary,
    _profile: &SubjectProfile,
    _score: &HealthScore,
) -> Option<Recommendation> {
    let mean = summary.mean_of(VitalSign::HeartRate)?;
    (mean > 100.0).then(|| {
        Recommendation::new(
            RecommendationCategory::Cardiovascular,
            Priority::Medium,
            "Heart Rate Management",
            "Your heart rate is elevated. Consider regular cardiovascular exercise, stress reduction techniques, and maintaining a healthy weight.",
        )
    })
}

fn blood_pressure(
    summary: &TrendSummary,
    _profile: &SubjectProfile,
    _score: &HealthScore,
) -> Option<Recommendation> {
    let systolic = summary.mean_of(VitalSign::SystolicBp)?;
    let diastolic = summary.mean_of(VitalSign::DiastolicBp)?;
    // Inclusive at 80 diastolic, unlike the score's elevated band (> 80):
    // a 120/80 average scores 100 and still gets this advice.
    (systolic >= 130.0 || diastolic >= 80.0).then(|| {
        Recommendation::new(
            RecommendationCategory::Cardiovascular,
            Priority::High,
            "Blood Pressure Management",
            "Your blood pressure is elevated. Focus on reducing sodium intake, regular exercise, weight management, and stress reduction.",
        )
    })
}

fn fever(
    summary: &TrendSummary,
    _profile: &SubjectProfile,
    _score: &HealthScore,
) -> Option<Recommendation> {
    let mean = summary.mean_of(VitalSign::Temperature)?;
    (mean > 100.4).then(|| {
        Recommendation::new(
            RecommendationCategory::General,
            Priority::Medium,
            "Fever Management",
            "You may have a fever. Rest, stay hydrated, and monitor your symptoms. Consult with your healthcare provider if symptoms persist.",
        )
    })
}

fn oxygen(
    summary: &TrendSummary,
    _profile: &SubjectProfile,
    _score: &HealthScore,
) -> Option<Recommendation> {
    let mean = summary.mean_of(VitalSign::OxygenSaturation)?;
    (mean < 95.0).then(|| {
        Recommendation::new(
            RecommendationCategory::Respiratory,
            Priority::High,
            "Oxygen Level Monitoring",
            "Your oxygen saturation is below normal. Monitor your breathing, avoid smoking, and consult with your healthcare provider.",
        )
    })
}
