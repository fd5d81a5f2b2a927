use serde::{Deserialize, Serialize};

/// Subject attributes used for personalisation. Missing fields fall back to
/// service defaults (age 30).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubjectProfile {
    pub subject_id: String,
    pub age: Option<u32>,
    pub medical_conditions: Vec<String>,
    pub health_goals: Vec<String>,
}

impl SubjectProfile {
    pub fn age_or(&self, default_age: u32) -> u32 {
        self.age.unwrap_or(default_age)
    }
}
