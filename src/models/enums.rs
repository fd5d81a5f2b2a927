use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The wire form (serde) is the same string as `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MedicationStatus {
    Active => "active",
    Inactive => "inactive",
});

str_enum!(TrendDirection {
    Increasing => "increasing",
    Decreasing => "decreasing",
    Stable => "stable",
});

str_enum!(HealthStatus {
    Excellent => "Excellent",
    Good => "Good",
    Fair => "Fair",
    Poor => "Poor",
    Critical => "Critical",
});

str_enum!(Priority {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(RecommendationCategory {
    General => "general",
    Cardiovascular => "cardiovascular",
    Respiratory => "respiratory",
});

str_enum!(InsightSeverity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

str_enum!(MedicationAction {
    Add => "add",
    Update => "update",
    Remove => "remove",
    LogDose => "logDose",
    LogMissed => "logMissed",
    GetAll => "getAll",
    CheckReminders => "checkReminders",
    AdherenceReport => "adherenceReport",
});

str_enum!(InsightKind {
    Full => "full",
    Recommendations => "recommendations",
    Trends => "trends",
    Summary => "summary",
});

impl Default for InsightKind {
    fn default() -> Self {
        Self::Full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn medication_status_round_trip() {
        for (variant, s) in [
            (MedicationStatus::Active, "active"),
            (MedicationStatus::Inactive, "inactive"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(MedicationStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn health_status_keeps_title_case() {
        assert_eq!(HealthStatus::Excellent.as_str(), "Excellent");
        assert_eq!(
            serde_json::to_string(&HealthStatus::Poor).unwrap(),
            "\"Poor\""
        );
    }

    #[test]
    fn serde_uses_wire_strings() {
        assert_eq!(
            serde_json::to_string(&TrendDirection::Increasing).unwrap(),
            "\"increasing\""
        );
        let parsed: Priority = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(parsed, Priority::High);
    }

    #[test]
    fn unknown_value_names_the_enum() {
        let err = MedicationStatus::from_str("paused").unwrap_err();
        assert_eq!(err.field, "MedicationStatus");
        assert_eq!(err.value, "paused");
    }

    #[test]
    fn action_names_are_camel_case() {
        let action: MedicationAction = serde_json::from_str("\"logDose\"").unwrap();
        assert_eq!(action, MedicationAction::LogDose);
        assert_eq!(MedicationAction::CheckReminders.as_str(), "checkReminders");
        assert_eq!(InsightKind::default(), InsightKind::Full);
    }
}
