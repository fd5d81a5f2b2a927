use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Vital signs the classifier and scorer understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VitalSign {
    #[serde(rename = "heartRate")]
    HeartRate,
    #[serde(rename = "systolicBP")]
    SystolicBp,
    #[serde(rename = "diastolicBP")]
    DiastolicBp,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "oxygenSaturation")]
    OxygenSaturation,
}

impl VitalSign {
    pub const ALL: [VitalSign; 5] = [
        VitalSign::HeartRate,
        VitalSign::SystolicBp,
        VitalSign::DiastolicBp,
        VitalSign::Temperature,
        VitalSign::OxygenSaturation,
    ];

    /// Key used in measurement payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            VitalSign::HeartRate => "heartRate",
            VitalSign::SystolicBp => "systolicBP",
            VitalSign::DiastolicBp => "diastolicBP",
            VitalSign::Temperature => "temperature",
            VitalSign::OxygenSaturation => "oxygenSaturation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }

    pub fn unit(self) -> &'static str {
        match self {
            VitalSign::HeartRate => "bpm",
            VitalSign::SystolicBp | VitalSign::DiastolicBp => "mmHg",
            VitalSign::Temperature => "°F",
            VitalSign::OxygenSaturation => "%",
        }
    }

    /// Name of the per-reading counter in the vitals metrics namespace.
    pub fn metric_name(self) -> &'static str {
        match self {
            VitalSign::HeartRate => "HeartRateReading",
            VitalSign::SystolicBp => "SystolicBPReading",
            VitalSign::DiastolicBp => "DiastolicBPReading",
            VitalSign::Temperature => "TemperatureReading",
            VitalSign::OxygenSaturation => "OxygenSaturationReading",
        }
    }

    /// Physically representable range; readings outside it are rejected at ingestion.
    pub fn representable_range(self) -> (f64, f64) {
        match self {
            VitalSign::HeartRate => (20.0, 300.0),
            VitalSign::SystolicBp => (50.0, 300.0),
            VitalSign::DiastolicBp => (30.0, 200.0),
            VitalSign::Temperature => (80.0, 120.0),
            VitalSign::OxygenSaturation => (0.0, 100.0),
        }
    }
}

impl fmt::Display for VitalSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named numeric readings in the order they were reported.
///
/// Serialized as a JSON object; a repeated name keeps its first position and
/// takes the later value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalReadings(Vec<(String, f64)>);

impl VitalReadings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| *value)
    }

    pub fn vital(&self, vital: VitalSign) -> Option<f64> {
        self.get(vital.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for VitalReadings {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut readings = Self::new();
        for (name, value) in iter {
            readings.insert(name, value);
        }
        readings
    }
}

impl Serialize for VitalReadings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VitalReadings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReadingsVisitor;

        impl<'de> Visitor<'de> for ReadingsVisitor {
            type Value = VitalReadings;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of vital name to numeric value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut readings = VitalReadings::new();
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    readings.insert(name, value);
                }
                Ok(readings)
            }
        }

        deserializer.deserialize_map(ReadingsVisitor)
    }
}

/// Boolean device signals reported alongside vitals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Signals {
    pub panic_button: bool,
    pub fall_detected: bool,
}

impl Signals {
    pub fn any(&self) -> bool {
        self.panic_button || self.fall_detected
    }
}

/// One timestamped set of readings for a subject. Identified by
/// (subject id, timestamp) and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSnapshot {
    subject_id: String,
    timestamp: DateTime<Utc>,
    vitals: VitalReadings,
    #[serde(default)]
    signals: Signals,
}

impl MeasurementSnapshot {
    pub fn new(
        subject_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        vitals: VitalReadings,
        signals: Signals,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            timestamp,
            vitals,
            signals,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn vitals(&self) -> &VitalReadings {
        &self.vitals
    }

    pub fn signals(&self) -> Signals {
        self.signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_keep_reported_order() {
        let readings: VitalReadings =
            serde_json::from_str(r#"{"temperature": 98.6, "heartRate": 72, "systolicBP": 120}"#)
                .unwrap();
        let names: Vec<&str> = readings.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["temperature", "heartRate", "systolicBP"]);
        assert_eq!(readings.vital(VitalSign::HeartRate), Some(72.0));
    }

    #[test]
    fn repeated_name_keeps_position_takes_later_value() {
        let mut readings = VitalReadings::new();
        readings.insert("heartRate", 70.0);
        readings.insert("temperature", 98.0);
        readings.insert("heartRate", 75.0);
        assert_eq!(readings.len(), 2);
        assert_eq!(readings.iter().next(), Some(("heartRate", 75.0)));
    }

    #[test]
    fn non_numeric_reading_is_rejected() {
        let parsed: Result<VitalReadings, _> = serde_json::from_str(r#"{"heartRate": "fast"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = MeasurementSnapshot::new(
            "u1",
            "2026-03-01T08:00:00Z".parse().unwrap(),
            [("heartRate", 80.0)].into_iter().collect(),
            Signals {
                panic_button: false,
                fall_detected: true,
            },
        );
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["subjectId"], "u1");
        assert_eq!(json["signals"]["fallDetected"], true);
        let back: MeasurementSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn vital_names_resolve() {
        for vital in VitalSign::ALL {
            assert_eq!(VitalSign::from_name(vital.as_str()), Some(vital));
        }
        assert_eq!(VitalSign::from_name("respiratoryRate"), None);
    }
}
