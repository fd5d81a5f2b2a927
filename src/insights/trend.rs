use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{MeasurementSnapshot, TrendDirection, VitalSign};

/// Slope (units per sample) beyond which a series counts as moving.
pub const SLOPE_THRESHOLD: f64 = 0.1;

/// Rolling statistics for one vital over an analysis window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VitalTrend {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub direction: TrendDirection,
}

/// Per-vital statistics keyed by vital name. Vitals with no readings in the
/// window are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrendSummary(BTreeMap<String, VitalTrend>);

impl TrendSummary {
    pub fn get(&self, name: &str) -> Option<&VitalTrend> {
        self.0.get(name)
    }

    pub fn vital(&self, vital: VitalSign) -> Option<&VitalTrend> {
        self.get(vital.as_str())
    }

    pub fn mean_of(&self, vital: VitalSign) -> Option<f64> {
        self.vital(vital).map(|t| t.mean)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VitalTrend)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Group a history by vital name and summarise each series.
///
/// Snapshots are put in timestamp order first so the slope is taken over
/// chronological samples regardless of how the store returned them.
pub fn analyze(history: &[MeasurementSnapshot]) -> TrendSummary {
    let mut ordered: Vec<&MeasurementSnapshot> = history.iter().collect();
    ordered.sort_by_key(|s| s.timestamp());

    let mut series: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for snapshot in ordered {
        for (name, value) in snapshot.vitals().iter() {
            if value.is_finite() {
                series.entry(name.to_string()).or_default().push(value);
            }
        }
    }

    TrendSummary(
        series
            .into_iter()
            .filter_map(|(name, values)| summarize(&values).map(|trend| (name, trend)))
            .collect(),
    )
}

/// Statistics for one chronological series; `None` when empty.
pub fn summarize(values: &[f64]) -> Option<VitalTrend> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let std_dev = if count > 1 {
        let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (sum_sq / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(VitalTrend {
        count,
        mean,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        std_dev,
        direction: direction(values),
    })
}

/// OLS slope of value against sample index, classified by `SLOPE_THRESHOLD`.
pub fn direction(values: &[f64]) -> TrendDirection {
    match slope(values) {
        Some(s) if s > SLOPE_THRESHOLD => TrendDirection::Increasing,
        Some(s) if s < -SLOPE_THRESHOLD => TrendDirection::Decreasing,
        _ => TrendDirection::Stable,
    }
}

fn slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let (covariance, x_variance) = values.iter().enumerate().fold(
        (0.0, 0.0),
        |(cov, var), (i, y)| {
            let dx = i as f64 - x_mean;
            (cov + dx * (y - y_mean), var + dx * dx)
        },
    );

    if x_variance == 0.0 {
        None
    } else {
        Some(covariance / x_variance)
    }
}
