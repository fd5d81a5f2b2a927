//! Vital-sign classification: threshold table, classifier and the ingestion
//! checks that run before it.

pub mod classifier;
pub mod thresholds;
pub mod types;
pub mod validation;

pub use classifier::{classify, VitalClassifier};
pub use thresholds::{Cutoffs, ThresholdError, ThresholdTable, TierCutoffs, CANONICAL, TABLE_VERSION};
pub use types::{highest_tier, ActionRequired, Condition, ConditionKind, ObservedValue, SeverityTier};
pub use validation::validate_snapshot;
