//! Service boundary: request/response shapes and the per-request pipeline.
//!
//! `HealthService` owns every engine and holds the collaborators it was
//! constructed with. Each request runs as one self-contained pipeline; no
//! state is shared between requests beyond what the collaborators persist.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{AlertDispatchCoordinator, DispatchReport};
use crate::collaborators::{
    AppendOutcome, EmergencyLog, HistoryStore, MedicationStore, MetricsSink, NotificationChannel, ProfileStore,
};
use crate::config::ServiceConfig;
use crate::error::CoreError;
use crate::insights::{
    HealthSummary, InsightEngine, InsightInput, InsightReport, RecommendationReport, TrendReport,
};
use crate::medications::{
    AdherenceReport, MedicationCard, MedicationFields, MedicationService, ReminderEvent,
};
use crate::models::{
    InsightKind, MeasurementSnapshot, MedicationAction, Signals, SubjectProfile, VitalReadings,
    VitalSign,
};
use crate::monitoring::{highest_tier, validate_snapshot, Condition, SeverityTier, VitalClassifier};

// ═══════════════════════════════════════════
// Requests
// ═══════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionRequest {
    pub subject_id: String,
    /// Defaults to the processing instant.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vitals: VitalReadings,
    #[serde(flatten)]
    pub signals: Signals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationActionRequest {
    pub action: MedicationAction,
    pub subject_id: String,
    #[serde(default)]
    pub medication_id: Option<String>,
    /// Dose or miss instant for `logDose` / `logMissed`; defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Reporting window for `adherenceReport`.
    #[serde(default)]
    pub period_days: Option<u32>,
    #[serde(flatten)]
    pub fields: MedicationFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub subject_id: String,
    #[serde(default)]
    pub window_days: Option<u32>,
    #[serde(default)]
    pub kind: InsightKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServiceRequest {
    Ingest(IngestionRequest),
    Medication(MedicationActionRequest),
    Insight(InsightRequest),
}

impl ServiceRequest {
    pub fn subject_id(&self) -> &str {
        match self {
            Self::Ingest(r) => &r.subject_id,
            Self::Medication(r) => &r.subject_id,
            Self::Insight(r) => &r.subject_id,
        }
    }
}

// ═══════════════════════════════════════════
// Responses
// ═══════════════════════════════════════════

/// Status indicator plus JSON body. Error bodies follow `ErrorBody`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub status_code: u16,
    pub body: serde_json::Value,
}

impl ServiceResponse {
    pub fn new(status_code: u16, body: &impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status_code, body },
            Err(e) => {
                tracing::error!(error = %e, "Response body failed to serialize");
                Self {
                    status_code: 500,
                    body: serde_json::json!({
                        "error": { "code": "INTERNAL_ERROR", "message": e.to_string() }
                    }),
                }
            }
        }
    }

    pub fn from_error(error: &CoreError) -> Self {
        Self::new(error.status_code(), &error.to_body())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionOutcome {
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    /// Highest tier raised, NORMAL when nothing was.
    pub status: SeverityTier,
    pub conditions: Vec<Condition>,
    /// False when the history store refused the snapshot. Classification and
    /// dispatch still ran; the request should be redelivered.
    pub stored: bool,
    /// The same (subject, timestamp) was stored by an earlier delivery. Its
    /// alerts and metrics went out then and are not repeated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub already_recorded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
    pub dispatch: DispatchReport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MedicationOutcome {
    Medication(MedicationCard),
    Medications {
        medications: Vec<MedicationCard>,
        count: usize,
    },
    Reminders {
        reminders: Vec<ReminderEvent>,
        dispatch: DispatchReport,
    },
    Adherence(AdherenceReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightOutcome {
    Report(InsightReport),
    Recommendations(RecommendationReport),
    Trends(TrendReport),
    Summary(HealthSummary),
}

// ═══════════════════════════════════════════
// Service
// ═══════════════════════════════════════════

/// Collaborators a `HealthService` is built from. Constructed once per process.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistoryStore>,
    pub medications: Arc<dyn MedicationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub channel: Arc<dyn NotificationChannel>,
    pub metrics: Arc<dyn MetricsSink>,
    pub emergency_log: Arc<dyn EmergencyLog>,
}

pub struct HealthService {
    history: Arc<dyn HistoryStore>,
    profiles: Arc<dyn ProfileStore>,
    metrics: Arc<dyn MetricsSink>,
    classifier: VitalClassifier,
    insights: InsightEngine,
    medications: MedicationService,
    alerts: AlertDispatchCoordinator,
    config: ServiceConfig,
}

impl HealthService {
    pub fn new(collaborators: Collaborators, config: ServiceConfig) -> Self {
        let Collaborators {
            history,
            medications,
            profiles,
            channel,
            metrics,
            emergency_log,
        } = collaborators;

        Self {
            classifier: VitalClassifier::default(),
            insights: InsightEngine::new(config.score_deductions.clone(), config.default_age),
            medications: MedicationService::new(
                medications,
                Arc::clone(&metrics),
                config.medication_metrics_namespace.clone(),
                config.reminder_lead(),
            ),
            alerts: AlertDispatchCoordinator::new(
                channel,
                Arc::clone(&metrics),
                emergency_log,
                &config,
            ),
            history,
            profiles,
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Route one request and render the result as a response.
    pub fn handle(&self, request: ServiceRequest, now: DateTime<Utc>) -> ServiceResponse {
        match request {
            ServiceRequest::Ingest(r) => match self.ingest(r, now) {
                Ok(outcome) if outcome.stored => ServiceResponse::new(200, &outcome),
                Ok(outcome) => ServiceResponse::new(503, &outcome),
                Err(e) => respond_error(&e),
            },
            ServiceRequest::Medication(r) => {
                let created = r.action == MedicationAction::Add;
                match self.medication(r, now) {
                    Ok(outcome) => ServiceResponse::new(if created { 201 } else { 200 }, &outcome),
                    Err(e) => respond_error(&e),
                }
            }
            ServiceRequest::Insight(r) => match self.insights(r, now) {
                Ok(outcome) => ServiceResponse::new(200, &outcome),
                Err(e) => respond_error(&e),
            },
        }
    }

    // ── ingestion ────────────────────────────────────────

    /// Validate, classify, store, count and dispatch one snapshot.
    ///
    /// Only validation failures are returned as errors. A history-store
    /// failure is reported through `stored = false` after classification and
    /// dispatch have run.
    pub fn ingest(
        &self,
        request: IngestionRequest,
        now: DateTime<Utc>,
    ) -> Result<IngestionOutcome, CoreError> {
        let snapshot = MeasurementSnapshot::new(
            request.subject_id,
            request.timestamp.unwrap_or(now),
            request.vitals,
            request.signals,
        );
        validate_snapshot(&snapshot)?;
        let subject_id = snapshot.subject_id();

        let conditions = self.classifier.classify(&snapshot);
        let status = highest_tier(&conditions);
        tracing::debug!(
            subject_id,
            vitals = snapshot.vitals().len(),
            conditions = conditions.len(),
            tier = %status,
            "Snapshot classified"
        );

        let store_error = match self.history.append(&snapshot) {
            Ok(AppendOutcome::Recorded) => None,
            Ok(AppendOutcome::AlreadyRecorded) => {
                tracing::info!(
                    subject_id,
                    timestamp = %snapshot.timestamp(),
                    tier = %status,
                    "Snapshot already recorded, skipping dispatch"
                );
                return Ok(IngestionOutcome {
                    subject_id: subject_id.to_string(),
                    timestamp: snapshot.timestamp(),
                    status,
                    conditions,
                    stored: true,
                    already_recorded: true,
                    store_error: None,
                    dispatch: DispatchReport::default(),
                });
            }
            Err(e) => {
                let error = CoreError::dependency("history store", "ingest", subject_id, e);
                tracing::error!(error = %error, "Snapshot not stored");
                Some(error.to_string())
            }
        };

        self.record_ingestion_metrics(&snapshot);
        let dispatch = self.alerts.dispatch(subject_id, &conditions, now);

        tracing::info!(
            subject_id,
            tier = %status,
            stored = store_error.is_none(),
            "Snapshot ingested"
        );

        Ok(IngestionOutcome {
            subject_id: subject_id.to_string(),
            timestamp: snapshot.timestamp(),
            status,
            conditions,
            stored: store_error.is_none(),
            already_recorded: false,
            store_error,
            dispatch,
        })
    }

    fn record_ingestion_metrics(&self, snapshot: &MeasurementSnapshot) {
        let namespace = &self.config.vitals_metrics_namespace;
        let subject_id = snapshot.subject_id();
        let dimensions = [("SubjectId", subject_id)];

        let recognized = snapshot
            .vitals()
            .iter()
            .filter_map(|(name, _)| VitalSign::from_name(name))
            .map(VitalSign::metric_name);

        for metric in std::iter::once("MeasurementIngested").chain(recognized) {
            if let Err(e) = self.metrics.increment(namespace, metric, &dimensions) {
                tracing::warn!(subject_id, metric, error = %e, "Ingestion metric not recorded");
            }
        }
    }

    // ── medications ──────────────────────────────────────

    pub fn medication(
        &self,
        request: MedicationActionRequest,
        now: DateTime<Utc>,
    ) -> Result<MedicationOutcome, CoreError> {
        let MedicationActionRequest {
            action,
            subject_id,
            medication_id,
            timestamp,
            period_days,
            fields,
        } = request;
        let subject_id = subject_id.as_str();
        if subject_id.trim().is_empty() {
            return Err(CoreError::validation(
                "medication",
                subject_id,
                "subject id is empty",
            ));
        }
        tracing::debug!(subject_id, %action, "Medication action");

        let at = timestamp.unwrap_or(now);
        let medication_id = medication_id.as_deref();
        let require_id = || required_medication_id(medication_id, subject_id, action);

        let outcome = match action {
            MedicationAction::Add => MedicationOutcome::Medication(
                self.medications
                    .add(subject_id, medication_id, fields, now)?
                    .into(),
            ),
            MedicationAction::Update => MedicationOutcome::Medication(
                self.medications
                    .update(subject_id, require_id()?, fields, now)?
                    .into(),
            ),
            MedicationAction::Remove => MedicationOutcome::Medication(
                self.medications.remove(subject_id, require_id()?, now)?.into(),
            ),
            MedicationAction::LogDose => MedicationOutcome::Medication(
                self.medications.log_dose(subject_id, require_id()?, at)?.into(),
            ),
            MedicationAction::LogMissed => MedicationOutcome::Medication(
                self.medications
                    .log_missed(subject_id, require_id()?, at)?
                    .into(),
            ),
            MedicationAction::GetAll => {
                let medications: Vec<MedicationCard> = self
                    .medications
                    .get_all(subject_id)?
                    .into_iter()
                    .map(MedicationCard::from)
                    .collect();
                MedicationOutcome::Medications {
                    count: medications.len(),
                    medications,
                }
            }
            MedicationAction::CheckReminders => {
                let reminders = self.medications.check_reminders(subject_id, at)?;
                let dispatch = self.alerts.dispatch_reminders(&reminders);
                MedicationOutcome::Reminders {
                    reminders,
                    dispatch,
                }
            }
            MedicationAction::AdherenceReport => {
                let period_days = period_days.unwrap_or(self.config.default_window_days);
                MedicationOutcome::Adherence(self.medications.adherence_report(
                    subject_id,
                    now,
                    period_days,
                )?)
            }
        };
        Ok(outcome)
    }

    // ── insights ─────────────────────────────────────────

    pub fn insights(
        &self,
        request: InsightRequest,
        now: DateTime<Utc>,
    ) -> Result<InsightOutcome, CoreError> {
        let subject_id = request.subject_id.as_str();
        let window_days = self.window(subject_id, request.window_days)?;
        let history = self.history_since(subject_id, window_days, now)?;
        let profile = self.profile(subject_id)?;

        let input = InsightInput {
            subject_id,
            history: &history,
            profile: &profile,
            period_days: window_days,
            now,
        };
        let outcome = match request.kind {
            InsightKind::Full => self.insights.report(&input).map(InsightOutcome::Report),
            InsightKind::Recommendations => self
                .insights
                .recommendations(&input)
                .map(InsightOutcome::Recommendations),
            InsightKind::Trends => self.insights.trends(&input).map(InsightOutcome::Trends),
            InsightKind::Summary => self.insights.summary(&input).map(InsightOutcome::Summary),
        };

        let outcome = outcome.ok_or_else(|| no_data(subject_id, window_days))?;
        tracing::info!(
            subject_id,
            kind = %request.kind,
            window_days,
            snapshots = history.len(),
            "Insights generated"
        );
        Ok(outcome)
    }

    /// Score, status and key metrics over the last `window_days` (or the
    /// configured default).
    pub fn health_summary(
        &self,
        subject_id: &str,
        window_days: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<HealthSummary, CoreError> {
        let window_days = self.window(subject_id, window_days)?;
        let history = self.history_since(subject_id, window_days, now)?;
        let profile = self.profile(subject_id)?;

        self.insights
            .summary(&InsightInput {
                subject_id,
                history: &history,
                profile: &profile,
                period_days: window_days,
                now,
            })
            .ok_or_else(|| no_data(subject_id, window_days))
    }

    // ── helpers ──────────────────────────────────────────

    fn window(&self, subject_id: &str, requested: Option<u32>) -> Result<u32, CoreError> {
        if subject_id.trim().is_empty() {
            return Err(CoreError::validation("insights", subject_id, "subject id is empty"));
        }
        match requested.unwrap_or(self.config.default_window_days) {
            0 => Err(CoreError::validation(
                "insights",
                subject_id,
                "windowDays must be at least 1",
            )),
            days => Ok(days),
        }
    }

    fn history_since(
        &self,
        subject_id: &str,
        window_days: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<MeasurementSnapshot>, CoreError> {
        let since = now
            .checked_sub_signed(Duration::days(i64::from(window_days)))
            .ok_or_else(|| {
                CoreError::validation(
                    "insights",
                    subject_id,
                    format!("windowDays {window_days} reaches past the supported date range"),
                )
            })?;
        self.history
            .query(subject_id, since)
            .map_err(|e| CoreError::dependency("history store", "insights", subject_id, e))
    }

    fn profile(&self, subject_id: &str) -> Result<SubjectProfile, CoreError> {
        let profile = self
            .profiles
            .get(subject_id)
            .map_err(|e| CoreError::dependency("profile store", "insights", subject_id, e))?;
        Ok(profile.unwrap_or_else(|| SubjectProfile {
            subject_id: subject_id.to_string(),
            ..Default::default()
        }))
    }
}

fn required_medication_id<'a>(
    medication_id: Option<&'a str>,
    subject_id: &str,
    action: MedicationAction,
) -> Result<&'a str, CoreError> {
    medication_id.ok_or_else(|| {
        CoreError::validation(
            "medication",
            subject_id,
            format!("medicationId is required for {action}"),
        )
    })
}

fn no_data(subject_id: &str, window_days: u32) -> CoreError {
    CoreError::not_found(
        "Health data",
        subject_id,
        format!("no readings in the last {window_days} days"),
    )
}

fn respond_error(error: &CoreError) -> ServiceResponse {
    match error {
        CoreError::Dependency { .. } => tracing::error!(error = %error, "Request failed"),
        _ => tracing::info!(error = %error, "Request rejected"),
    }
    ServiceResponse::from_error(error)
}
