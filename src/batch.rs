//! Concurrent processing of a request batch.
//!
//! Requests for different subjects are independent pipelines and run
//! concurrently. Requests for the same subject run one after another in input
//! order, so an `add` followed by a `logDose` in one batch sees its own write.
//! Collaborators are synchronous, so each subject's run happens on the
//! blocking pool and the batch joins them all.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::json;

use crate::service::{HealthService, ServiceRequest, ServiceResponse};

/// Requests of one subject, tagged with their position in the batch.
type SubjectRun = Vec<(usize, ServiceRequest)>;

/// Run the batch, one sequential run per subject. Responses come back in
/// request order.
pub async fn process_batch(
    service: Arc<HealthService>,
    requests: Vec<ServiceRequest>,
    now: DateTime<Utc>,
) -> Vec<ServiceResponse> {
    let total = requests.len();
    let runs = group_by_subject(requests);
    tracing::debug!(requests = total, subjects = runs.len(), "Processing batch");

    let positions: Vec<Vec<usize>> = runs
        .iter()
        .map(|run| run.iter().map(|(index, _)| *index).collect())
        .collect();

    let tasks = runs.into_iter().map(|run| {
        let service = Arc::clone(&service);
        tokio::task::spawn_blocking(move || {
            run.into_iter()
                .map(|(index, request)| (index, service.handle(request, now)))
                .collect::<Vec<_>>()
        })
    });

    let mut slots: Vec<Option<ServiceResponse>> = vec![None; total];
    for (joined, indices) in join_all(tasks).await.into_iter().zip(positions) {
        match joined {
            Ok(answered) => {
                for (index, response) in answered {
                    slots[index] = Some(response);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, requests = indices.len(), "Subject pipeline aborted");
                let message = e.to_string();
                for index in indices {
                    slots[index] = Some(internal_error(&message));
                }
            }
        }
    }

    let responses: Vec<ServiceResponse> = slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| internal_error("request was not processed")))
        .collect();

    let failed = responses.iter().filter(|r| !r.is_success()).count();
    tracing::info!(requests = total, failed, "Batch complete");
    responses
}

/// Split the batch into per-subject runs, ordered by each subject's first
/// request and keeping input order inside a run.
fn group_by_subject(requests: Vec<ServiceRequest>) -> Vec<SubjectRun> {
    let mut run_of: HashMap<String, usize> = HashMap::new();
    let mut runs: Vec<SubjectRun> = Vec::new();
    for (index, request) in requests.into_iter().enumerate() {
        let run = *run_of
            .entry(request.subject_id().to_string())
            .or_insert_with(|| {
                runs.push(Vec::new());
                runs.len() - 1
            });
        runs[run].push((index, request));
    }
    runs
}

fn internal_error(message: &str) -> ServiceResponse {
    ServiceResponse {
        status_code: 500,
        body: json!({
            "error": { "code": "INTERNAL_ERROR", "message": message }
        }),
    }
}
