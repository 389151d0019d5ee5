//! Batch upload orchestration.
//!
//! Every request in a batch is validated, then driven through an
//! [`UploadTask`] concurrently with the others. Outcomes are yielded in
//! completion order; one failing file never affects its siblings.

use std::sync::Arc;
use std::time::Duration;

use anvita_api_client::UploadTransport;
use anvita_core::{
    ErrorMetadata, LogLevel, UploadError, UploadRecord, UploadRequest, ValidationError,
    ValidationPolicy,
};
use chrono::Utc;
use futures::stream::{FuturesUnordered, Stream, StreamExt};
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::task::{TaskReport, UploadTask};
use crate::tracker::{TickSchedule, UploadTracker, DIRECT_TICKS, REMOTE_TICKS};

/// How long a completed entry stays in the progress table.
pub const DEFAULT_COMPLETION_GRACE: Duration = Duration::from_millis(1000);

/// Result of one submitted file.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Failed client-side validation; no network call was made and no id issued.
    Rejected {
        file_name: String,
        error: ValidationError,
    },
    /// Stored; the record carries the public read URL.
    Completed(UploadRecord),
    /// Started but did not finish. Resubmit to retry.
    Failed {
        record: UploadRecord,
        error: UploadError,
    },
}

impl UploadOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            UploadOutcome::Rejected { file_name, .. } => file_name,
            UploadOutcome::Completed(record) => &record.file_name,
            UploadOutcome::Failed { record, .. } => &record.file_name,
        }
    }

    pub fn record(&self) -> Option<&UploadRecord> {
        match self {
            UploadOutcome::Rejected { .. } => None,
            UploadOutcome::Completed(record) | UploadOutcome::Failed { record, .. } => {
                Some(record)
            }
        }
    }

    /// Inline message for the file, if it did not complete.
    pub fn error_message(&self) -> Option<String> {
        match self {
            UploadOutcome::Rejected { error, .. } => Some(error.to_string()),
            UploadOutcome::Completed(_) => None,
            UploadOutcome::Failed { error, .. } => Some(error.client_message()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, UploadOutcome::Completed(_))
    }
}

/// Runs batches of uploads against a transport and reports progress through
/// a shared [`UploadTracker`].
pub struct UploadOrchestrator {
    transport: Arc<dyn UploadTransport>,
    tracker: Arc<UploadTracker>,
    policy: ValidationPolicy,
    completion_grace: Duration,
}

impl UploadOrchestrator {
    pub fn new(transport: Arc<dyn UploadTransport>, tracker: Arc<UploadTracker>) -> Self {
        Self {
            transport,
            tracker,
            policy: ValidationPolicy::default(),
            completion_grace: DEFAULT_COMPLETION_GRACE,
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_completion_grace(mut self, grace: Duration) -> Self {
        self.completion_grace = grace;
        self
    }

    pub fn tracker(&self) -> &Arc<UploadTracker> {
        &self.tracker
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Starts every request concurrently and yields one outcome per request,
    /// in completion order.
    ///
    /// Nothing runs until the stream is polled.
    pub fn submit(
        &self,
        requests: Vec<UploadRequest>,
    ) -> impl Stream<Item = UploadOutcome> + '_ {
        requests
            .into_iter()
            .map(|request| self.process(request))
            .collect::<FuturesUnordered<_>>()
    }

    /// Like [`submit`](Self::submit), collected into a `Vec`.
    pub async fn submit_all(&self, requests: Vec<UploadRequest>) -> Vec<UploadOutcome> {
        self.submit(requests).collect().await
    }

    async fn process(&self, mut request: UploadRequest) -> UploadOutcome {
        if let Err(error) =
            self.policy
                .validate_request(&request.file_name, request.size_bytes, &request.mime_type)
        {
            tracing::debug!(
                file_name = %request.file_name,
                error = %error,
                "Upload rejected by validation"
            );
            return UploadOutcome::Rejected {
                file_name: request.file_name,
                error,
            };
        }

        let id = new_upload_id();
        let submitted_at = Utc::now();
        let schedule = if request.source.is_remote() {
            REMOTE_TICKS
        } else {
            DIRECT_TICKS
        };

        tracing::info!(
            upload_id = %id,
            file_name = %request.file_name,
            size_bytes = request.size_bytes,
            mime_type = %request.mime_type,
            "Upload started"
        );
        self.tracker.begin(&id);

        let task = UploadTask::new(&request, self.transport.as_ref(), &self.policy);
        let report = self.run_with_ticks(&id, schedule, task).await;
        // Records carry the size that was actually sent.
        request.size_bytes = report.size_bytes;

        match report.result {
            Ok(stored) => {
                self.tracker.complete(&id);
                self.tracker
                    .schedule_removal(id.clone(), self.completion_grace);
                tracing::info!(
                    upload_id = %id,
                    object_key = %stored.object_key,
                    "Upload completed"
                );
                UploadOutcome::Completed(UploadRecord::completed(
                    id,
                    &request,
                    submitted_at,
                    stored.read_url,
                ))
            }
            Err(error) => {
                self.tracker.remove(&id);
                log_failure(&id, &request.file_name, &error);
                UploadOutcome::Failed {
                    record: UploadRecord::failed(id, &request, submitted_at),
                    error,
                }
            }
        }
    }

    /// Drives `task` while ticking synthetic progress; ticks stop as soon as
    /// the task settles.
    async fn run_with_ticks(
        &self,
        id: &str,
        schedule: TickSchedule,
        task: UploadTask<'_>,
    ) -> TaskReport {
        let run = task.run();
        tokio::pin!(run);

        let mut ticker =
            tokio::time::interval_at(Instant::now() + schedule.interval, schedule.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                report = &mut run => return report,
                _ = ticker.tick() => {
                    self.tracker.tick(id, schedule.step);
                }
            }
        }
    }
}

fn new_upload_id() -> String {
    format!("upload_{}", Uuid::new_v4().simple())
}

fn log_failure(id: &str, file_name: &str, error: &UploadError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(upload_id = %id, file_name = %file_name, error_code = code, error = %error, "Upload failed")
        }
        LogLevel::Warn => {
            tracing::warn!(upload_id = %id, file_name = %file_name, error_code = code, error = %error, "Upload failed")
        }
        LogLevel::Error => {
            tracing::error!(upload_id = %id, file_name = %file_name, error_code = code, error = %error, "Upload failed")
        }
    }
}
