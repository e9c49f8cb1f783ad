use std::sync::Arc;
use std::time::Duration;

use bitrans_core::{
    progress_percent, prompt, protocol, Batch, BatchFailure, Glossary, JobId, JobReport, JobStatus,
    TranslatedSegment, TranslationRequest,
};
use engine_logging::{engine_debug, engine_job};
use log::Level;
use tokio_util::sync::CancellationToken;

use crate::llm::{CompletionRequest, LlmClient};
use crate::retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
use crate::{AttemptError, EngineEvent, JobProgress};

/// Receives engine events as they happen.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

enum Delivery {
    Translated(Vec<String>),
    Exhausted { attempts: u32, last_error: AttemptError },
    Cancelled,
}

/// Drives one translation job: batches strictly in order, one request at a
/// time, bounded retries per batch.
pub struct TranslationOrchestrator {
    client: Arc<dyn LlmClient>,
    sleeper: Arc<dyn Sleeper>,
    backoff: Backoff,
}

impl TranslationOrchestrator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            sleeper: Arc::new(TokioSleeper),
            backoff: Backoff::default(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Runs the job to completion or cancellation.
    ///
    /// A batch that exhausts its retries is reported and skipped; only
    /// cancellation ends the job early. Cancellation is observed before each
    /// batch and at every suspension point, after which nothing is emitted
    /// except the final report.
    pub async fn run(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
        sink: &dyn EventSink,
    ) -> JobReport {
        let job_id = request.job_id;
        let total = request.total_segments();
        let config = &request.translate_config;
        let policy = RetryPolicy::for_config(config, self.backoff);
        let timeout = Duration::from_secs(config.timeout_threshold);
        let glossary = Glossary::new(request.glossary.clone());
        let mut report = JobReport {
            job_id,
            status: JobStatus::Running,
            processed: 0,
            total,
            translated_batches: 0,
            failures: Vec::new(),
        };
        engine_job!(
            Level::Info,
            job_id,
            "started: {} segments in {} batches, {} attempts per batch",
            total,
            request.batches.len(),
            policy.max_attempts
        );

        for (batch_index, batch) in request.batches.iter().enumerate() {
            if cancel.is_cancelled() {
                return finish(report, JobStatus::Stopped, sink);
            }
            let messages =
                prompt::translation_messages(&request.prompts, config, &glossary, batch);
            let completion = CompletionRequest::new(&request.llm_config, messages, timeout);

            match self
                .deliver(job_id, batch_index, batch, &completion, policy, cancel)
                .await
            {
                Delivery::Cancelled => return finish(report, JobStatus::Stopped, sink),
                Delivery::Translated(parts) => {
                    let translations = batch
                        .items
                        .iter()
                        .zip(parts)
                        .map(|(item, text)| TranslatedSegment {
                            original_index: item.original_index,
                            segment_id: item.segment_id,
                            text,
                        })
                        .collect();
                    sink.emit(EngineEvent::BatchTranslated {
                        job_id,
                        batch_index,
                        translations,
                    });
                    report.translated_batches += 1;
                }
                Delivery::Exhausted {
                    attempts,
                    last_error,
                } => {
                    engine_job!(
                        Level::Error,
                        job_id,
                        "batch {} failed after {} attempts: {}",
                        batch_index,
                        attempts,
                        last_error
                    );
                    let failure = BatchFailure {
                        batch_index,
                        attempts,
                        last_error: last_error.to_string(),
                    };
                    sink.emit(EngineEvent::BatchFailed {
                        job_id,
                        failure: failure.clone(),
                    });
                    report.failures.push(failure);
                }
            }

            report.processed += batch.len();
            sink.emit(EngineEvent::Progress(JobProgress {
                job_id,
                processed: report.processed,
                total,
                percent: progress_percent(report.processed, total),
            }));
        }

        finish(report, JobStatus::Completed, sink)
    }

    async fn deliver(
        &self,
        job_id: JobId,
        batch_index: usize,
        batch: &Batch,
        request: &CompletionRequest,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Delivery {
        let mut attempt = 1;
        loop {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Delivery::Cancelled,
                outcome = self.attempt(request, batch.len()) => outcome,
            };
            if cancel.is_cancelled() {
                return Delivery::Cancelled;
            }
            let err = match outcome {
                Ok(parts) => return Delivery::Translated(parts),
                Err(err) => err,
            };
            engine_job!(
                Level::Warn,
                job_id,
                "batch {} attempt {}/{} failed: {}",
                batch_index,
                attempt,
                policy.max_attempts,
                err
            );
            if attempt >= policy.max_attempts || !err.is_retryable() {
                return Delivery::Exhausted {
                    attempts: attempt,
                    last_error: err,
                };
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Delivery::Cancelled,
                _ = self.sleeper.sleep(policy.delay_after(attempt)) => {}
            }
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        request: &CompletionRequest,
        expected: usize,
    ) -> Result<Vec<String>, AttemptError> {
        let completion = self.client.complete(request).await?;
        protocol::parse_parts(&completion.text, expected).map_err(|err| {
            engine_debug!(
                "unparseable batch response ({} chars): {}",
                completion.raw_body.len(),
                err
            );
            AttemptError::from(err)
        })
    }
}

fn finish(mut report: JobReport, status: JobStatus, sink: &dyn EventSink) -> JobReport {
    report.status = status;
    engine_job!(
        Level::Info,
        report.job_id,
        "{:?}: {}/{} segments processed, {} batches translated, {} failed",
        status,
        report.processed,
        report.total,
        report.translated_batches,
        report.failures.len()
    );
    sink.emit(EngineEvent::JobFinished(report.clone()));
    report
}
