use std::time::Duration;

use bitrans_core::{
    BatchFailure, GlossaryEntry, JobId, JobReport, ProtocolError, SplitOutcome, TranslatedSegment,
};
use thiserror::Error;

/// Failure of a single chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("invalid endpoint {0}")]
    InvalidEndpoint(String),
    #[error("request timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("network error: {0}")]
    Transport(String),
    #[error("api error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Failure of one delivery attempt of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("segment count mismatch: expected {expected}, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },
}

impl AttemptError {
    /// A bad endpoint fails the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptError::Llm(LlmError::InvalidEndpoint(_)))
    }
}

impl From<ProtocolError> for AttemptError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::SegmentCountMismatch { expected, actual } => {
                AttemptError::SegmentCountMismatch { expected, actual }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    BatchTranslated {
        job_id: JobId,
        batch_index: usize,
        translations: Vec<TranslatedSegment>,
    },
    BatchFailed {
        job_id: JobId,
        failure: BatchFailure,
    },
    JobFinished(JobReport),
    SplitFinished(SplitOutcome),
    GlossaryFinished {
        generation: u64,
        result: Result<Vec<GlossaryEntry>, String>,
    },
}

/// The engine thread is gone; no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread stopped")]
pub struct EngineStopped;
