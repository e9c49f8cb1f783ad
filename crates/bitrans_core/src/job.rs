use crate::{Batch, GlossaryEntry, LlmConfig, PromptSet, SegmentId, TranslateConfig};

pub type JobId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
    Completed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// Bookkeeping for the one job the state tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub id: JobId,
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    pub batch_count: usize,
    pub failed_batches: Vec<usize>,
}

impl TranslationJob {
    pub fn new(id: JobId, total: usize, batch_count: usize) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            processed: 0,
            total,
            batch_count,
            failed_batches: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.processed, self.total)
    }
}

/// `processed / total` as a rounded percentage; 0 when there is nothing to do.
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let processed = processed.min(total);
    ((processed * 100 + total / 2) / total) as u8
}

/// Snapshot handed to the orchestrator when a job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub job_id: JobId,
    pub batches: Vec<Batch>,
    pub translate_config: TranslateConfig,
    pub llm_config: LlmConfig,
    pub prompts: PromptSet,
    pub glossary: Vec<GlossaryEntry>,
}

impl TranslationRequest {
    pub fn total_segments(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// One parsed result, addressed the same way as its batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedSegment {
    pub original_index: usize,
    pub segment_id: SegmentId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub attempts: u32,
    pub last_error: String,
}

/// Final account of a job, emitted once when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    pub translated_batches: usize,
    pub failures: Vec<BatchFailure>,
}
