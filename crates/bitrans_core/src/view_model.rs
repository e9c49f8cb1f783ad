use crate::{GlossaryEntry, JobId, JobStatus, LogEntry, SegmentId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub segments: Vec<SegmentRowView>,
    pub glossary: Vec<GlossaryEntry>,
    pub job: Option<JobView>,
    pub is_translating: bool,
    pub progress_percent: u8,
    /// The last Translate click needs a retranslate-all/untranslated-only answer.
    pub needs_scope_decision: bool,
    pub glossary_pending: bool,
    pub pending_splits: usize,
    pub logs: Vec<LogEntry>,
    pub unsaved: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRowView {
    pub id: SegmentId,
    pub index: usize,
    pub src: String,
    pub trans: String,
    pub chapter: Option<String>,
    pub translated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
    pub failed_batches: Vec<usize>,
}
