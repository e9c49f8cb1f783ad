use std::collections::VecDeque;

use crate::console::MAX_LOG_ENTRIES;
use crate::view_model::{AppViewModel, JobView, SegmentRowView};
use crate::{
    Article, ChangeEvent, Glossary, JobId, LlmConfig, LogEntry, LogLevel, PromptSet, SegmentId,
    TranslateConfig, TranslationJob,
};

pub const MAX_CHANGE_EVENTS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) article: Article,
    pub(crate) glossary: Glossary,
    pub(crate) translate_config: TranslateConfig,
    pub(crate) llm_config: LlmConfig,
    pub(crate) prompts: PromptSet,
    pub(crate) job: Option<TranslationJob>,
    last_job_id: JobId,
    pub(crate) needs_scope_decision: bool,
    pub(crate) glossary_pending: bool,
    pub(crate) pending_splits: Vec<SegmentId>,
    /// Bumped on every article load; glossary replies carry the value they
    /// were requested under.
    pub(crate) load_generation: u64,
    logs: VecDeque<LogEntry>,
    next_log_seq: u64,
    changes: VecDeque<ChangeEvent>,
    unsaved: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let segments = self
            .article
            .segments()
            .iter()
            .enumerate()
            .map(|(index, segment)| SegmentRowView {
                id: segment.id,
                index,
                src: segment.src.clone(),
                trans: segment.trans.clone(),
                chapter: segment.chapters.clone(),
                translated: segment.is_translated(),
            })
            .collect();
        let job = self.job.as_ref().map(|job| JobView {
            job_id: job.id,
            status: job.status,
            processed: job.processed,
            total: job.total,
            percent: job.progress_percent(),
            failed_batches: job.failed_batches.clone(),
        });
        AppViewModel {
            segments,
            glossary: self.glossary.entries().to_vec(),
            is_translating: self.is_translating(),
            progress_percent: job.as_ref().map_or(0, |job| job.percent),
            job,
            needs_scope_decision: self.needs_scope_decision,
            glossary_pending: self.glossary_pending,
            pending_splits: self.pending_splits.len(),
            logs: self.logs.iter().cloned().collect(),
            unsaved: self.unsaved,
            dirty: self.dirty,
        }
    }

    pub fn article(&self) -> &Article {
        &self.article
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn translate_config(&self) -> &TranslateConfig {
        &self.translate_config
    }

    pub fn llm_config(&self) -> &LlmConfig {
        &self.llm_config
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn job(&self) -> Option<&TranslationJob> {
        self.job.as_ref()
    }

    pub fn is_translating(&self) -> bool {
        self.job.as_ref().is_some_and(TranslationJob::is_running)
    }

    /// True when the engine still owes this state a reply.
    pub fn has_pending_work(&self) -> bool {
        self.is_translating() || self.glossary_pending || !self.pending_splits.is_empty()
    }

    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Returns whether a re-render is needed and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drains the change events recorded since the last call. Only the
    /// newest `MAX_CHANGE_EVENTS` are kept between calls.
    pub fn take_changes(&mut self) -> Vec<ChangeEvent> {
        self.changes.drain(..).collect()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Subscriber for every mutation: records the event and flags unsaved work.
    pub(crate) fn record(&mut self, event: ChangeEvent) {
        self.changes.push_back(event);
        while self.changes.len() > MAX_CHANGE_EVENTS {
            self.changes.pop_front();
        }
        self.unsaved = true;
        self.dirty = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.unsaved = false;
        self.dirty = true;
    }

    pub(crate) fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.next_log_seq += 1;
        self.logs.push_back(LogEntry {
            seq: self.next_log_seq,
            level,
            message: message.into(),
        });
        while self.logs.len() > MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.dirty = true;
    }

    pub(crate) fn clear_logs(&mut self) {
        self.logs.clear();
        self.dirty = true;
    }

    pub(crate) fn next_job_id(&mut self) -> JobId {
        self.last_job_id += 1;
        self.last_job_id
    }

    /// The job with `job_id`, if it is the current one and still running.
    pub(crate) fn running_job_mut(&mut self, job_id: JobId) -> Option<&mut TranslationJob> {
        self.job
            .as_mut()
            .filter(|job| job.id == job_id && job.is_running())
    }
}
