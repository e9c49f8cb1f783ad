use engine_logging::engine_debug;

use crate::glossary::{source_excerpt, EXTRACTION_CHAR_BUDGET};
use crate::{
    batch, BatchFailure, ChangeEvent, Effect, GlossaryEntry, GlossaryRequest, JobId,
    JobReport, JobStatus, LogLevel, Msg, SplitMethod, SplitOutcome, SplitRequest, SplitSide,
    TranslatedSegment, TranslationJob, TranslationRequest, TranslationScope, TranslationStatus,
};
use crate::{split, AppState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ArticleLoaded(segments) => {
            let effects = supersede_running_job(&mut state);
            state.article.replace_segments(segments);
            state.load_generation += 1;
            state.needs_scope_decision = false;
            state.pending_splits.clear();
            state.glossary_pending = false;
            let len = state.article.len();
            state.record(ChangeEvent::ArticleReplaced { len });
            state.mark_saved();
            state.log(LogLevel::Info, format!("Loaded article with {len} segments."));
            effects
        }
        Msg::GlossaryLoaded(entries) => {
            state.glossary = crate::Glossary::new(entries);
            let len = state.glossary.len();
            state.record(ChangeEvent::GlossaryChanged { len });
            state.mark_saved();
            Vec::new()
        }
        Msg::TranslateConfigChanged(config) => {
            if state.translate_config != config {
                state.translate_config = config;
                state.record(ChangeEvent::SettingsChanged);
            }
            Vec::new()
        }
        Msg::LlmConfigChanged(config) => {
            if state.llm_config != config {
                state.llm_config = config;
                state.record(ChangeEvent::SettingsChanged);
            }
            Vec::new()
        }
        Msg::PromptsChanged(prompts) => {
            if state.prompts != prompts {
                state.prompts = prompts;
                state.record(ChangeEvent::SettingsChanged);
            }
            Vec::new()
        }
        Msg::ProjectSaved => {
            state.mark_saved();
            state.log(LogLevel::Success, "Project saved.");
            Vec::new()
        }

        Msg::EditOriginal { index, text } => {
            let event = state.article.edit_original(index, text);
            apply_edit(&mut state, event, None);
            Vec::new()
        }
        Msg::EditTranslated { index, text } => {
            let event = state.article.edit_translated(index, text);
            apply_edit(&mut state, event, None);
            Vec::new()
        }
        Msg::MergeUp { index } => {
            let event = state.article.merge_up(index);
            apply_edit(&mut state, event, Some(format!("Merged segment {index} up.")));
            Vec::new()
        }
        Msg::MergeDown { index } => {
            let event = state.article.merge_down(index);
            apply_edit(&mut state, event, Some(format!("Merged segment {index} down.")));
            Vec::new()
        }
        Msg::InsertBelow { index } => {
            let event = state.article.insert_below(index);
            let message = format!("Inserted empty segment below {index}.");
            apply_edit(&mut state, event, Some(message));
            Vec::new()
        }
        Msg::Delete { index } => {
            if state.article.len() <= 1 {
                state.log(LogLevel::Warn, "Cannot delete the last segment.");
                return (state, Vec::new());
            }
            let event = state.article.delete(index);
            apply_edit(&mut state, event, Some(format!("Deleted segment {index}.")));
            Vec::new()
        }
        Msg::MarkChapter { index } => {
            let event = state.article.mark_chapter(index);
            let message = format!("Marked segment {index} as chapter start.");
            apply_edit(&mut state, event, Some(message));
            Vec::new()
        }
        Msg::UnmarkChapter { index } => {
            let event = state.article.unmark_chapter(index);
            let message = format!("Unmarked chapter start for segment {index}.");
            apply_edit(&mut state, event, Some(message));
            Vec::new()
        }

        Msg::SplitRequested {
            index,
            side,
            position,
        } => request_split(&mut state, index, side, position),
        Msg::SplitResolved(outcome) => {
            resolve_split(&mut state, outcome);
            Vec::new()
        }

        Msg::StartTranslationClicked { scope } => start_translation(&mut state, scope),
        Msg::StopTranslationClicked => match state.job.as_mut().filter(|job| job.is_running()) {
            Some(job) => {
                job.status = JobStatus::Stopped;
                let job_id = job.id;
                state.log(LogLevel::Warn, format!("Stopping translation job {job_id}."));
                vec![Effect::CancelTranslation { job_id }]
            }
            None => Vec::new(),
        },
        Msg::BatchTranslated {
            job_id,
            batch_index,
            translations,
        } => {
            apply_batch(&mut state, job_id, batch_index, translations);
            Vec::new()
        }
        Msg::BatchFailed { job_id, failure } => {
            apply_batch_failure(&mut state, job_id, failure);
            Vec::new()
        }
        Msg::TranslationProgress {
            job_id,
            processed,
            total,
        } => {
            if let Some(job) = state.running_job_mut(job_id) {
                job.processed = processed;
                job.total = total;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TranslationFinished(report) => {
            finish_job(&mut state, report);
            Vec::new()
        }

        Msg::BuildGlossaryClicked => request_glossary(&mut state),
        Msg::GlossaryExtracted {
            generation,
            entries,
        } => {
            if generation != state.load_generation {
                state.log(
                    LogLevel::Warn,
                    "Glossary terms for a previously loaded article discarded.",
                );
                return (state, Vec::new());
            }
            state.glossary_pending = false;
            let added = state.glossary.merge_unique(entries);
            if added > 0 {
                let len = state.glossary.len();
                state.record(ChangeEvent::GlossaryChanged { len });
                state.log(
                    LogLevel::Success,
                    format!("Added {added} new terms from LLM."),
                );
            } else {
                state.log(
                    LogLevel::Info,
                    "LLM extracted terms, but no new unique terms found.",
                );
            }
            Vec::new()
        }
        Msg::GlossaryExtractionFailed { generation, error } => {
            if generation != state.load_generation {
                engine_debug!("ignoring glossary failure of load {}: {}", generation, error);
                return (state, Vec::new());
            }
            state.glossary_pending = false;
            state.log(LogLevel::Error, format!("Glossary extraction error: {error}"));
            Vec::new()
        }
        Msg::AddGlossaryEntry(entry) => {
            add_glossary_entry(&mut state, entry);
            Vec::new()
        }
        Msg::EditGlossaryEntry { index, entry } => {
            if state.glossary.replace(index, entry) {
                let len = state.glossary.len();
                state.record(ChangeEvent::GlossaryChanged { len });
            }
            Vec::new()
        }
        Msg::DeleteGlossaryEntry { index } => {
            if state.glossary.remove(index).is_some() {
                let len = state.glossary.len();
                state.record(ChangeEvent::GlossaryChanged { len });
            }
            Vec::new()
        }

        Msg::ClearLogs => {
            state.clear_logs();
            state.log(LogLevel::Detail, "Console cleared.");
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn apply_edit(state: &mut AppState, event: Option<ChangeEvent>, message: Option<String>) {
    if let Some(event) = event {
        state.record(event);
        if let Some(message) = message {
            state.log(LogLevel::Action, message);
        }
    }
}

// A new article makes any running job's indices meaningless.
fn supersede_running_job(state: &mut AppState) -> Vec<Effect> {
    match state.job.as_mut().filter(|job| job.is_running()) {
        Some(job) => {
            job.status = JobStatus::Stopped;
            vec![Effect::CancelTranslation { job_id: job.id }]
        }
        None => Vec::new(),
    }
}

fn start_translation(state: &mut AppState, scope: Option<TranslationScope>) -> Vec<Effect> {
    if state.is_translating() {
        state.log(LogLevel::Warn, "A translation job is already running.");
        return Vec::new();
    }

    let scope = match (state.article.translation_status(), scope) {
        (TranslationStatus::PartiallyTranslated { translated, total }, None) => {
            state.needs_scope_decision = true;
            state.log(
                LogLevel::Warn,
                format!(
                    "{translated} of {total} segments are already translated. \
                     Choose to retranslate all segments or only untranslated ones."
                ),
            );
            return Vec::new();
        }
        (_, Some(scope)) => scope,
        (_, None) => TranslationScope::All,
    };
    state.needs_scope_decision = false;

    // Configuration is snapshotted here; later edits only affect the next job.
    let config = state.translate_config.clone();
    let batches = match batch::pack_filtered(
        state.article.segments(),
        config.max_text_length,
        |segment| scope.includes(segment),
    ) {
        Ok(batches) => batches,
        Err(err) => {
            state.log(LogLevel::Error, format!("Cannot start translation: {err}"));
            return Vec::new();
        }
    };

    let job_id = state.next_job_id();
    let request = TranslationRequest {
        job_id,
        batches,
        translate_config: config,
        llm_config: state.llm_config.clone(),
        prompts: state.prompts.clone(),
        glossary: state.glossary.entries().to_vec(),
    };
    let total = request.total_segments();
    let batch_count = request.batches.len();
    let mut job = TranslationJob::new(job_id, total, batch_count);

    if batch_count == 0 {
        job.status = JobStatus::Completed;
        state.job = Some(job);
        state.log(
            LogLevel::Info,
            format!("Translation job {job_id}: nothing to translate."),
        );
        return Vec::new();
    }

    state.job = Some(job);
    state.log(
        LogLevel::Info,
        format!("Starting translation job {job_id}: {total} segments in {batch_count} batches."),
    );
    vec![Effect::StartTranslation(Box::new(request))]
}

fn apply_batch(
    state: &mut AppState,
    job_id: JobId,
    batch_index: usize,
    translations: Vec<TranslatedSegment>,
) {
    let Some(batch_count) = state.running_job_mut(job_id).map(|job| job.batch_count) else {
        engine_debug!("ignoring batch {} of inactive job {}", batch_index, job_id);
        return;
    };
    let count = translations.len();
    for translation in translations {
        let TranslatedSegment {
            original_index,
            segment_id,
            text,
        } = translation;
        match state.article.write_translation(original_index, segment_id, text) {
            Some(event) => state.record(event),
            None => state.log(
                LogLevel::Warn,
                format!("Segment {original_index} no longer exists; translation dropped."),
            ),
        }
    }
    state.log(
        LogLevel::Success,
        format!(
            "Batch {}/{} translated ({} segments).",
            batch_index + 1,
            batch_count,
            count
        ),
    );
}

fn apply_batch_failure(state: &mut AppState, job_id: JobId, failure: BatchFailure) {
    let Some(job) = state.running_job_mut(job_id) else {
        engine_debug!("ignoring failure of inactive job {}", job_id);
        return;
    };
    job.failed_batches.push(failure.batch_index);
    let batch_count = job.batch_count;
    state.log(
        LogLevel::Error,
        format!(
            "Batch {}/{} failed after {} attempts: {}",
            failure.batch_index + 1,
            batch_count,
            failure.attempts,
            failure.last_error
        ),
    );
}

fn finish_job(state: &mut AppState, report: JobReport) {
    let Some(job) = state.job.as_mut().filter(|job| job.id == report.job_id) else {
        engine_debug!("ignoring report of superseded job {}", report.job_id);
        return;
    };
    if job.is_running() {
        job.status = report.status;
        job.processed = report.processed;
    }
    let status = job.status;
    let job_id = job.id;
    let batch_count = job.batch_count;

    let (level, message) = match status {
        JobStatus::Completed if report.failures.is_empty() => (
            LogLevel::Success,
            format!("Translation job {job_id} completed: all {batch_count} batches translated."),
        ),
        JobStatus::Completed => {
            let failed = report
                .failures
                .iter()
                .map(|failure| (failure.batch_index + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            (
                LogLevel::Warn,
                format!(
                    "Translation job {job_id} completed with {} of {batch_count} batches failed: {failed}.",
                    report.failures.len()
                ),
            )
        }
        JobStatus::Stopped | JobStatus::Running => (
            LogLevel::Warn,
            format!(
                "Translation job {job_id} stopped: {}/{} segments processed.",
                report.processed, report.total
            ),
        ),
    };
    state.log(level, message);
}

fn request_split(
    state: &mut AppState,
    index: usize,
    side: SplitSide,
    position: usize,
) -> Vec<Effect> {
    let Some(segment) = state.article.get(index).cloned() else {
        return Vec::new();
    };
    if state.pending_splits.contains(&segment.id) {
        state.log(
            LogLevel::Warn,
            format!("Segment {index} is already being split."),
        );
        return Vec::new();
    }
    let request = SplitRequest {
        segment_index: index,
        segment,
        side,
        position,
        translate_config: state.translate_config.clone(),
        llm_config: state.llm_config.clone(),
        prompts: state.prompts.clone(),
    };

    if !request.needs_llm() {
        state.log(LogLevel::Detail, "Secondary text empty, local split.");
        let halves = split::proportional_split(&request.segment, side, position);
        if let Some(event) = state
            .article
            .apply_split(index, request.segment.id, halves)
        {
            state.record(event);
        }
        return Vec::new();
    }

    state.pending_splits.push(request.segment.id);
    state.log(
        LogLevel::Info,
        format!("Requesting LLM assistance for splitting segment {index} ({side:?} side)."),
    );
    vec![Effect::SplitSegment(Box::new(request))]
}

fn resolve_split(state: &mut AppState, outcome: SplitOutcome) {
    state.pending_splits.retain(|id| *id != outcome.segment_id);
    let segment_index = outcome.segment_index;
    let Some(index) = state
        .article
        .resolve(segment_index, outcome.segment_id)
    else {
        state.log(
            LogLevel::Warn,
            format!("Segment {segment_index} no longer exists; split discarded."),
        );
        return;
    };
    if !state
        .article
        .get(index)
        .is_some_and(|segment| outcome.computed_from(segment))
    {
        state.log(
            LogLevel::Warn,
            format!("Segment {index} changed while splitting; split discarded."),
        );
        return;
    }

    let SplitOutcome {
        segment_id,
        halves,
        method,
        ..
    } = outcome;
    if let Some(event) = state.article.apply_split(index, segment_id, halves) {
        state.record(event);
        match method {
            SplitMethod::Llm => {
                state.log(LogLevel::Success, format!("Segment {index} split with LLM."))
            }
            SplitMethod::Proportional => state.log(
                LogLevel::Warn,
                format!("Segment {index} split locally (LLM fallback)."),
            ),
        }
    }
}

fn request_glossary(state: &mut AppState) -> Vec<Effect> {
    if !state.article.segments().iter().any(|s| s.has_source()) {
        state.log(LogLevel::Warn, "Cannot build glossary: No article.");
        return Vec::new();
    }
    if state.glossary_pending {
        state.log(LogLevel::Warn, "Glossary extraction already running.");
        return Vec::new();
    }
    state.glossary_pending = true;
    state.log(LogLevel::Info, "Starting LLM glossary extraction...");
    let request = GlossaryRequest {
        generation: state.load_generation,
        source_text: source_excerpt(state.article.segments(), EXTRACTION_CHAR_BUDGET),
        translate_config: state.translate_config.clone(),
        llm_config: state.llm_config.clone(),
        prompts: state.prompts.clone(),
    };
    vec![Effect::ExtractGlossary(Box::new(request))]
}

fn add_glossary_entry(state: &mut AppState, entry: GlossaryEntry) {
    if entry.original.trim().is_empty() {
        return;
    }
    if state.glossary.contains_original(&entry.original) {
        state.log(
            LogLevel::Warn,
            format!("Glossary already contains '{}'.", entry.original),
        );
        return;
    }
    state.glossary.push(entry);
    let len = state.glossary.len();
    state.record(ChangeEvent::GlossaryChanged { len });
}
