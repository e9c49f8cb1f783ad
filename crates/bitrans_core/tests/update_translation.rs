use bitrans_core::{
    update, AppState, BatchFailure, Effect, JobReport, JobStatus, LogLevel, Msg, Segment,
    TranslateConfig, TranslatedSegment, TranslationRequest, TranslationScope,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn loaded(pairs: &[(&str, &str)]) -> AppState {
    let segments = pairs
        .iter()
        .map(|(src, trans)| Segment::new(*src, *trans))
        .collect();
    let (state, _) = update(AppState::new(), Msg::ArticleLoaded(segments));
    state
}

fn start(state: AppState, scope: Option<TranslationScope>) -> (AppState, TranslationRequest) {
    let (state, effects) = update(state, Msg::StartTranslationClicked { scope });
    let request = effects
        .into_iter()
        .find_map(|effect| match effect {
            Effect::StartTranslation(request) => Some(*request),
            _ => None,
        })
        .expect("start effect");
    (state, request)
}

fn results(request: &TranslationRequest, batch_index: usize) -> Vec<TranslatedSegment> {
    request.batches[batch_index]
        .items
        .iter()
        .map(|item| TranslatedSegment {
            original_index: item.original_index,
            segment_id: item.segment_id,
            text: format!("T({})", item.source_text),
        })
        .collect()
}

fn small_batches(state: AppState) -> AppState {
    let config = TranslateConfig {
        max_text_length: 2,
        ..TranslateConfig::default()
    };
    update(state, Msg::TranslateConfigChanged(config)).0
}

#[test]
fn start_snapshots_config_and_emits_request() {
    init_logging();
    let state = loaded(&[("A", ""), ("B", "")]);
    let (state, request) = start(state, None);

    assert_eq!(request.job_id, 1);
    assert_eq!(request.batches.len(), 1);
    assert_eq!(request.total_segments(), 2);
    assert_eq!(request.translate_config, TranslateConfig::default());
    let view = state.view();
    assert!(view.is_translating);
    assert_eq!(view.progress_percent, 0);
}

#[test]
fn batch_results_are_written_and_progress_tracked() {
    init_logging();
    let state = small_batches(loaded(&[("aa", ""), ("bb", ""), ("cc", "")]));
    let (state, request) = start(state, None);
    assert_eq!(request.batches.len(), 3);

    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: request.job_id,
            batch_index: 0,
            translations: results(&request, 0),
        },
    );
    let (state, _) = update(
        state,
        Msg::TranslationProgress {
            job_id: request.job_id,
            processed: 1,
            total: 3,
        },
    );

    let view = state.view();
    assert_eq!(view.segments[0].trans, "T(aa)");
    assert_eq!(view.segments[1].trans, "");
    assert_eq!(view.progress_percent, 33);
    assert!(view.unsaved);
}

#[test]
fn partial_translation_requires_scope_decision() {
    init_logging();
    let state = loaded(&[("a", "x"), ("b", "")]);
    let (state, effects) = update(state, Msg::StartTranslationClicked { scope: None });

    assert!(effects.is_empty());
    assert!(state.view().needs_scope_decision);
    assert!(!state.view().is_translating);

    let (state, request) = start(state, Some(TranslationScope::UntranslatedOnly));
    assert!(!state.view().needs_scope_decision);
    let indices: Vec<usize> = request.batches[0]
        .items
        .iter()
        .map(|item| item.original_index)
        .collect();
    assert_eq!(indices, vec![1]);

    let (_state, request) = start(
        loaded(&[("a", "x"), ("b", "")]),
        Some(TranslationScope::All),
    );
    assert_eq!(request.total_segments(), 2);
}

#[test]
fn nothing_to_translate_completes_immediately() {
    init_logging();
    let state = loaded(&[("", ""), ("  ", "")]);
    let (state, effects) = update(state, Msg::StartTranslationClicked { scope: None });

    assert!(effects.is_empty());
    let job = state.job().expect("job");
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress_percent(), 0);
    assert!(state
        .logs()
        .all(|entry| entry.level != LogLevel::Error));
}

#[test]
fn invalid_max_length_halts_before_any_request() {
    init_logging();
    let state = loaded(&[("a", "")]);
    let config = TranslateConfig {
        max_text_length: 0,
        ..TranslateConfig::default()
    };
    let (state, _) = update(state, Msg::TranslateConfigChanged(config));
    let (state, effects) = update(state, Msg::StartTranslationClicked { scope: None });

    assert!(effects.is_empty());
    assert!(state.job().is_none());
    assert!(state.logs().any(|entry| entry.level == LogLevel::Error));
}

#[test]
fn stop_cancels_and_blocks_later_writes() {
    init_logging();
    let state = small_batches(loaded(&[("aa", ""), ("bb", ""), ("cc", "keep")]));
    let (state, request) = start(state, Some(TranslationScope::All));

    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: request.job_id,
            batch_index: 0,
            translations: results(&request, 0),
        },
    );
    let (state, effects) = update(state, Msg::StopTranslationClicked);
    assert_eq!(
        effects,
        vec![Effect::CancelTranslation {
            job_id: request.job_id
        }]
    );

    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: request.job_id,
            batch_index: 1,
            translations: results(&request, 1),
        },
    );
    let (state, _) = update(
        state,
        Msg::TranslationFinished(JobReport {
            job_id: request.job_id,
            status: JobStatus::Stopped,
            processed: 1,
            total: 3,
            translated_batches: 1,
            failures: Vec::new(),
        }),
    );

    let view = state.view();
    assert_eq!(view.segments[0].trans, "T(aa)");
    assert_eq!(view.segments[1].trans, "");
    assert_eq!(view.segments[2].trans, "keep");
    assert_eq!(state.job().unwrap().status, JobStatus::Stopped);
    assert!(state
        .logs()
        .last()
        .is_some_and(|entry| entry.message.contains("stopped")));
}

#[test]
fn failed_batches_are_reported_at_completion() {
    init_logging();
    let state = small_batches(loaded(&[("aa", ""), ("bb", "")]));
    let (state, request) = start(state, None);
    let failure = BatchFailure {
        batch_index: 0,
        attempts: 17,
        last_error: "expected 1 marked parts, got 2".to_string(),
    };

    let (state, _) = update(
        state,
        Msg::BatchFailed {
            job_id: request.job_id,
            failure: failure.clone(),
        },
    );
    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: request.job_id,
            batch_index: 1,
            translations: results(&request, 1),
        },
    );
    let (state, _) = update(
        state,
        Msg::TranslationFinished(JobReport {
            job_id: request.job_id,
            status: JobStatus::Completed,
            processed: 2,
            total: 2,
            translated_batches: 1,
            failures: vec![failure],
        }),
    );

    let job = state.job().unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.failed_batches, vec![0]);
    let last = state.logs().last().unwrap();
    assert_eq!(last.level, LogLevel::Warn);
    assert!(last.message.contains("1 of 2 batches failed: 1"));
    assert_eq!(state.view().segments[1].trans, "T(bb)");
}

#[test]
fn events_from_a_superseded_job_are_ignored() {
    init_logging();
    let state = loaded(&[("a", "")]);
    let (state, first) = start(state, None);
    let (state, _) = update(state, Msg::StopTranslationClicked);
    let (state, _) = update(
        state,
        Msg::TranslationFinished(JobReport {
            job_id: first.job_id,
            status: JobStatus::Stopped,
            processed: 0,
            total: 1,
            translated_batches: 0,
            failures: Vec::new(),
        }),
    );
    let (state, second) = start(state, None);
    assert_eq!(second.job_id, first.job_id + 1);

    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: first.job_id,
            batch_index: 0,
            translations: results(&first, 0),
        },
    );
    assert_eq!(state.view().segments[0].trans, "");
    assert!(state.view().is_translating);
}

#[test]
fn translations_follow_segments_moved_by_edits() {
    init_logging();
    let state = loaded(&[("a", ""), ("b", ""), ("c", "")]);
    let (state, request) = start(state, None);
    let (state, _) = update(state, Msg::Delete { index: 0 });

    let (state, _) = update(
        state,
        Msg::BatchTranslated {
            job_id: request.job_id,
            batch_index: 0,
            translations: results(&request, 0),
        },
    );

    let trans: Vec<String> = state.view().segments.into_iter().map(|s| s.trans).collect();
    assert_eq!(trans, vec!["T(b)", "T(c)"]);
    assert!(state
        .logs()
        .any(|entry| entry.message.contains("no longer exists")));
}

#[test]
fn second_start_while_running_is_refused() {
    init_logging();
    let state = loaded(&[("a", "")]);
    let (state, _) = start(state, None);
    let (state, effects) = update(state, Msg::StartTranslationClicked { scope: None });

    assert!(effects.is_empty());
    assert_eq!(state.job().unwrap().id, 1);
}
