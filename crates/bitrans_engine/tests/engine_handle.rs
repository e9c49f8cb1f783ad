mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bitrans_core::{
    GlossaryRequest, JobReport, JobStatus, LlmConfig, PromptSet, Segment, SplitMethod,
    SplitRequest, SplitSide, TranslateConfig,
};
use bitrans_engine::{EngineEvent, EngineHandle, EngineStopped};
use common::{article, translation_request, RecordingSleeper, ScriptedClient};

fn wait_for<T>(engine: &EngineHandle, mut pick: impl FnMut(EngineEvent) -> Option<T>) -> T {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        let event = engine
            .recv_timeout(Duration::from_millis(50))
            .expect("engine stopped");
        if let Some(found) = event.and_then(&mut pick) {
            return found;
        }
    }
    panic!("engine event not received in time");
}

fn finished(event: EngineEvent) -> Option<JobReport> {
    match event {
        EngineEvent::JobFinished(report) => Some(report),
        _ => None,
    }
}

#[test]
fn translate_runs_job_to_completion() {
    engine_logging::initialize_for_tests();
    let client = ScriptedClient::with_fallback(Vec::new(), Ok("-> done".into()));
    let engine = EngineHandle::with_client(client.clone(), Arc::new(RecordingSleeper::default()));

    engine.translate(translation_request(1, &article(&["A", "B"]), 1, 0));
    let report = wait_for(&engine, finished);

    assert_eq!(report.job_id, 1);
    assert_eq!(report.status, JobStatus::Completed);
    assert_eq!(report.translated_batches, 2);
    assert_eq!(client.calls(), 2);
}

#[test]
fn cancel_stops_a_failing_job() {
    engine_logging::initialize_for_tests();
    // Every attempt fails and the real sleeper waits between attempts, so the
    // job is still in its first batch when the cancel arrives.
    let client = ScriptedClient::new(Vec::new());
    let engine = EngineHandle::with_client(client, Arc::new(bitrans_engine::TokioSleeper));

    engine.translate(translation_request(4, &article(&["A", "B"]), 1, 16));
    std::thread::sleep(Duration::from_millis(100));
    engine.cancel(4);
    let report = wait_for(&engine, finished);

    assert_eq!(report.status, JobStatus::Stopped);
    assert_eq!(report.processed, 0);
}

#[test]
fn new_job_supersedes_the_running_one() {
    engine_logging::initialize_for_tests();
    let client = ScriptedClient::new(Vec::new());
    let engine = EngineHandle::with_client(client, Arc::new(bitrans_engine::TokioSleeper));

    engine.translate(translation_request(1, &article(&["A"]), 10, 16));
    std::thread::sleep(Duration::from_millis(100));
    engine.translate(translation_request(2, &article(&["B"]), 10, 16));

    let first = wait_for(&engine, finished);
    assert_eq!(first.job_id, 1);
    assert_eq!(first.status, JobStatus::Stopped);
    engine.cancel(2);
    let second = wait_for(&engine, finished);
    assert_eq!(second.job_id, 2);
    assert_eq!(second.status, JobStatus::Stopped);
}

#[test]
fn split_and_glossary_report_back() {
    engine_logging::initialize_for_tests();
    let client = ScriptedClient::new(vec![Ok(r#"[["猫","cat","animal"]]"#.into())]);
    let engine = EngineHandle::with_client(client.clone(), Arc::new(RecordingSleeper::default()));

    engine.split(SplitRequest {
        segment_index: 0,
        segment: Segment::new("ab", ""),
        side: SplitSide::Original,
        position: 1,
        translate_config: TranslateConfig::default(),
        llm_config: LlmConfig::default(),
        prompts: PromptSet::default(),
    });
    let outcome = wait_for(&engine, |event| match event {
        EngineEvent::SplitFinished(outcome) => Some(outcome),
        _ => None,
    });
    assert_eq!(outcome.method, SplitMethod::Proportional);

    engine.extract_glossary(GlossaryRequest {
        generation: 7,
        source_text: "猫".to_string(),
        translate_config: TranslateConfig::default(),
        llm_config: LlmConfig::default(),
        prompts: PromptSet::default(),
    });
    let (generation, result) = wait_for(&engine, |event| match event {
        EngineEvent::GlossaryFinished { generation, result } => Some((generation, result)),
        _ => None,
    });
    assert_eq!(generation, 7);
    assert_eq!(result.unwrap().len(), 1);
    assert_eq!(client.calls(), 1);
}

#[test]
fn stopped_engine_is_reported_instead_of_timing_out() {
    engine_logging::initialize_for_tests();
    let client = ScriptedClient::new(Vec::new());
    let engine = EngineHandle::with_client(client, Arc::new(bitrans_engine::TokioSleeper));

    engine.translate(translation_request(1, &article(&["A"]), 10, 16));
    engine.shutdown();

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match engine.recv_timeout(Duration::from_millis(50)) {
            Err(stopped) => {
                assert_eq!(stopped, EngineStopped);
                break;
            }
            Ok(_) if Instant::now() < deadline => {}
            Ok(_) => panic!("engine did not stop"),
        }
    }
    assert_eq!(engine.recv_timeout(Duration::ZERO), Err(EngineStopped));
}
