use std::time::Duration;

use bitrans_core::{Effect, Msg};
use bitrans_engine::{EngineEvent, EngineHandle, EngineStopped};
use engine_logging::{engine_info, engine_warn};

/// Runs core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartTranslation(request) => {
                    engine_info!(
                        "StartTranslation job_id={} batches={} segments={}",
                        request.job_id,
                        request.batches.len(),
                        request.total_segments()
                    );
                    self.engine.translate(*request);
                }
                Effect::CancelTranslation { job_id } => {
                    engine_info!("CancelTranslation job_id={}", job_id);
                    self.engine.cancel(job_id);
                }
                Effect::SplitSegment(request) => {
                    engine_info!(
                        "SplitSegment index={} side={:?} position={}",
                        request.segment_index,
                        request.side,
                        request.position
                    );
                    self.engine.split(*request);
                }
                Effect::ExtractGlossary(request) => {
                    engine_info!(
                        "ExtractGlossary source_chars={}",
                        request.source_text.chars().count()
                    );
                    self.engine.extract_glossary(*request);
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Result<Option<Msg>, EngineStopped> {
        Ok(self.engine.recv_timeout(timeout)?.map(map_event))
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Progress(progress) => Msg::TranslationProgress {
            job_id: progress.job_id,
            processed: progress.processed,
            total: progress.total,
        },
        EngineEvent::BatchTranslated {
            job_id,
            batch_index,
            translations,
        } => Msg::BatchTranslated {
            job_id,
            batch_index,
            translations,
        },
        EngineEvent::BatchFailed { job_id, failure } => {
            engine_warn!(
                "Job {} batch {} failed: {}",
                job_id,
                failure.batch_index,
                failure.last_error
            );
            Msg::BatchFailed { job_id, failure }
        }
        EngineEvent::JobFinished(report) => Msg::TranslationFinished(report),
        EngineEvent::SplitFinished(outcome) => Msg::SplitResolved(outcome),
        EngineEvent::GlossaryFinished {
            generation,
            result: Ok(entries),
        } => Msg::GlossaryExtracted {
            generation,
            entries,
        },
        EngineEvent::GlossaryFinished {
            generation,
            result: Err(error),
        } => Msg::GlossaryExtractionFailed { generation, error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitrans_core::{BatchFailure, GlossaryEntry};
    use bitrans_engine::JobProgress;
    use pretty_assertions::assert_eq;

    #[test]
    fn engine_events_become_messages() {
        assert_eq!(
            map_event(EngineEvent::Progress(JobProgress {
                job_id: 3,
                processed: 1,
                total: 4,
                percent: 25,
            })),
            Msg::TranslationProgress {
                job_id: 3,
                processed: 1,
                total: 4
            }
        );
        let failure = BatchFailure {
            batch_index: 0,
            attempts: 17,
            last_error: "timeout".to_string(),
        };
        assert_eq!(
            map_event(EngineEvent::BatchFailed {
                job_id: 3,
                failure: failure.clone()
            }),
            Msg::BatchFailed { job_id: 3, failure }
        );
        assert_eq!(
            map_event(EngineEvent::GlossaryFinished {
                generation: 2,
                result: Err("down".to_string())
            }),
            Msg::GlossaryExtractionFailed {
                generation: 2,
                error: "down".to_string()
            }
        );
        assert_eq!(
            map_event(EngineEvent::GlossaryFinished {
                generation: 3,
                result: Ok(vec![GlossaryEntry::new("a", "b", "")])
            }),
            Msg::GlossaryExtracted {
                generation: 3,
                entries: vec![GlossaryEntry::new("a", "b", "")]
            }
        );
    }
}
