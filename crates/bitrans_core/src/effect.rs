use crate::{GlossaryRequest, JobId, SplitRequest, TranslationRequest};

/// Work the shell must hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartTranslation(Box<TranslationRequest>),
    CancelTranslation { job_id: JobId },
    SplitSegment(Box<SplitRequest>),
    ExtractGlossary(Box<GlossaryRequest>),
}
