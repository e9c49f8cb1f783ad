use crate::{
    BatchFailure, GlossaryEntry, JobId, JobReport, LlmConfig, PromptSet, Segment, SplitOutcome,
    SplitSide, TranslateConfig, TranslatedSegment, TranslationScope,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A project or text file was loaded; replaces the article.
    ArticleLoaded(Vec<Segment>),
    GlossaryLoaded(Vec<GlossaryEntry>),
    TranslateConfigChanged(TranslateConfig),
    LlmConfigChanged(LlmConfig),
    PromptsChanged(PromptSet),
    /// The shell persisted the project.
    ProjectSaved,

    EditOriginal { index: usize, text: String },
    EditTranslated { index: usize, text: String },
    MergeUp { index: usize },
    MergeDown { index: usize },
    InsertBelow { index: usize },
    Delete { index: usize },
    MarkChapter { index: usize },
    UnmarkChapter { index: usize },

    /// User split a segment at a cursor position in one of its texts.
    SplitRequested {
        index: usize,
        side: SplitSide,
        position: usize,
    },
    /// Engine finished a split, by LLM or by fallback.
    SplitResolved(SplitOutcome),

    /// User clicked Translate. `scope` is the answer to the retranslate
    /// question; required when the article is partially translated.
    StartTranslationClicked { scope: Option<TranslationScope> },
    StopTranslationClicked,
    /// Engine parsed a batch response.
    BatchTranslated {
        job_id: JobId,
        batch_index: usize,
        translations: Vec<TranslatedSegment>,
    },
    /// Engine gave up on a batch after exhausting retries.
    BatchFailed { job_id: JobId, failure: BatchFailure },
    TranslationProgress {
        job_id: JobId,
        processed: usize,
        total: usize,
    },
    TranslationFinished(JobReport),

    BuildGlossaryClicked,
    /// `generation` echoes the article load the extraction was requested under.
    GlossaryExtracted {
        generation: u64,
        entries: Vec<GlossaryEntry>,
    },
    GlossaryExtractionFailed { generation: u64, error: String },
    AddGlossaryEntry(GlossaryEntry),
    EditGlossaryEntry { index: usize, entry: GlossaryEntry },
    DeleteGlossaryEntry { index: usize },

    ClearLogs,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
