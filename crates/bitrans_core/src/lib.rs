//! Bitrans core: pure segment model, batching, line protocol and state machine.
mod batch;
mod config;
mod console;
mod effect;
mod glossary;
mod job;
mod msg;
pub mod prompt;
pub mod protocol;
mod segment;
mod split;
mod state;
mod update;
mod view_model;

pub use batch::{pack, pack_filtered, Batch, BatchItem, PackError};
pub use config::{LlmConfig, TranslateConfig};
pub use console::{LogEntry, LogLevel, MAX_LOG_ENTRIES};
pub use effect::Effect;
pub use glossary::{
    parse_glossary_response, source_excerpt, Glossary, GlossaryEntry, GlossaryParseError,
    GlossaryRequest, EXTRACTION_CHAR_BUDGET,
};
pub use job::{
    progress_percent, BatchFailure, JobId, JobReport, JobStatus, TranslatedSegment,
    TranslationJob, TranslationRequest,
};
pub use msg::Msg;
pub use prompt::{ChatMessage, PromptKind, PromptRecord, PromptSet, PromptTemplate, Role};
pub use protocol::{ProtocolError, MARKER};
pub use segment::{
    Article, ChangeEvent, Segment, SegmentId, TranslationScope, TranslationStatus,
};
pub use split::{
    llm_split, parse_split_response, proportional_split, split_messages, HalfSegment,
    SplitHalves, SplitMethod, SplitOutcome, SplitRequest, SplitSide,
};
pub use state::{AppState, MAX_CHANGE_EVENTS};
pub use update::update;
pub use view_model::{AppViewModel, JobView, SegmentRowView};
