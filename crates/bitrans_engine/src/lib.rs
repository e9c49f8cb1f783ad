//! Bitrans engine: LLM calls, job execution and project files.
mod decode;
mod engine;
mod glossary;
mod llm;
mod orchestrator;
mod persist;
mod project;
mod retry;
mod split;
mod types;

pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::EngineHandle;
pub use glossary::{extract_glossary, extraction_timeout, GlossaryError};
pub use llm::{
    coerce_parameter, extract_completion_text, ClientSettings, Completion, CompletionRequest,
    LlmClient, ReqwestLlmClient,
};
pub use orchestrator::{ChannelEventSink, EventSink, TranslationOrchestrator};
pub use persist::{ensure_dir, write_atomic, PersistError};
pub use project::{
    export_translation, load_project, read_archive, save_project, segments_from_text,
    write_archive, Project, ProjectError, ProjectKind, ProjectSnapshot, ARTICLE_MEMBER,
    LLM_CONFIG_MEMBER, PROMPT_MEMBER, TRANSLATE_CONFIG_MEMBER, WORD_TABLE_MEMBER,
};
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper, DEFAULT_BACKOFF};
pub use split::assist_split;
pub use types::{AttemptError, EngineEvent, EngineStopped, JobProgress, LlmError};
