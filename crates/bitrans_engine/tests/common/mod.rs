#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bitrans_core::{
    pack, Article, LlmConfig, PromptSet, Segment, TranslateConfig, TranslationRequest,
};
use bitrans_engine::{Completion, CompletionRequest, EngineEvent, EventSink, LlmClient, LlmError, Sleeper};

/// Replies in script order; once the script runs dry every call gets `fallback`.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: Result<String, LlmError>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Self::with_fallback(
            replies,
            Err(LlmError::Transport("script exhausted".to_string())),
        )
    }

    pub fn with_fallback(
        replies: Vec<Result<String, LlmError>>,
        fallback: Result<String, LlmError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        reply.map(|text| Completion {
            raw_body: text.clone(),
            text,
        })
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

#[derive(Default)]
pub struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn article(sources: &[&str]) -> Article {
    Article::from_segments(sources.iter().map(|src| Segment::new(*src, "")).collect())
}

pub fn translation_request(
    job_id: u64,
    article: &Article,
    max_text_length: usize,
    retries: u32,
) -> TranslationRequest {
    let translate_config = TranslateConfig {
        max_text_length,
        task_retry_threshold: retries,
        ..TranslateConfig::default()
    };
    TranslationRequest {
        job_id,
        batches: pack(article.segments(), max_text_length).unwrap(),
        translate_config,
        llm_config: LlmConfig::default(),
        prompts: PromptSet::default(),
        glossary: Vec::new(),
    }
}
