use std::time::Duration;

use bitrans_core::{parse_glossary_response, prompt, GlossaryEntry, GlossaryRequest};
use engine_logging::{engine_debug, engine_info};
use thiserror::Error;

use crate::llm::{CompletionRequest, LlmClient};
use crate::LlmError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlossaryError {
    #[error("glossary request failed: {0}")]
    Request(#[from] LlmError),
    #[error("could not read glossary reply: {0}")]
    Parse(String),
}

/// Extraction gets twice the translation timeout; the whole excerpt goes out in one call.
pub fn extraction_timeout(timeout_threshold: u64) -> Duration {
    Duration::from_secs(timeout_threshold.saturating_mul(2))
}

/// One extraction call. Merging into the glossary is left to the caller.
pub async fn extract_glossary(
    client: &dyn LlmClient,
    request: &GlossaryRequest,
) -> Result<Vec<GlossaryEntry>, GlossaryError> {
    let config = &request.translate_config;
    let messages = prompt::glossary_messages(&request.prompts, config, &request.source_text);
    let completion = CompletionRequest::new(
        &request.llm_config,
        messages,
        extraction_timeout(config.timeout_threshold),
    );
    engine_debug!(
        "extracting glossary from {} chars",
        request.source_text.chars().count()
    );

    let reply = client.complete(&completion).await?;
    let entries =
        parse_glossary_response(&reply.text).map_err(|err| GlossaryError::Parse(err.to_string()))?;
    engine_info!("glossary reply parsed: {} candidate terms", entries.len());
    Ok(entries)
}
