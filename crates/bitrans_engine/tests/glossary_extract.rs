mod common;

use std::time::Duration;

use bitrans_core::{GlossaryEntry, GlossaryRequest, LlmConfig, PromptSet, TranslateConfig};
use bitrans_engine::{extract_glossary, GlossaryError, LlmError};
use common::ScriptedClient;
use pretty_assertions::assert_eq;

fn glossary_request() -> GlossaryRequest {
    GlossaryRequest {
        generation: 1,
        source_text: "猫が好き".to_string(),
        translate_config: TranslateConfig {
            timeout_threshold: 45,
            ..TranslateConfig::default()
        },
        llm_config: LlmConfig::default(),
        prompts: PromptSet::default(),
    }
}

#[tokio::test]
async fn fenced_reply_is_parsed_without_header_row() {
    engine_logging::initialize_for_tests();
    let client = ScriptedClient::new(vec![Ok(
        "```json\n[[\"原文\",\"译文\",\"类别\"],[\"猫\",\"cat\",\"animal\"]]\n```".into(),
    )]);

    let entries = extract_glossary(client.as_ref(), &glossary_request())
        .await
        .unwrap();

    assert_eq!(entries, vec![GlossaryEntry::new("猫", "cat", "animal")]);
    let sent = &client.requests()[0];
    assert_eq!(sent.timeout, Duration::from_secs(90));
    assert!(sent.messages.iter().any(|m| m.content.contains("猫が好き")));
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let client = ScriptedClient::new(vec![Err(LlmError::Timeout(Duration::from_secs(90)))]);

    let err = extract_glossary(client.as_ref(), &glossary_request())
        .await
        .unwrap_err();

    assert_eq!(err, GlossaryError::Request(LlmError::Timeout(Duration::from_secs(90))));
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn prose_reply_is_a_parse_error() {
    let client = ScriptedClient::new(vec![Ok("Sure! Here are the terms: cat".into())]);

    let err = extract_glossary(client.as_ref(), &glossary_request())
        .await
        .unwrap_err();

    assert!(matches!(err, GlossaryError::Parse(_)), "{err:?}");
}
