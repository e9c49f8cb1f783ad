use std::collections::BTreeMap;
use std::time::Duration;

use bitrans_core::{ChatMessage, LlmConfig};
use engine_logging::engine_debug;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Number, Value};

use crate::LlmError;

/// Request fields a custom parameter may not override.
const RESERVED_FIELDS: &[&str] = &["model", "messages", "stream"];

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub connect_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// One chat-completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Extra body fields as configured (text); coerced before sending.
    pub parameters: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(config: &LlmConfig, messages: Vec<ChatMessage>, timeout: Duration) -> Self {
        Self {
            endpoint: config.api.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            messages,
            parameters: config.parameter.clone(),
            timeout,
        }
    }

    /// JSON body for the wire: `{model, messages, stream: false, ...parameters}`.
    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), Value::String(self.model.clone()));
        let messages = self
            .messages
            .iter()
            .map(|message| serde_json::to_value(message).unwrap_or(Value::Null))
            .collect();
        body.insert("messages".to_string(), Value::Array(messages));
        body.insert("stream".to_string(), Value::Bool(false));
        for (key, value) in &self.parameters {
            let key = key.trim();
            if key.is_empty() || RESERVED_FIELDS.contains(&key) {
                continue;
            }
            body.insert(key.to_string(), coerce_parameter(value));
        }
        Value::Object(body)
    }
}

/// Converts a textual parameter to the JSON type the endpoint expects:
/// integers, then finite floats, then booleans, else the string itself.
pub fn coerce_parameter(value: &str) -> Value {
    let trimmed = value.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    match trimmed {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}

/// Successful completion: the extracted text plus the raw body for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub raw_body: String,
}

#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}

/// Stateless HTTP client; safe to share across unrelated calls.
#[derive(Debug, Clone)]
pub struct ReqwestLlmClient {
    client: reqwest::Client,
}

impl ReqwestLlmClient {
    pub fn new(settings: ClientSettings) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| LlmError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl LlmClient for ReqwestLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let url = reqwest::Url::parse(&request.endpoint)
            .map_err(|err| LlmError::InvalidEndpoint(format!("{}: {err}", request.endpoint)))?;
        let body = serde_json::to_vec(&request.body())
            .map_err(|err| LlmError::Transport(err.to_string()))?;

        engine_debug!(
            "POST {} model={} messages={} body_len={}",
            url,
            request.model,
            request.messages.len(),
            body.len()
        );
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(&request.api_key)
            .timeout(request.timeout)
            .body(body)
            .send()
            .await
            .map_err(|err| map_reqwest_error(err, request.timeout))?;

        let status = response.status();
        let raw_body = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(err, request.timeout))?;
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: raw_body,
            });
        }

        let text = extract_completion_text(&raw_body)?;
        Ok(Completion { text, raw_body })
    }
}

/// Pulls `choices[0].message.content` out of a success body.
pub fn extract_completion_text(raw_body: &str) -> Result<String, LlmError> {
    let value: Value = serde_json::from_str(raw_body)
        .map_err(|err| LlmError::MalformedResponse(format!("body is not JSON: {err}")))?;
    value
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            LlmError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

fn map_reqwest_error(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        return LlmError::Timeout(timeout);
    }
    LlmError::Transport(err.to_string())
}
