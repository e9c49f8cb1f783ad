use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{LlmConfig, PromptSet, Segment, TranslateConfig};

/// Source characters sent to glossary extraction at most.
pub const EXTRACTION_CHAR_BUDGET: usize = 15_000;

/// Header rows an LLM tends to echo back from the prompt example.
const HEADER_TOKENS: &[&str] = &["original_term", "原文"];

/// `[original, translation, category]`, stored as a JSON triple.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "(String, String, String)", into = "(String, String, String)")]
pub struct GlossaryEntry {
    pub original: String,
    pub translation: String,
    pub category: String,
}

impl GlossaryEntry {
    pub fn new(
        original: impl Into<String>,
        translation: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            translation: translation.into(),
            category: category.into(),
        }
    }
}

impl From<(String, String, String)> for GlossaryEntry {
    fn from((original, translation, category): (String, String, String)) -> Self {
        Self {
            original,
            translation,
            category,
        }
    }
}

impl From<GlossaryEntry> for (String, String, String) {
    fn from(entry: GlossaryEntry) -> Self {
        (entry.original, entry.translation, entry.category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Glossary {
    entries: Vec<GlossaryEntry>,
}

impl Glossary {
    pub fn new(entries: Vec<GlossaryEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_original(&self, original: &str) -> bool {
        self.entries.iter().any(|entry| entry.original == original)
    }

    pub fn push(&mut self, entry: GlossaryEntry) {
        self.entries.push(entry);
    }

    pub fn replace(&mut self, index: usize, entry: GlossaryEntry) -> bool {
        match self.entries.get_mut(index) {
            Some(slot) => {
                *slot = entry;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<GlossaryEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Appends candidates whose original is not yet present (case-sensitive).
    /// Returns how many were added; duplicates are dropped silently.
    pub fn merge_unique(&mut self, candidates: Vec<GlossaryEntry>) -> usize {
        let before = self.entries.len();
        for candidate in candidates {
            if !self.contains_original(&candidate.original) {
                self.entries.push(candidate);
            }
        }
        self.entries.len() - before
    }

    /// Renders the glossary as prompt lines: `original => translation (category)`.
    pub fn prompt_block(&self) -> String {
        self.entries
            .iter()
            .map(|entry| {
                if entry.category.is_empty() {
                    format!("{} => {}", entry.original, entry.translation)
                } else {
                    format!(
                        "{} => {} ({})",
                        entry.original, entry.translation, entry.category
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlossaryParseError {
    #[error("malformed glossary response: {0}")]
    MalformedResponse(String),
}

/// Parses an extraction response: a JSON array of `[original, translation, category?]`.
///
/// Header echoes and rows with an empty original or translation are dropped.
pub fn parse_glossary_response(text: &str) -> Result<Vec<GlossaryEntry>, GlossaryParseError> {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|err| GlossaryParseError::MalformedResponse(err.to_string()))?;
    let rows = value.as_array().ok_or_else(|| {
        GlossaryParseError::MalformedResponse("top level is not an array".to_string())
    })?;

    let mut entries = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let cells = row
            .as_array()
            .filter(|cells| cells.len() >= 2)
            .ok_or_else(|| {
                GlossaryParseError::MalformedResponse(format!(
                    "row {index} is not an array of at least 2 elements"
                ))
            })?;
        let original = cell_text(&cells[0]);
        let translation = cell_text(&cells[1]);
        let category = cells.get(2).map(cell_text).unwrap_or_default();
        if HEADER_TOKENS.contains(&original.as_str()) {
            continue;
        }
        if original.is_empty() || translation.is_empty() {
            continue;
        }
        entries.push(GlossaryEntry {
            original,
            translation,
            category,
        });
    }
    Ok(entries)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// Models often wrap JSON in a Markdown fence despite instructions.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Joined source text for extraction, bounded to `budget` characters.
pub fn source_excerpt(segments: &[Segment], budget: usize) -> String {
    let joined = segments
        .iter()
        .map(|segment| segment.src.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    joined.chars().take(budget).collect()
}

/// Everything an extraction call needs, snapshotted at request time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryRequest {
    pub generation: u64,
    pub source_text: String,
    pub translate_config: TranslateConfig,
    pub llm_config: LlmConfig,
    pub prompts: PromptSet,
}
