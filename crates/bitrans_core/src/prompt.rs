use serde::{Deserialize, Serialize};

use crate::{protocol, Batch, Glossary, TranslateConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Translation,
    GlossaryExtraction,
    OriginalTextSplit,
    TranslatedTextSplit,
}

impl PromptKind {
    pub const ALL: [PromptKind; 4] = [
        PromptKind::Translation,
        PromptKind::GlossaryExtraction,
        PromptKind::OriginalTextSplit,
        PromptKind::TranslatedTextSplit,
    ];

    /// Key used in `prompt.json`.
    pub fn key(self) -> &'static str {
        match self {
            PromptKind::Translation => "translation",
            PromptKind::GlossaryExtraction => "glossaryExtraction",
            PromptKind::OriginalTextSplit => "originalTextSplit",
            PromptKind::TranslatedTextSplit => "translatedTextSplit",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    fn new(system: &str, user: &str) -> Self {
        Self {
            system: system.to_string(),
            user: user.to_string(),
        }
    }
}

/// One row of `prompt.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    pub translation: PromptTemplate,
    pub glossary_extraction: PromptTemplate,
    pub original_text_split: PromptTemplate,
    pub translated_text_split: PromptTemplate,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            translation: PromptTemplate::new(
                "Translate the given text accurately. Respond only with the translated segments, each starting with '-> '. Maintain the same number of segments as the input.",
                "Translate the following text segments from {{src_lang}} to {{dst_lang}}:\n{{text}}",
            ),
            glossary_extraction: PromptTemplate::new(
                "Extract a glossary from the provided text. The output should be a JSON array of arrays, where each inner array is [\"original_term\", \"translated_term\", \"category\"]. Example: [[\"猫\",\"cat\",\"animal\"],[\"犬\",\"dog\",\"animal\"]]",
                "Extract glossary from text ({{src_lang}} to {{dst_lang}}):\n{{text}}",
            ),
            original_text_split: PromptTemplate::new(
                "You are an expert in text segmentation. The user will provide a segment of original text ({{src_lang}}) that they have split at a certain point, and the corresponding full translated text ({{dst_lang}}). Your task is to split the translated text at a point that semantically corresponds to the split in the original text. Respond with the two parts of the translated text, each prefixed with '-> '. Example: -> part1\n-> part2",
                "Original full text ({{src_lang}}):\n{{src_before_split}}\n\nTranslated full text ({{dst_lang}}):\n{{trans_before_split}}\n\nThe original text was split into two parts:\nPart 1: {{src_split_00}}\nPart 2: {{src_split_01}}\n\nNow, provide the corresponding split for the translated text:",
            ),
            translated_text_split: PromptTemplate::new(
                "You are an expert in text segmentation. The user will provide a segment of translated text ({{dst_lang}}) that they have split at a certain point, and the corresponding full original text ({{src_lang}}). Your task is to split the original text at a point that semantically corresponds to the split in the translated text. Respond with the two parts of the original text, each prefixed with '-> '. Example: -> part1\n-> part2",
                "Translated full text ({{dst_lang}}):\n{{trans_before_split}}\n\nOriginal full text ({{src_lang}}):\n{{src_before_split}}\n\nThe translated text was split into two parts:\nPart 1: {{trans_split_00}}\nPart 2: {{trans_split_01}}\n\nNow, provide the corresponding split for the original text:",
            ),
        }
    }
}

impl PromptSet {
    pub fn get(&self, kind: PromptKind) -> &PromptTemplate {
        match kind {
            PromptKind::Translation => &self.translation,
            PromptKind::GlossaryExtraction => &self.glossary_extraction,
            PromptKind::OriginalTextSplit => &self.original_text_split,
            PromptKind::TranslatedTextSplit => &self.translated_text_split,
        }
    }

    pub fn get_mut(&mut self, kind: PromptKind) -> &mut PromptTemplate {
        match kind {
            PromptKind::Translation => &mut self.translation,
            PromptKind::GlossaryExtraction => &mut self.glossary_extraction,
            PromptKind::OriginalTextSplit => &mut self.original_text_split,
            PromptKind::TranslatedTextSplit => &mut self.translated_text_split,
        }
    }

    pub fn to_records(&self) -> Vec<PromptRecord> {
        PromptKind::ALL
            .into_iter()
            .map(|kind| {
                let template = self.get(kind);
                PromptRecord {
                    kind: kind.key().to_string(),
                    system: template.system.clone(),
                    user: template.user.clone(),
                }
            })
            .collect()
    }

    /// Overlays records onto the defaults; unknown types are ignored.
    pub fn from_records(records: &[PromptRecord]) -> Self {
        let mut set = Self::default();
        for record in records {
            if let Some(kind) = PromptKind::from_key(&record.kind) {
                *set.get_mut(kind) = PromptTemplate {
                    system: record.system.clone(),
                    user: record.user.clone(),
                };
            }
        }
        set
    }
}

/// Replaces every `{{key}}` in `template` in one pass. Inserted values are
/// never scanned again; unknown placeholders stay as written.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 2..];
        let value = tail.find("}}").and_then(|end| {
            let key = &tail[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

const GLOSSARY_PLACEHOLDER: &str = "{{glossary}}";

/// Messages for one translation batch: all sources as marker-prefixed lines.
pub fn translation_messages(
    prompts: &PromptSet,
    config: &TranslateConfig,
    glossary: &Glossary,
    batch: &Batch,
) -> Vec<ChatMessage> {
    let text = protocol::encode_parts(&batch.source_texts());
    let block = glossary.prompt_block();
    let vars = [
        ("src_lang", config.original_language.as_str()),
        ("dst_lang", config.translated_language.as_str()),
        ("text", text.as_str()),
        ("glossary", block.as_str()),
    ];
    let template = &prompts.translation;
    let mut system = fill(&template.system, &vars);
    let has_placeholder =
        template.system.contains(GLOSSARY_PLACEHOLDER) || template.user.contains(GLOSSARY_PLACEHOLDER);
    if !has_placeholder && !glossary.is_empty() {
        system.push_str("\n\nUse these term translations:\n");
        system.push_str(&block);
    }
    vec![
        ChatMessage::system(system),
        ChatMessage::user(fill(&template.user, &vars)),
    ]
}

pub fn glossary_messages(
    prompts: &PromptSet,
    config: &TranslateConfig,
    source_text: &str,
) -> Vec<ChatMessage> {
    let vars = [
        ("src_lang", config.original_language.as_str()),
        ("dst_lang", config.translated_language.as_str()),
        ("text", source_text),
    ];
    let template = &prompts.glossary_extraction;
    vec![
        ChatMessage::system(fill(&template.system, &vars)),
        ChatMessage::user(fill(&template.user, &vars)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_replaces_every_occurrence() {
        assert_eq!(
            fill("{{a}}-{{b}}-{{a}}", &[("a", "x"), ("b", "y")]),
            "x-y-x"
        );
    }

    #[test]
    fn fill_leaves_placeholders_inside_values_alone() {
        assert_eq!(
            fill(
                "{{src}} | {{glossary}}",
                &[("src", "see {{glossary}} and {{src_split_00}}"), ("glossary", "cat=猫")]
            ),
            "see {{glossary}} and {{src_split_00}} | cat=猫"
        );
        assert_eq!(fill("{{unknown}} {{ {{a}}", &[("a", "x")]), "{{unknown}} {{ x");
    }

    #[test]
    fn records_round_trip_and_ignore_unknown() {
        let mut records = PromptSet::default().to_records();
        records[0].system = "custom".to_string();
        records.push(PromptRecord {
            kind: "somethingElse".to_string(),
            system: String::new(),
            user: String::new(),
        });
        let set = PromptSet::from_records(&records);
        assert_eq!(set.translation.system, "custom");
        assert_eq!(set.glossary_extraction, PromptSet::default().glossary_extraction);
    }
}
