use crate::prompt::{fill, ChatMessage};
use crate::{protocol, LlmConfig, PromptSet, ProtocolError, Segment, SegmentId, TranslateConfig};

/// Which text the cursor sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSide {
    Original,
    Translated,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HalfSegment {
    pub src: String,
    pub trans: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplitHalves {
    pub first: HalfSegment,
    pub second: HalfSegment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitMethod {
    Llm,
    Proportional,
}

/// Everything the split assistant needs, snapshotted when the user splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub segment_index: usize,
    pub segment: Segment,
    pub side: SplitSide,
    /// Cursor position in characters within the primary text.
    pub position: usize,
    pub translate_config: TranslateConfig,
    pub llm_config: LlmConfig,
    pub prompts: PromptSet,
}

impl SplitRequest {
    pub fn primary(&self) -> &str {
        primary_text(&self.segment, self.side)
    }

    pub fn secondary(&self) -> &str {
        secondary_text(&self.segment, self.side)
    }

    /// No counterpart to align, so the LLM is never consulted.
    pub fn needs_llm(&self) -> bool {
        !self.secondary().trim().is_empty()
    }
}

/// A computed split, with the texts it was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub segment_index: usize,
    pub segment_id: SegmentId,
    pub source_src: String,
    pub source_trans: String,
    pub halves: SplitHalves,
    pub method: SplitMethod,
}

impl SplitOutcome {
    pub fn new(request: &SplitRequest, halves: SplitHalves, method: SplitMethod) -> Self {
        Self {
            segment_index: request.segment_index,
            segment_id: request.segment.id,
            source_src: request.segment.src.clone(),
            source_trans: request.segment.trans.clone(),
            halves,
            method,
        }
    }

    /// False once `segment` was edited after the split was computed.
    pub fn computed_from(&self, segment: &Segment) -> bool {
        segment.src == self.source_src && segment.trans == self.source_trans
    }
}

fn primary_text(segment: &Segment, side: SplitSide) -> &str {
    match side {
        SplitSide::Original => &segment.src,
        SplitSide::Translated => &segment.trans,
    }
}

fn secondary_text(segment: &Segment, side: SplitSide) -> &str {
    match side {
        SplitSide::Original => &segment.trans,
        SplitSide::Translated => &segment.src,
    }
}

/// Splits `text` at a character position, clamped to its length.
pub fn split_at_char(text: &str, position: usize) -> (String, String) {
    let byte = text
        .char_indices()
        .nth(position)
        .map_or(text.len(), |(byte, _)| byte);
    (text[..byte].to_string(), text[byte..].to_string())
}

fn assemble(side: SplitSide, primary: (String, String), secondary: (String, String)) -> SplitHalves {
    let ((p1, p2), (s1, s2)) = (primary, secondary);
    match side {
        SplitSide::Original => SplitHalves {
            first: HalfSegment { src: p1, trans: s1 },
            second: HalfSegment { src: p2, trans: s2 },
        },
        SplitSide::Translated => SplitHalves {
            first: HalfSegment { src: s1, trans: p1 },
            second: HalfSegment { src: s2, trans: p2 },
        },
    }
}

/// Deterministic split: the secondary text is cut at the same relative
/// position, `floor(position / primary_len * secondary_len)`.
pub fn proportional_split(segment: &Segment, side: SplitSide, position: usize) -> SplitHalves {
    let primary = primary_text(segment, side);
    let secondary = secondary_text(segment, side);
    let primary_len = primary.chars().count();
    let position = position.min(primary_len);
    let secondary_len = secondary.chars().count();
    let secondary_position = if primary_len == 0 {
        0
    } else {
        position * secondary_len / primary_len
    };
    assemble(
        side,
        split_at_char(primary, position),
        split_at_char(secondary, secondary_position),
    )
}

/// Combines the user's primary split with the two parts the LLM produced.
pub fn llm_split(segment: &Segment, side: SplitSide, position: usize, parts: [String; 2]) -> SplitHalves {
    let [first, second] = parts;
    assemble(
        side,
        split_at_char(primary_text(segment, side), position),
        (first, second),
    )
}

/// Parses a split response into exactly two marked parts.
pub fn parse_split_response(text: &str) -> Result<[String; 2], ProtocolError> {
    let parts = protocol::parse_parts(text, 2)?;
    let mut parts = parts.into_iter();
    match (parts.next(), parts.next()) {
        (Some(first), Some(second)) => Ok([first, second]),
        _ => Err(ProtocolError::SegmentCountMismatch {
            expected: 2,
            actual: 0,
        }),
    }
}

pub fn split_messages(request: &SplitRequest) -> Vec<ChatMessage> {
    let (part1, part2) = split_at_char(request.primary(), request.position);
    let config = &request.translate_config;
    let (template, split_keys) = match request.side {
        SplitSide::Original => (
            &request.prompts.original_text_split,
            ["src_split_00", "src_split_01"],
        ),
        SplitSide::Translated => (
            &request.prompts.translated_text_split,
            ["trans_split_00", "trans_split_01"],
        ),
    };
    let vars = [
        ("src_lang", config.original_language.as_str()),
        ("dst_lang", config.translated_language.as_str()),
        ("src_before_split", request.segment.src.as_str()),
        ("trans_before_split", request.segment.trans.as_str()),
        (split_keys[0], part1.as_str()),
        (split_keys[1], part2.as_str()),
    ];
    vec![
        ChatMessage::system(fill(&template.system, &vars)),
        ChatMessage::user(fill(&template.user, &vars)),
    ]
}
