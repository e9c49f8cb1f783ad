use serde::{Deserialize, Serialize};

/// Identity token for UI list stability. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SegmentId(pub u64);

/// One aligned unit of original/translated text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Segment {
    #[serde(skip)]
    pub id: SegmentId,
    pub src: String,
    pub trans: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<String>,
}

impl Segment {
    pub fn new(src: impl Into<String>, trans: impl Into<String>) -> Self {
        Self {
            id: SegmentId::default(),
            src: src.into(),
            trans: trans.into(),
            chapters: None,
        }
    }

    pub fn has_source(&self) -> bool {
        !self.src.trim().is_empty()
    }

    pub fn is_translated(&self) -> bool {
        !self.trans.trim().is_empty()
    }
}

/// What a mutation did to the article or glossary.
///
/// Every successful mutation yields exactly one event; subscribers (the
/// unsaved-changes flag, the renderer) react to events instead of wrapping
/// setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    ArticleReplaced { len: usize },
    OriginalEdited { index: usize },
    TranslatedEdited { index: usize },
    Merged { into: usize },
    Inserted { index: usize },
    Deleted { index: usize },
    ChapterMarked { index: usize },
    ChapterUnmarked { index: usize },
    Split { index: usize },
    TranslationWritten { index: usize },
    GlossaryChanged { len: usize },
    SettingsChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    /// No segment with source text.
    Empty,
    NoneTranslated,
    PartiallyTranslated { translated: usize, total: usize },
    AllTranslated,
}

/// Which segments a new translation job should cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationScope {
    All,
    UntranslatedOnly,
}

impl TranslationScope {
    pub fn includes(self, segment: &Segment) -> bool {
        match self {
            TranslationScope::All => true,
            TranslationScope::UntranslatedOnly => !segment.is_translated(),
        }
    }
}

const CHAPTER_TITLE_CHARS: usize = 20;
const DEFAULT_CHAPTER_TITLE: &str = "New Chapter";

/// Ordered segment collection. Position is narrative order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Article {
    segments: Vec<Segment>,
    next_id: u64,
}

impl Article {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an article from loaded segments, assigning fresh identities.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut article = Self::new();
        article.replace_segments(segments);
        article
    }

    /// Swaps in loaded segments. Identities keep counting up from the
    /// replaced content, so an id handed out earlier never resolves again.
    pub fn replace_segments(&mut self, segments: Vec<Segment>) {
        self.segments.clear();
        self.segments.reserve(segments.len());
        for mut segment in segments {
            segment.id = self.fresh_id();
            self.segments.push(segment);
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn to_segments(&self) -> Vec<Segment> {
        self.segments.clone()
    }

    pub fn position_of(&self, id: SegmentId) -> Option<usize> {
        self.segments.iter().position(|segment| segment.id == id)
    }

    fn fresh_id(&mut self) -> SegmentId {
        self.next_id += 1;
        SegmentId(self.next_id)
    }

    /// Resolves a segment by its index at snapshot time, falling back to a
    /// lookup by identity when the article was edited in between.
    pub fn resolve(&self, index_hint: usize, id: SegmentId) -> Option<usize> {
        match self.segments.get(index_hint) {
            Some(segment) if segment.id == id => Some(index_hint),
            _ => self.position_of(id),
        }
    }

    pub fn translation_status(&self) -> TranslationStatus {
        let mut total = 0;
        let mut translated = 0;
        for segment in self.segments.iter().filter(|s| s.has_source()) {
            total += 1;
            if segment.is_translated() {
                translated += 1;
            }
        }
        match (total, translated) {
            (0, _) => TranslationStatus::Empty,
            (_, 0) => TranslationStatus::NoneTranslated,
            (t, d) if t == d => TranslationStatus::AllTranslated,
            (total, translated) => TranslationStatus::PartiallyTranslated { translated, total },
        }
    }

    pub fn edit_original(&mut self, index: usize, text: String) -> Option<ChangeEvent> {
        let segment = self.segments.get_mut(index)?;
        if segment.src == text {
            return None;
        }
        segment.src = text;
        Some(ChangeEvent::OriginalEdited { index })
    }

    pub fn edit_translated(&mut self, index: usize, text: String) -> Option<ChangeEvent> {
        let segment = self.segments.get_mut(index)?;
        if segment.trans == text {
            return None;
        }
        segment.trans = text;
        Some(ChangeEvent::TranslatedEdited { index })
    }

    pub fn merge_up(&mut self, index: usize) -> Option<ChangeEvent> {
        if index == 0 || index >= self.segments.len() {
            return None;
        }
        self.merge_pair(index - 1)
    }

    pub fn merge_down(&mut self, index: usize) -> Option<ChangeEvent> {
        if index + 1 >= self.segments.len() {
            return None;
        }
        self.merge_pair(index)
    }

    // Folds `first + 1` into `first`; the first segment keeps its identity and chapter.
    fn merge_pair(&mut self, first: usize) -> Option<ChangeEvent> {
        let second = self.segments.remove(first + 1);
        let target = &mut self.segments[first];
        target.src = join_texts(&target.src, &second.src);
        target.trans = join_texts(&target.trans, &second.trans);
        Some(ChangeEvent::Merged { into: first })
    }

    /// Inserts an empty segment after `index`. On an empty article any index
    /// inserts the first segment.
    pub fn insert_below(&mut self, index: usize) -> Option<ChangeEvent> {
        let at = if self.segments.is_empty() {
            0
        } else if index < self.segments.len() {
            index + 1
        } else {
            return None;
        };
        let mut segment = Segment::new("", "");
        segment.id = self.fresh_id();
        self.segments.insert(at, segment);
        Some(ChangeEvent::Inserted { index: at })
    }

    /// Removes a segment; the last remaining segment cannot be deleted.
    pub fn delete(&mut self, index: usize) -> Option<ChangeEvent> {
        if self.segments.len() <= 1 || index >= self.segments.len() {
            return None;
        }
        self.segments.remove(index);
        Some(ChangeEvent::Deleted { index })
    }

    pub fn mark_chapter(&mut self, index: usize) -> Option<ChangeEvent> {
        let segment = self.segments.get_mut(index)?;
        let basis = [&segment.trans, &segment.src]
            .into_iter()
            .find(|text| !text.is_empty())
            .map(|text| text.chars().take(CHAPTER_TITLE_CHARS).collect())
            .unwrap_or_else(|| DEFAULT_CHAPTER_TITLE.to_string());
        segment.chapters = Some(basis);
        Some(ChangeEvent::ChapterMarked { index })
    }

    pub fn unmark_chapter(&mut self, index: usize) -> Option<ChangeEvent> {
        let segment = self.segments.get_mut(index)?;
        segment.chapters.take()?;
        Some(ChangeEvent::ChapterUnmarked { index })
    }

    /// Writes one translation result back. Returns `None` when the segment no
    /// longer exists.
    pub fn write_translation(
        &mut self,
        index_hint: usize,
        id: SegmentId,
        text: String,
    ) -> Option<ChangeEvent> {
        let index = self.resolve(index_hint, id)?;
        self.segments[index].trans = text;
        Some(ChangeEvent::TranslationWritten { index })
    }

    /// Replaces one segment with two adjacent ones. The first half keeps the
    /// identity and chapter marker; the second half gets a fresh identity.
    pub fn apply_split(
        &mut self,
        index_hint: usize,
        id: SegmentId,
        halves: crate::SplitHalves,
    ) -> Option<ChangeEvent> {
        let index = self.resolve(index_hint, id)?;
        let crate::SplitHalves { first, second } = halves;
        let target = &mut self.segments[index];
        target.src = first.src;
        target.trans = first.trans;
        let mut tail = Segment::new(second.src, second.trans);
        tail.id = self.fresh_id();
        self.segments.insert(index + 1, tail);
        Some(ChangeEvent::Split { index })
    }
}

fn join_texts(first: &str, second: &str) -> String {
    if first.is_empty() || second.is_empty() {
        format!("{first}{second}")
    } else {
        format!("{first}\n{second}")
    }
}
