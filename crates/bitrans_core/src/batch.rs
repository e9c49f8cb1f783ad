use thiserror::Error;

use crate::{Segment, SegmentId};

/// One segment queued for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchItem {
    /// Position in the snapshot the batch was built from.
    pub original_index: usize,
    pub segment_id: SegmentId,
    pub source_text: String,
}

/// Consecutive segments submitted together in one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Batch {
    pub items: Vec<BatchItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total source characters in the batch.
    pub fn text_len(&self) -> usize {
        self.items.iter().map(|item| item.source_text.chars().count()).sum()
    }

    pub fn source_texts(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.source_text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackError {
    #[error("invalid configuration: max text length must be positive")]
    InvalidConfiguration,
}

/// Partitions segments into batches of at most `max_len` source characters.
///
/// Blank sources are skipped. A segment longer than `max_len` is emitted alone,
/// truncated to `max_len` characters. An empty input yields no batches.
pub fn pack(segments: &[Segment], max_len: usize) -> Result<Vec<Batch>, PackError> {
    pack_filtered(segments, max_len, |_| true)
}

/// Like [`pack`], additionally skipping segments rejected by `include`.
/// Indices still refer to positions in `segments`.
pub fn pack_filtered<F>(
    segments: &[Segment],
    max_len: usize,
    include: F,
) -> Result<Vec<Batch>, PackError>
where
    F: Fn(&Segment) -> bool,
{
    if max_len == 0 {
        return Err(PackError::InvalidConfiguration);
    }

    let mut batches = Vec::new();
    let mut current = Batch::default();
    let mut current_len = 0;

    for (index, segment) in segments.iter().enumerate() {
        if !segment.has_source() || !include(segment) {
            continue;
        }
        let len = segment.src.chars().count();

        if len > max_len {
            if !current.is_empty() {
                batches.push(std::mem::take(&mut current));
                current_len = 0;
            }
            engine_logging::engine_debug!(
                "segment {} has {} chars, truncated to {}",
                index,
                len,
                max_len
            );
            batches.push(Batch {
                items: vec![BatchItem {
                    original_index: index,
                    segment_id: segment.id,
                    source_text: segment.src.chars().take(max_len).collect(),
                }],
            });
            continue;
        }

        if current_len + len > max_len && !current.is_empty() {
            batches.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.items.push(BatchItem {
            original_index: index,
            segment_id: segment.id,
            source_text: segment.src.clone(),
        });
        current_len += len;
    }

    if !current.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}
