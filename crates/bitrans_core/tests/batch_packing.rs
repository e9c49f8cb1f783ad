use bitrans_core::{pack, pack_filtered, Article, Batch, PackError, Segment, TranslationScope};
use pretty_assertions::assert_eq;

fn snapshot(sources: &[&str]) -> Vec<Segment> {
    Article::from_segments(sources.iter().map(|src| Segment::new(*src, "")).collect()).to_segments()
}

fn indices(batches: &[Batch]) -> Vec<Vec<usize>> {
    batches
        .iter()
        .map(|batch| batch.items.iter().map(|item| item.original_index).collect())
        .collect()
}

#[test]
fn small_segments_share_one_batch() {
    let segments = vec![Segment::new("A", ""), Segment::new("B", "")];
    let batches = pack(&segments, 10).unwrap();

    assert_eq!(indices(&batches), vec![vec![0, 1]]);
    assert_eq!(batches[0].source_texts(), vec!["A", "B"]);
}

#[test]
fn oversized_segment_is_truncated_alone() {
    let segments = vec![Segment::new("AAAAAAAAAAA", "")];
    let batches = pack(&segments, 5).unwrap();

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0].items[0].source_text, "AAAAA");
}

#[test]
fn oversized_segment_closes_the_open_batch() {
    let segments = snapshot(&["ab", "cdefghijk", "lm", "no"]);
    let batches = pack(&segments, 4).unwrap();

    assert_eq!(indices(&batches), vec![vec![0], vec![1], vec![2, 3]]);
    assert_eq!(batches[1].items[0].source_text, "cdef");
}

#[test]
fn batches_close_when_the_next_segment_would_overflow() {
    let segments = snapshot(&["aaa", "bbb", "cc", "d"]);
    let batches = pack(&segments, 6).unwrap();

    assert_eq!(indices(&batches), vec![vec![0, 1], vec![2, 3]]);
    assert!(batches.iter().all(|batch| batch.text_len() <= 6));
}

#[test]
fn blank_sources_are_skipped_but_keep_positions() {
    let segments = snapshot(&["a", "", "   ", "b"]);
    let batches = pack(&segments, 100).unwrap();

    assert_eq!(indices(&batches), vec![vec![0, 3]]);
    assert_eq!(batches[0].items[1].segment_id, segments[3].id);
}

#[test]
fn length_counts_characters_not_bytes() {
    let segments = snapshot(&["猫猫", "犬犬", "鳥"]);
    let batches = pack(&segments, 4).unwrap();

    assert_eq!(indices(&batches), vec![vec![0, 1], vec![2]]);
}

#[test]
fn zero_max_length_is_invalid() {
    let segments = snapshot(&["a"]);
    assert_eq!(pack(&segments, 0), Err(PackError::InvalidConfiguration));
}

#[test]
fn empty_input_yields_no_batches() {
    assert_eq!(pack(&[], 10), Ok(Vec::new()));
}

#[test]
fn untranslated_only_filter_keeps_snapshot_indices() {
    let mut segments = snapshot(&["a", "b", "c"]);
    segments[1].trans = "done".to_string();
    let scope = TranslationScope::UntranslatedOnly;
    let batches = pack_filtered(&segments, 10, |segment| scope.includes(segment)).unwrap();

    assert_eq!(indices(&batches), vec![vec![0, 2]]);
}

#[test]
fn packing_reconstructs_order_without_duplicates() {
    let sources = [
        "one", "", "three three", "4", "fifteen chars!!", "six", " ", "seven", "eight eight",
        "9", "ten",
    ];
    let segments = snapshot(&sources);
    for max_len in 1..=20 {
        let batches = pack(&segments, max_len).unwrap();
        let flat: Vec<usize> = indices(&batches).into_iter().flatten().collect();
        let expected: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.has_source())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(flat, expected, "max_len={max_len}");

        for batch in &batches {
            assert!(!batch.is_empty());
            assert!(batch.text_len() <= max_len, "max_len={max_len}");
            let idx: Vec<usize> = batch.items.iter().map(|i| i.original_index).collect();
            assert!(idx.windows(2).all(|w| w[0] < w[1]));
            for item in &batch.items {
                assert_eq!(item.segment_id, segments[item.original_index].id);
                if batch.len() > 1 {
                    assert_eq!(item.source_text, segments[item.original_index].src);
                }
            }
        }

        assert_eq!(pack(&segments, max_len).unwrap(), batches);
    }
}
