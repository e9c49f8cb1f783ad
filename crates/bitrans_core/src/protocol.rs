//! Marker line protocol shared by batch translation and segment splitting.
//!
//! A request embeds N texts as N lines, each starting with [`MARKER`]. A
//! response is expected in the same shape; the part count must match exactly.

use thiserror::Error;

/// Line prefix delimiting one part inside a prompt or a response.
pub const MARKER: &str = "-> ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("expected {expected} marked parts, got {actual}")]
    SegmentCountMismatch { expected: usize, actual: usize },
}

/// Joins texts into marker-prefixed lines.
pub fn encode_parts<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| format!("{MARKER}{}", part.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits a response into its marked parts without checking the count.
pub fn split_parts(response: &str) -> Vec<String> {
    let normalized = response.replace("\r\n", "\n");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let body = trimmed.strip_prefix(MARKER).unwrap_or(trimmed);
    let separator = format!("\n{MARKER}");
    body.split(separator.as_str())
        .map(|part| part.trim_end().to_string())
        .collect()
}

/// Splits a response and requires exactly `expected` parts.
pub fn parse_parts(response: &str, expected: usize) -> Result<Vec<String>, ProtocolError> {
    let parts = split_parts(response);
    if parts.len() != expected {
        return Err(ProtocolError::SegmentCountMismatch {
            expected,
            actual: parts.len(),
        });
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_one_line_per_part() {
        assert_eq!(encode_parts(&["a", "b"]), "-> a\n-> b");
    }

    #[test]
    fn parses_with_and_without_leading_marker() {
        assert_eq!(parse_parts("-> one\n-> two\n", 2).unwrap(), vec!["one", "two"]);
        assert_eq!(parse_parts("one\n-> two", 2).unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn multi_line_parts_survive() {
        let parts = parse_parts("-> line1\nline2\r\n-> three", 2).unwrap();
        assert_eq!(parts, vec!["line1\nline2", "three"]);
    }

    #[test]
    fn count_mismatch_is_tagged() {
        assert_eq!(
            parse_parts("-> only one", 2),
            Err(ProtocolError::SegmentCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            parse_parts("   ", 1),
            Err(ProtocolError::SegmentCountMismatch {
                expected: 1,
                actual: 0
            })
        );
    }
}
