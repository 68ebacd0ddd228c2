//! Whitespace-delimited word counting.

/// Count the words in `text`.
///
/// Words are maximal runs of non-whitespace characters. Empty or
/// whitespace-only text has zero words.
pub fn count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Signed change in word count between two edits.
pub fn delta(previous: usize, current: usize) -> i64 {
    current as i64 - previous as i64
}
