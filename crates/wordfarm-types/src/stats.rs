//! Pure word statistics over a finished collection.

use crate::Word;
use std::collections::HashMap;

/// Length threshold used by the default report.
pub const LONG_WORD_THRESHOLD: usize = 5;

/// Minimum repeat count used by the default report.
pub const REPEAT_THRESHOLD: usize = 2;

/// Counts words with more than `length` characters.
pub fn count_longer_than(words: &[Word], length: usize) -> usize {
    words.iter().filter(|w| w.char_len() > length).count()
}

/// Counts words in which at least one character occurs `min_repeat` times or more.
pub fn count_with_repeating_chars(words: &[Word], min_repeat: usize) -> usize {
    words
        .iter()
        .filter(|w| {
            let mut seen: HashMap<char, usize> = HashMap::new();
            w.as_str().chars().any(|ch| {
                let count = seen.entry(ch).or_insert(0);
                *count += 1;
                *count >= min_repeat
            })
        })
        .count()
}

/// Counts words whose first and last characters are equal.
pub fn count_same_start_end(words: &[Word]) -> usize {
    words
        .iter()
        .filter(|w| w.as_str().chars().next() == w.as_str().chars().last())
        .count()
}

/// Aggregate statistics printed after ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct WordStats {
    pub total: usize,
    pub longer_than_threshold: usize,
    pub with_repeating_chars: usize,
    pub same_start_end: usize,
}

impl WordStats {
    /// Computes all statistics with the default thresholds.
    pub fn analyze(words: &[Word]) -> Self {
        Self {
            total: words.len(),
            longer_than_threshold: count_longer_than(words, LONG_WORD_THRESHOLD),
            with_repeating_chars: count_with_repeating_chars(words, REPEAT_THRESHOLD),
            same_start_end: count_same_start_end(words),
        }
    }
}

impl std::fmt::Display for WordStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Words longer than {LONG_WORD_THRESHOLD} characters: {}",
            self.longer_than_threshold
        )?;
        writeln!(
            f,
            "Words with >={REPEAT_THRESHOLD} repeating characters: {}",
            self.with_repeating_chars
        )?;
        write!(
            f,
            "Words starting and ending with the same letter: {}",
            self.same_start_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(input: &[&str]) -> Vec<Word> {
        input.iter().map(|w| Word::parse(w).unwrap()).collect()
    }

    #[test]
    fn test_count_longer_than() {
        let list = words(&["apple", "banana", "cherries", "fig"]);
        assert_eq!(count_longer_than(&list, 5), 2);
    }

    #[test]
    fn test_count_with_repeating_chars() {
        // "banana" and "apple" repeat; "cat" and "dog" do not.
        let list = words(&["banana", "apple", "cat", "dog"]);
        assert_eq!(count_with_repeating_chars(&list, 2), 2);
        assert_eq!(count_with_repeating_chars(&list, 3), 1);
    }

    #[test]
    fn test_count_same_start_end() {
        let list = words(&["level", "noon", "cat", "aa"]);
        assert_eq!(count_same_start_end(&list), 3);
    }

    #[test]
    fn test_analyze_empty() {
        assert_eq!(WordStats::analyze(&[]), WordStats::default());
    }

    #[test]
    fn test_analyze_counts_total() {
        let stats = WordStats::analyze(&words(&["level", "banana"]));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.longer_than_threshold, 1);
        assert_eq!(stats.same_start_end, 1);
    }
}
