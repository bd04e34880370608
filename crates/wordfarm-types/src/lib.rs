//! Validated word types shared across the wordfarm crates.
//!
//! A [`Word`] is the unit every pipeline stage works with. Once constructed it is
//! guaranteed to be trimmed, lower-cased and at least [`MIN_WORD_CHARS`] characters
//! long, so downstream code can index its first two characters without checks.

pub mod stats;

pub use stats::WordStats;

/// Minimum number of characters a normalized word must have.
pub const MIN_WORD_CHARS: usize = 2;

/// Errors that can occur when creating validated word types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WordError {
    /// The input was empty or contained only whitespace
    #[error("Word cannot be empty")]
    Empty,

    /// The normalized input was shorter than [`MIN_WORD_CHARS`]
    #[error("Word '{0}' is shorter than 2 characters")]
    TooShort(String),
}

/// A normalized word with at least two characters.
///
/// The input is trimmed of leading and trailing whitespace and lower-cased during
/// construction. Length is counted in `char`s, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Word(String);

impl Word {
    /// Normalizes `input` and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`WordError::Empty`] for blank input and [`WordError::TooShort`] when
    /// the normalized word has fewer than [`MIN_WORD_CHARS`] characters.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, WordError> {
        let normalized = input.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(WordError::Empty);
        }
        if normalized.chars().count() < MIN_WORD_CHARS {
            return Err(WordError::TooShort(normalized));
        }
        Ok(Self(normalized))
    }

    /// Normalizes a raw line, returning `None` when it should be dropped.
    ///
    /// This is the filter applied by ingestion: blank and short lines are silently
    /// discarded.
    pub fn normalize(line: &str) -> Option<Self> {
        Self::parse(line).ok()
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the word.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// The first two characters, used as the shard keys of the artifact layout.
    pub fn shard_keys(&self) -> (char, char) {
        let mut chars = self.0.chars();
        // Construction guarantees at least two chars.
        let first = chars.next().unwrap_or_default();
        let second = chars.next().unwrap_or_default();
        (first, second)
    }

    /// Returns a new string with the first character upper-cased.
    pub fn capitalized(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Capitalizes every word, preserving order.
pub fn capitalize_all(words: &[Word]) -> Vec<String> {
    words.iter().map(Word::capitalized).collect()
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Word {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for Word {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Word {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Word::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let word = Word::parse("  Banana \t").unwrap();
        assert_eq!(word.as_str(), "banana");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Word::parse("   "), Err(WordError::Empty));
        assert_eq!(Word::parse(""), Err(WordError::Empty));
    }

    #[test]
    fn test_parse_rejects_single_char() {
        assert_eq!(Word::parse(" A "), Err(WordError::TooShort("a".into())));
    }

    #[test]
    fn test_normalize_drops_short_lines() {
        let kept: Vec<Word> = ["Apple", " banana ", "a", "CAT", ""]
            .iter()
            .filter_map(|line| Word::normalize(line))
            .collect();
        let kept: Vec<&str> = kept.iter().map(Word::as_str).collect();
        assert_eq!(kept, vec!["apple", "banana", "cat"]);
    }

    #[test]
    fn test_shard_keys_multibyte() {
        let word = Word::parse("Éclair").unwrap();
        assert_eq!(word.shard_keys(), ('é', 'c'));
        assert_eq!(word.char_len(), 6);
    }

    #[test]
    fn test_capitalized_returns_new_value() {
        let word = Word::parse("zebra").unwrap();
        assert_eq!(word.capitalized(), "Zebra");
        assert_eq!(word.as_str(), "zebra");
    }

    #[test]
    fn test_capitalize_all_preserves_order() {
        let words = vec![Word::parse("dog").unwrap(), Word::parse("ant").unwrap()];
        assert_eq!(capitalize_all(&words), vec!["Dog", "Ant"]);
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let json = serde_json::to_string(&Word::parse("Owl").unwrap()).unwrap();
        assert_eq!(json, "\"owl\"");

        let err = serde_json::from_str::<Word>("\"x\"");
        assert!(err.is_err());
    }
}
