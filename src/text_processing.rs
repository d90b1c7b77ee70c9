//! # Text Processing Module
//!
//! This module provides the text utilities shared by the meal parser:
//!
//! - Food-phrase normalization (punctuation, numbers and stopwords removed)
//! - Container/unit word recognition ("cup", "slices", "bowl", ...)
//! - Quantity parsing from digits, fractions and number words

use crate::annotation::AnnotatedToken;
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Words dropped from normalized food phrases
pub const STOPWORDS: [&str; 7] = ["a", "an", "the", "some", "of", "in", "with"];

/// Container and unit words that introduce an "<unit> of <food>" phrase
pub static UNIT_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "cup", "cups", "slice", "slices", "piece", "pieces", "bowl", "bowls", "glass",
        "glasses", "plate", "plates",
    ]
    .into_iter()
    .collect()
});

static NUMBER_WORD_VALUES: LazyLock<HashMap<&'static str, f64>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    let words = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen", "twenty",
    ];
    for (i, word) in words.iter().enumerate() {
        map.insert(*word, (i + 1) as f64);
    }
    map.insert("thirty", 30.0);
    map.insert("forty", 40.0);
    map.insert("fifty", 50.0);
    map.insert("sixty", 60.0);
    map.insert("seventy", 70.0);
    map.insert("eighty", 80.0);
    map.insert("ninety", 90.0);
    map.insert("hundred", 100.0);
    map.insert("half", 0.5);
    map.insert("dozen", 12.0);
    map
});

/// Check whether a word is a container/unit word (case-insensitive)
pub fn is_unit_word(word: &str) -> bool {
    UNIT_WORDS.contains(word.to_lowercase().as_str())
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.iter().any(|stop| stop.eq_ignore_ascii_case(word))
}

/// Normalize a span of tokens into a food phrase
///
/// Punctuation and numeric-like tokens are skipped, the remaining texts are joined
/// with single spaces and lowercased, and stopwords are dropped.
///
/// # Examples
///
/// ```rust
/// use glycomeal::annotation::{Annotator, RuleBasedAnnotator};
/// use glycomeal::text_processing::clean_name;
///
/// let doc = RuleBasedAnnotator::new().annotate("the 2 Bowls of Rice!");
/// assert_eq!(clean_name(doc.tokens()), "bowls rice");
/// ```
pub fn clean_name<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = &'a AnnotatedToken>,
{
    let joined = tokens
        .into_iter()
        .filter(|t| !t.is_punct && !t.like_num)
        .map(|t| t.text.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let cleaned = joined
        .split_whitespace()
        .filter(|word| !is_stopword(word))
        .collect::<Vec<_>>()
        .join(" ");

    trace!("Normalized '{}' -> '{}'", joined, cleaned);
    cleaned
}

/// Parse the quantity expressed by a numeric-like token
///
/// Accepts decimal literals ("2", "1.5"), simple fractions ("1/2") and English
/// number words ("two", "half", "dozen"). Returns `None` for anything else,
/// including zero, negative and non-finite values.
pub fn parse_quantity(text: &str) -> Option<f64> {
    let text = text.trim();
    let value = if let Some((numerator, denominator)) = text.split_once('/') {
        let numerator: f64 = numerator.trim().parse().ok()?;
        let denominator: f64 = denominator.trim().parse().ok()?;
        if denominator == 0.0 {
            return None;
        }
        numerator / denominator
    } else if text.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '.') {
        text.parse::<f64>().ok()?
    } else {
        *NUMBER_WORD_VALUES.get(text.to_lowercase().as_str())?
    };

    (value.is_finite() && value > 0.0).then_some(value)
}
