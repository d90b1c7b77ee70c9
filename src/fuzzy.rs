//! # Fuzzy String Scoring
//!
//! Similarity scores on a 0-100 scale, built on the indel (insert/delete) distance
//! between character sequences:
//!
//! - [`ratio`]: normalized indel similarity of the whole strings
//! - [`partial_ratio`]: best [`ratio`] of the shorter string against any window of
//!   the longer one
//! - [`token_sort_ratio`] / [`token_set_ratio`]: word-order tolerant variants
//! - [`weighted_ratio`]: the combination used for food-name matching, which picks
//!   the strategy from the length ratio of the two strings
//!
//! Inputs are compared as given; use [`preprocess`] to lowercase and strip
//! punctuation first.

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;

/// Lowercase, turn every non-alphanumeric character into a space, trim
pub fn preprocess(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Length of the longest common subsequence
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    100.0 * (2 * lcs_len(a, b)) as f64 / total as f64
}

/// Normalized indel similarity
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// Best alignment of the shorter string inside the longer one
///
/// Windows the length of the shorter string slide over the longer one; prefixes
/// and suffixes of the longer string cover partial overlaps at either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();
    let mut best: f64 = 0.0;

    let windows = (1..m)
        .map(|end| (0, end))
        .chain((0..=n - m).map(|start| (start, start + m)))
        .chain((n - m + 1..n).map(|start| (start, n)));

    for (start, end) in windows {
        best = best.max(ratio_chars(&short, &long[start..end]));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

fn join(tokens: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    tokens
        .into_iter()
        .map(|t| t.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`ratio`] after sorting the words of both strings
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&join(sorted_tokens(a)), &join(sorted_tokens(b)))
}

/// Compare the shared words against each string's remaining words
///
/// Returns 100 when one word set contains the other.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection: Vec<&str> = set_a.intersection(&set_b).copied().collect();
    let diff_ab: Vec<&str> = set_a.difference(&set_b).copied().collect();
    let diff_ba: Vec<&str> = set_b.difference(&set_a).copied().collect();

    if !intersection.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let sect = join(&intersection);
    let combine = |rest: &[&str]| {
        if sect.is_empty() {
            join(rest)
        } else {
            format!("{} {}", sect, join(rest))
        }
    };
    let sect_ab = combine(&diff_ab);
    let sect_ba = combine(&diff_ba);

    let mut result = ratio(&sect_ab, &sect_ba);
    if !sect.is_empty() {
        result = result
            .max(ratio(&sect, &sect_ab))
            .max(ratio(&sect, &sect_ba));
    }
    result
}

/// [`partial_ratio`] over sorted words; 100 as soon as a word is shared
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let tokens_a = sorted_tokens(a);
    let tokens_b = sorted_tokens(b);
    let set_a: BTreeSet<&str> = tokens_a.iter().copied().collect();
    let set_b: BTreeSet<&str> = tokens_b.iter().copied().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    if set_a.intersection(&set_b).next().is_some() {
        return 100.0;
    }

    let result = partial_ratio(&join(&tokens_a), &join(&tokens_b));
    if tokens_a.len() == set_a.len() && tokens_b.len() == set_b.len() {
        return result;
    }
    result.max(partial_ratio(&join(&set_a), &join(&set_b)))
}

/// Weighted combination of the scorers above
///
/// Strings of similar length are compared whole and by word sets; when one string
/// is at least 1.5 times longer, partial alignments are scored as well, scaled
/// down the more the lengths differ. Empty input scores 0.
///
/// # Examples
///
/// ```rust
/// use glycomeal::fuzzy::weighted_ratio;
///
/// assert!(weighted_ratio("cheescake", "cheesecake") > 80.0);
/// assert!(weighted_ratio("xyzzyfood123", "cheesecake") < 80.0);
/// ```
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let len_ratio = len_a.max(len_b) as f64 / len_a.min(len_b) as f64;
    let mut score = ratio(a, b);

    if len_ratio < 1.5 {
        let token_score = token_sort_ratio(a, b).max(token_set_ratio(a, b));
        return score.max(token_score * UNBASE_SCALE);
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    score = score.max(partial_ratio(a, b) * partial_scale);
    score.max(partial_token_ratio(a, b) * UNBASE_SCALE * partial_scale)
}
