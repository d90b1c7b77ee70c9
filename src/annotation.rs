//! # Linguistic Annotation
//!
//! This module provides the annotated-document representation consumed by the meal
//! parser, and a deterministic rule-based annotator that produces it.
//!
//! ## Representation
//!
//! Tokens live in an arena owned by [`Document`]. Dependency links are stored as
//! indices into that arena: every token has exactly one head (a root is its own
//! head) and a list of child indices derived from the heads. Noun chunks are
//! half-open index ranges over the same arena.
//!
//! ## Rule-based annotator
//!
//! [`RuleBasedAnnotator`] tags tokens from closed-class word lists, groups noun
//! phrases with the pattern `(NUM)? (DET)? (NUM|ADJ)* NOUN+`, and attaches phrases to each
//! other through prepositions and conjunctions. It covers the short meal
//! descriptions this crate deals with ("two slices of cheesecake and a cup of
//! rice"); it is not a general-purpose parser.
//!
//! ```rust
//! use glycomeal::annotation::{Annotator, RuleBasedAnnotator};
//!
//! let doc = RuleBasedAnnotator::new().annotate("two slices of cheesecake");
//! let two = &doc.tokens()[0];
//! assert!(two.like_num);
//! assert_eq!(doc.head(two.index).text, "slices");
//! ```

use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

/// Coarse part-of-speech tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Pronoun,
    Verb,
    Adjective,
    Adverb,
    Determiner,
    Adposition,
    Conjunction,
    Numeral,
    Punctuation,
}

impl PartOfSpeech {
    /// Nouns and proper nouns
    pub fn is_noun(&self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::ProperNoun)
    }
}

/// A word of the input with its annotations
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedToken {
    /// Position in the document's token arena
    pub index: usize,
    /// Surface text as written
    pub text: String,
    /// Digits, decimals, fractions and number words ("two", "dozen")
    pub like_num: bool,
    pub is_punct: bool,
    pub pos: PartOfSpeech,
    /// Index of the governing token; equal to `index` for a root
    pub head: usize,
    /// Indices of the tokens governed by this one, in document order
    pub children: Vec<usize>,
}

impl AnnotatedToken {
    /// Build a token with no children; [`Document::new`] fills them in from the heads
    pub fn new(index: usize, text: impl Into<String>, pos: PartOfSpeech, head: usize) -> Self {
        let text = text.into();
        let lower = text.to_lowercase();
        Self {
            index,
            like_num: is_numeric_text(&lower) || NUMBER_WORDS.contains(lower.as_str()),
            is_punct: !text.is_empty() && text.chars().all(|c| !c.is_alphanumeric()),
            text,
            pos,
            head,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.head == self.index
    }
}

/// A contiguous noun-phrase span `[start, end)` over a document's tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NounChunk {
    pub start: usize,
    pub end: usize,
}

impl NounChunk {
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// An annotated text: token arena plus noun chunks
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    tokens: Vec<AnnotatedToken>,
    noun_chunks: Vec<NounChunk>,
}

impl Document {
    /// Assemble a document from tokens and chunks
    ///
    /// Token indices are reassigned to their arena positions, head indices that
    /// point outside the arena are turned into roots, child lists are rebuilt from
    /// the heads, and chunks that fall outside the arena are dropped.
    pub fn new(mut tokens: Vec<AnnotatedToken>, noun_chunks: Vec<NounChunk>) -> Self {
        let len = tokens.len();
        for (i, token) in tokens.iter_mut().enumerate() {
            token.index = i;
            if token.head >= len {
                token.head = i;
            }
            token.children.clear();
        }

        let heads: Vec<usize> = tokens.iter().map(|t| t.head).collect();
        for (i, head) in heads.into_iter().enumerate() {
            if head != i {
                tokens[head].children.push(i);
            }
        }

        let noun_chunks = noun_chunks
            .into_iter()
            .filter(|chunk| chunk.start < chunk.end && chunk.end <= len)
            .collect();

        Self {
            tokens,
            noun_chunks,
        }
    }

    pub fn tokens(&self) -> &[AnnotatedToken] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &AnnotatedToken {
        &self.tokens[index]
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The governing token of `index`
    pub fn head(&self, index: usize) -> &AnnotatedToken {
        &self.tokens[self.tokens[index].head]
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = &AnnotatedToken> + '_ {
        self.tokens[index]
            .children
            .iter()
            .map(move |&child| &self.tokens[child])
    }

    /// Indices of `index` and all its descendants, in document order
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        let mut seen = vec![false; self.tokens.len()];
        let mut stack = vec![index];
        let mut result = Vec::new();

        while let Some(current) = stack.pop() {
            if seen[current] {
                continue;
            }
            seen[current] = true;
            result.push(current);
            stack.extend(self.tokens[current].children.iter().copied());
        }

        result.sort_unstable();
        result
    }

    pub fn noun_chunks(&self) -> &[NounChunk] {
        &self.noun_chunks
    }

    pub fn chunk_tokens(&self, chunk: &NounChunk) -> &[AnnotatedToken] {
        &self.tokens[chunk.indices()]
    }
}

/// Produces annotated documents from raw text
///
/// Implementations must be deterministic: the same text always yields the same
/// document.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> Document;
}

lazy_static! {
    /// Numbers (with decimal or fraction part), words with inner apostrophes or
    /// hyphens, or any other single non-space character
    static ref TOKEN_REGEX: Regex =
        Regex::new(r"\d+(?:[./]\d+)?|\p{L}+(?:['’-]\p{L}+)*|\S")
            .expect("Token pattern should be valid");
    static ref NUMERIC_REGEX: Regex =
        Regex::new(r"^(?:\d+(?:\.\d+)?|\d+/\d+)$").expect("Numeric pattern should be valid");
}

/// English number words recognized as numeric-like
pub static NUMBER_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
        "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
        "eighteen", "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy",
        "eighty", "ninety", "hundred", "half", "dozen",
    ]
    .into_iter()
    .collect()
});

static DETERMINERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "some", "this", "that", "these", "those", "my", "your", "his",
        "her", "its", "our", "their", "another", "each", "every", "any", "no", "several",
        "many", "much", "more", "few", "all", "both",
    ]
    .into_iter()
    .collect()
});

static ADPOSITIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "of", "in", "with", "without", "on", "at", "for", "from", "to", "into", "onto",
        "over", "after", "before", "during", "by", "about", "alongside", "than", "per",
    ]
    .into_iter()
    .collect()
});

static CONJUNCTIONS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["and", "or", "but", "nor", "plus"].into_iter().collect());

static PRONOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "me", "we", "us", "you", "he", "him", "she", "it", "they", "them", "myself",
        "ourselves", "something", "nothing",
    ]
    .into_iter()
    .collect()
});

static VERBS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ate", "eat", "eats", "eating", "eaten", "had", "have", "has", "having", "drank",
        "drink", "drinks", "drinking", "drunk", "took", "take", "takes", "grabbed", "grab",
        "enjoyed", "enjoy", "finished", "snacked", "consumed", "was", "were", "is", "are",
        "am", "be", "been", "got", "get", "made", "ordered", "skipped", "tried",
    ]
    .into_iter()
    .collect()
});

static ADVERBS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "then", "also", "later", "too", "very", "just", "only", "again", "afterwards",
        "afterward", "today", "yesterday", "tonight", "not",
    ]
    .into_iter()
    .collect()
});

static ADJECTIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "large", "small", "big", "medium", "little", "whole", "fresh", "fried", "grilled",
        "boiled", "baked", "roasted", "steamed", "scrambled", "mashed", "toasted", "raw",
        "cooked", "hot", "cold", "warm", "sweet", "plain", "white", "brown", "red", "green",
        "black", "dark", "skimmed", "skim", "low", "extra", "homemade", "spicy", "crispy",
        "creamy", "chopped", "sliced", "diced", "frozen", "dried", "light", "heavy",
        "regular", "full", "lean", "sugar-free",
    ]
    .into_iter()
    .collect()
});

fn is_numeric_text(text: &str) -> bool {
    NUMERIC_REGEX.is_match(text)
}

fn is_sentence_end(text: &str) -> bool {
    matches!(text, "." | "!" | "?" | ";")
}

/// A noun phrase found by the annotator: token range and head index
#[derive(Debug, Clone, Copy)]
struct Phrase {
    start: usize,
    end: usize,
    head: usize,
}

/// Deterministic word-list and pattern based annotator
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAnnotator;

impl RuleBasedAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Tag a single lowercase word or symbol
    fn tag(text: &str) -> PartOfSpeech {
        let lower = text.to_lowercase();
        let word = lower.as_str();

        if text.chars().all(|c| !c.is_alphanumeric()) {
            PartOfSpeech::Punctuation
        } else if is_numeric_text(word) || NUMBER_WORDS.contains(word) {
            PartOfSpeech::Numeral
        } else if DETERMINERS.contains(word) {
            PartOfSpeech::Determiner
        } else if ADPOSITIONS.contains(word) {
            PartOfSpeech::Adposition
        } else if CONJUNCTIONS.contains(word) {
            PartOfSpeech::Conjunction
        } else if PRONOUNS.contains(word) {
            PartOfSpeech::Pronoun
        } else if VERBS.contains(word) {
            PartOfSpeech::Verb
        } else if ADVERBS.contains(word) {
            PartOfSpeech::Adverb
        } else if ADJECTIVES.contains(word) {
            PartOfSpeech::Adjective
        } else {
            PartOfSpeech::Noun
        }
    }

    /// Split token positions into sentences
    fn sentences(tags: &[(String, PartOfSpeech)]) -> Vec<Range<usize>> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for (i, (text, _)) in tags.iter().enumerate() {
            if is_sentence_end(text) {
                sentences.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < tags.len() {
            sentences.push(start..tags.len());
        }
        sentences
    }

    /// Find noun phrases in one sentence
    ///
    /// Pattern: (NUM)? (DET)? (NUM|ADJ)* NOUN+, or a lone pronoun
    fn phrases(tags: &[(String, PartOfSpeech)], sentence: Range<usize>) -> Vec<Phrase> {
        let mut phrases = Vec::new();
        let mut i = sentence.start;

        while i < sentence.end {
            let pos = tags[i].1;
            if pos == PartOfSpeech::Pronoun {
                phrases.push(Phrase {
                    start: i,
                    end: i + 1,
                    head: i,
                });
                i += 1;
                continue;
            }

            let mut end = i;
            // predeterminer: "half a cup"
            if pos == PartOfSpeech::Numeral
                && end + 1 < sentence.end
                && tags[end + 1].1 == PartOfSpeech::Determiner
            {
                end += 1;
            }
            if tags[end].1 == PartOfSpeech::Determiner {
                end += 1;
            }
            while end < sentence.end
                && matches!(tags[end].1, PartOfSpeech::Numeral | PartOfSpeech::Adjective)
            {
                end += 1;
            }
            let noun_start = end;
            while end < sentence.end && tags[end].1.is_noun() {
                end += 1;
            }

            if end > noun_start {
                phrases.push(Phrase {
                    start: i,
                    end,
                    head: end - 1,
                });
                i = end;
            } else {
                i += 1;
            }
        }

        phrases
    }

    /// Assign heads within one sentence
    fn attach(
        tags: &[(String, PartOfSpeech)],
        sentence: Range<usize>,
        phrases: &[Phrase],
        heads: &mut [usize],
    ) {
        let mut phrase_of = vec![None; tags.len()];
        for (p, phrase) in phrases.iter().enumerate() {
            for i in phrase.start..phrase.end {
                phrase_of[i] = Some(p);
                heads[i] = phrase.head;
            }
        }

        let root = sentence
            .clone()
            .find(|&i| tags[i].1 == PartOfSpeech::Verb)
            .or_else(|| phrases.first().map(|p| p.head))
            .unwrap_or(sentence.start);
        heads[root] = root;

        // Nearest preceding phrase head or verb, and the nearest one not governed by
        // a preposition.
        let mut last_anchor: Option<usize> = None;
        let mut clause_anchor: Option<usize> = None;
        let mut pending_adposition: Option<usize> = None;
        let mut pending_conjunction = false;

        for i in sentence.clone() {
            let pos = tags[i].1;

            if let Some(p) = phrase_of[i] {
                if phrases[p].head != i {
                    continue;
                }
                if i != root {
                    heads[i] = if let Some(adposition) = pending_adposition {
                        adposition
                    } else if pending_conjunction {
                        clause_anchor.unwrap_or(root)
                    } else {
                        root
                    };
                }
                if pending_adposition.is_none() || i == root {
                    clause_anchor = Some(i);
                }
                pending_adposition = None;
                pending_conjunction = false;
                last_anchor = Some(i);
                continue;
            }

            if i == root {
                last_anchor = Some(i);
                clause_anchor = Some(i);
                continue;
            }

            match pos {
                PartOfSpeech::Adposition => {
                    heads[i] = last_anchor.unwrap_or(root);
                    pending_adposition = Some(i);
                }
                PartOfSpeech::Verb => {
                    heads[i] = root;
                    last_anchor = Some(i);
                    clause_anchor = Some(i);
                    pending_adposition = None;
                }
                PartOfSpeech::Conjunction => {
                    heads[i] = clause_anchor.unwrap_or(root);
                    pending_conjunction = true;
                }
                PartOfSpeech::Punctuation => {
                    heads[i] = clause_anchor.unwrap_or(root);
                }
                PartOfSpeech::Numeral => {
                    let next_head = phrases.iter().find(|p| p.start > i).map(|p| p.head);
                    heads[i] = last_anchor.or(next_head).unwrap_or(root);
                }
                _ => {
                    heads[i] = last_anchor.unwrap_or(root);
                }
            }
        }
    }
}

impl Annotator for RuleBasedAnnotator {
    fn annotate(&self, text: &str) -> Document {
        let tags: Vec<(String, PartOfSpeech)> = TOKEN_REGEX
            .find_iter(text)
            .map(|m| {
                let token = m.as_str().to_string();
                let pos = Self::tag(&token);
                (token, pos)
            })
            .collect();

        let mut heads: Vec<usize> = (0..tags.len()).collect();
        let mut chunks = Vec::new();

        for sentence in Self::sentences(&tags) {
            let phrases = Self::phrases(&tags, sentence.clone());
            Self::attach(&tags, sentence, &phrases, &mut heads);
            chunks.extend(phrases.iter().map(|p| NounChunk {
                start: p.start,
                end: p.end,
            }));
        }

        let tokens = tags
            .into_iter()
            .zip(heads)
            .enumerate()
            .map(|(i, ((text, pos), head))| AnnotatedToken::new(i, text, pos, head))
            .collect::<Vec<_>>();

        for token in &tokens {
            trace!(
                "token {} '{}' {:?} -> head {}",
                token.index,
                token.text,
                token.pos,
                token.head
            );
        }

        let document = Document::new(tokens, chunks);
        debug!(
            "Annotated {} tokens into {} noun chunks",
            document.len(),
            document.noun_chunks().len()
        );
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotate(text: &str) -> Document {
        RuleBasedAnnotator::new().annotate(text)
    }

    fn index_of(doc: &Document, text: &str) -> usize {
        doc.tokens()
            .iter()
            .position(|t| t.text == text)
            .unwrap_or_else(|| panic!("token '{text}' not found"))
    }

    fn chunk_texts(doc: &Document) -> Vec<String> {
        doc.noun_chunks()
            .iter()
            .map(|c| {
                doc.chunk_tokens(c)
                    .iter()
                    .map(|t| t.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    #[test]
    fn test_tokenization() {
        let doc = annotate("I had 1.5 cups of rice, 1/2 apple and fish-cakes.");
        let texts: Vec<&str> = doc.tokens().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["I", "had", "1.5", "cups", "of", "rice", ",", "1/2", "apple", "and", "fish-cakes", "."]
        );
    }

    #[test]
    fn test_numeric_and_punctuation_flags() {
        let doc = annotate("two eggs, 3 toast");
        assert!(doc.token(0).like_num);
        assert!(!doc.token(1).like_num);
        assert!(doc.token(2).is_punct);
        assert!(doc.token(3).like_num);
        assert_eq!(doc.token(3).pos, PartOfSpeech::Numeral);
    }

    #[test]
    fn test_unit_of_food_structure() {
        let doc = annotate("two slices of cheesecake");
        let two = index_of(&doc, "two");
        let slices = index_of(&doc, "slices");
        let of = index_of(&doc, "of");
        let cheesecake = index_of(&doc, "cheesecake");

        assert_eq!(doc.token(two).head, slices);
        assert_eq!(doc.token(of).head, slices);
        assert_eq!(doc.token(cheesecake).head, of);
        assert!(doc.token(slices).is_root());
        assert_eq!(chunk_texts(&doc), vec!["two slices", "cheesecake"]);
    }

    #[test]
    fn test_conjunction_does_not_join_prepositional_object() {
        let doc = annotate("two slices of cheesecake and a cup of rice");
        let cheesecake = index_of(&doc, "cheesecake");
        assert_eq!(doc.subtree(cheesecake), vec![cheesecake]);

        let cup = index_of(&doc, "cup");
        let slices = index_of(&doc, "slices");
        assert_eq!(doc.token(cup).head, slices);
    }

    #[test]
    fn test_noun_chunks_with_determiners() {
        let doc = annotate("an apple and a banana");
        assert_eq!(chunk_texts(&doc), vec!["an apple", "a banana"]);
    }

    #[test]
    fn test_leading_number_word_joins_determiner_chunk() {
        let doc = annotate("half a cup of milk");
        assert_eq!(chunk_texts(&doc), vec!["half a cup", "milk"]);
        assert_eq!(doc.head(index_of(&doc, "half")).text, "cup");
    }

    #[test]
    fn test_adjectives_in_chunk() {
        let doc = annotate("I ate 2 slices of white bread");
        assert_eq!(chunk_texts(&doc), vec!["I", "2 slices", "white bread"]);
        let bread = index_of(&doc, "bread");
        let white = index_of(&doc, "white");
        assert_eq!(doc.subtree(bread), vec![white, bread]);
    }

    #[test]
    fn test_verb_is_root() {
        let doc = annotate("I had 3 eggs");
        let had = index_of(&doc, "had");
        let eggs = index_of(&doc, "eggs");
        assert!(doc.token(had).is_root());
        assert_eq!(doc.token(eggs).head, had);
        assert_eq!(doc.head(index_of(&doc, "3")).text, "eggs");
    }

    #[test]
    fn test_sentences_have_separate_roots() {
        let doc = annotate("toast. juice");
        assert!(doc.token(0).is_root());
        assert!(doc.token(2).is_root());
    }

    #[test]
    fn test_bare_number_attaches_to_previous_phrase() {
        let doc = annotate("pancakes 3");
        assert_eq!(doc.head(1).text, "pancakes");
    }

    #[test]
    fn test_document_new_rebuilds_children_and_fixes_heads() {
        let tokens = vec![
            AnnotatedToken::new(0, "2", PartOfSpeech::Numeral, 1),
            AnnotatedToken::new(1, "eggs", PartOfSpeech::Noun, 1),
            AnnotatedToken::new(2, "!", PartOfSpeech::Punctuation, 99),
        ];
        let doc = Document::new(tokens, vec![NounChunk { start: 0, end: 2 }, NounChunk { start: 1, end: 7 }]);
        assert_eq!(doc.token(1).children, vec![0]);
        assert!(doc.token(2).is_root());
        assert_eq!(doc.noun_chunks().len(), 1);
    }

    #[test]
    fn test_empty_text() {
        let doc = annotate("   ");
        assert!(doc.is_empty());
        assert!(doc.noun_chunks().is_empty());
    }

    #[test]
    fn test_deterministic() {
        let text = "a bowl of oatmeal with milk and 2 bananas";
        assert_eq!(annotate(text), annotate(text));
    }
}
