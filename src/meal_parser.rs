//! # Meal Parser
//!
//! This module turns annotated meal text into `(food_name, quantity)` items.
//!
//! ## Stages
//!
//! 1. **Quantity extraction**: every numeric-like token is paired with the food
//!    phrase it governs. "N <unit> of <food>" yields `"<unit> of <food>"`; any other
//!    number takes the noun chunk around its head word.
//! 2. **Residual collection**: noun chunks that share no token with stage 1 become
//!    quantity-1 items ("an apple" -> `("apple", 1.0)`).
//!
//! Both stages share a [`ConsumedTokens`] bitset that is passed explicitly.
//!
//! ## Usage
//!
//! ```rust
//! use glycomeal::annotation::RuleBasedAnnotator;
//! use glycomeal::meal_parser::parse_meals;
//!
//! let items = parse_meals(&RuleBasedAnnotator::new(), "two slices of cheesecake");
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].food_name, "slices of cheesecake");
//! assert_eq!(items[0].quantity, 2.0);
//! ```

use crate::annotation::{Annotator, Document, NounChunk};
use crate::meal_model::ExtractedItem;
use crate::text_processing::{clean_name, is_unit_word, parse_quantity};
use log::{debug, info, trace};

/// Tokens already attributed to an extracted item, indexed like the document arena
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedTokens {
    flags: Vec<bool>,
}

impl ConsumedTokens {
    /// A bitset with every token of a `len`-token document unconsumed
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
        }
    }

    pub fn mark(&mut self, index: usize) {
        if let Some(flag) = self.flags.get_mut(index) {
            *flag = true;
        }
    }

    pub fn is_consumed(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// True if any token of the chunk is consumed
    pub fn overlaps(&self, chunk: &NounChunk) -> bool {
        chunk.indices().any(|i| self.is_consumed(i))
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&flag| flag).count()
    }
}

/// Build the "<unit> of <food>" name for a unit head word, consuming the food subtree
fn unit_phrase(doc: &Document, unit: usize, consumed: &mut ConsumedTokens) -> Option<String> {
    let of = doc
        .children(unit)
        .find(|child| child.text.eq_ignore_ascii_case("of"))?;
    let food = doc.children(of.index).find(|child| child.pos.is_noun())?;

    let subtree = doc.subtree(food.index);
    let base_name = clean_name(subtree.iter().map(|&i| doc.token(i)));
    for &i in &subtree {
        consumed.mark(i);
    }

    Some(format!("{} of {}", doc.token(unit).text.to_lowercase(), base_name))
}

/// Name the food governed by a non-unit head word, consuming what was used
fn head_phrase(doc: &Document, head: usize, consumed: &mut ConsumedTokens) -> String {
    if let Some(chunk) = doc.noun_chunks().iter().find(|chunk| chunk.contains(head)) {
        let name = clean_name(doc.chunk_tokens(chunk));
        for i in chunk.indices() {
            consumed.mark(i);
        }
        if !name.is_empty() {
            return name;
        }
    }

    consumed.mark(head);
    doc.token(head).text.to_lowercase()
}

/// Pair every numeric-like token with its food phrase
///
/// Tokens whose quantity cannot be parsed are skipped and left unconsumed. For all
/// other numeric tokens the token itself is marked consumed whether or not an item
/// is emitted; an item is emitted only when its name is longer than one character.
pub fn extract_quantities(doc: &Document, consumed: &mut ConsumedTokens) -> Vec<ExtractedItem> {
    let mut items = Vec::new();

    for token in doc.tokens().iter().filter(|t| t.like_num) {
        let Some(quantity) = parse_quantity(&token.text) else {
            trace!("Skipping unparseable quantity '{}'", token.text);
            continue;
        };

        let head = doc.head(token.index);
        let food_name = if is_unit_word(&head.text) {
            unit_phrase(doc, head.index, consumed).unwrap_or_default()
        } else {
            head_phrase(doc, head.index, consumed)
        };

        consumed.mark(token.index);

        if food_name.chars().count() > 1 {
            let item = ExtractedItem::new(food_name, quantity);
            debug!("Extracted {}", item);
            items.push(item);
        } else {
            trace!(
                "No food phrase for quantity '{}' (head '{}')",
                token.text,
                head.text
            );
        }
    }

    items
}

/// Add quantity-1 items for noun chunks the extractor did not touch
///
/// A chunk sharing any consumed token is skipped. Names of two characters or
/// fewer, and names already present in `items` (exact match), are not added.
pub fn collect_residual_chunks(
    doc: &Document,
    consumed: &ConsumedTokens,
    items: &mut Vec<ExtractedItem>,
) {
    for chunk in doc.noun_chunks() {
        if consumed.overlaps(chunk) {
            continue;
        }

        let name = clean_name(doc.chunk_tokens(chunk));
        if name.chars().count() > 2 && !items.iter().any(|item| item.food_name == name) {
            let item = ExtractedItem::new(name, 1.0);
            debug!("Collected implicit item {}", item);
            items.push(item);
        }
    }
}

/// Run both extraction stages over an annotated document
pub fn parse_document(doc: &Document) -> Vec<ExtractedItem> {
    let mut consumed = ConsumedTokens::new(doc.len());
    let mut items = extract_quantities(doc, &mut consumed);
    collect_residual_chunks(doc, &consumed, &mut items);
    items
}

/// Annotate meal text and extract its food items
///
/// Returns an empty list for blank text.
pub fn parse_meals<A: Annotator + ?Sized>(annotator: &A, text: &str) -> Vec<ExtractedItem> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let doc = annotator.annotate(text);
    let items = parse_document(&doc);
    info!(
        "Parsed {} food items from {} tokens",
        items.len(),
        doc.len()
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotatedToken, PartOfSpeech, RuleBasedAnnotator};

    fn parse(text: &str) -> Vec<(String, f64)> {
        parse_meals(&RuleBasedAnnotator::new(), text)
            .into_iter()
            .map(|item| (item.food_name, item.quantity))
            .collect()
    }

    #[test]
    fn test_unit_pattern() {
        assert_eq!(parse("two slices of cheesecake"), vec![("slices of cheesecake".to_string(), 2.0)]);
        assert_eq!(parse("2 cups of rice"), vec![("cups of rice".to_string(), 2.0)]);
        assert_eq!(parse("1 Bowl of Oatmeal"), vec![("bowl of oatmeal".to_string(), 1.0)]);
    }

    #[test]
    fn test_unit_pattern_consumes_numeric_and_subtree() {
        let doc = RuleBasedAnnotator::new().annotate("3 glasses of orange juice");
        let mut consumed = ConsumedTokens::new(doc.len());
        let items = extract_quantities(&doc, &mut consumed);

        assert_eq!(items, vec![ExtractedItem::new("glasses of orange juice", 3.0)]);
        // "3", "orange", "juice"; the unit word and "of" stay unconsumed
        assert_eq!(consumed.count(), 3);
        assert!(consumed.is_consumed(0));
        assert!(!consumed.is_consumed(1));
        assert!(!consumed.is_consumed(2));
    }

    #[test]
    fn test_number_word_before_determiner() {
        assert_eq!(parse("half a cup of milk"), vec![("cup of milk".to_string(), 0.5)]);
        assert_eq!(parse("a half cup of milk"), vec![("cup of milk".to_string(), 0.5)]);
    }

    #[test]
    fn test_noun_chunk_quantity() {
        assert_eq!(parse("I had 3 eggs"), vec![("eggs".to_string(), 3.0)]);
        assert_eq!(parse("2 boiled eggs"), vec![("boiled eggs".to_string(), 2.0)]);
    }

    #[test]
    fn test_implicit_items() {
        assert_eq!(
            parse("an apple and a banana"),
            vec![("apple".to_string(), 1.0), ("banana".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_mixed_explicit_and_implicit() {
        assert_eq!(
            parse("two slices of cheesecake and a cup of rice"),
            vec![
                ("slices of cheesecake".to_string(), 2.0),
                ("cup".to_string(), 1.0),
                ("rice".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_same_name_from_extractor_is_not_repeated_by_collector() {
        assert_eq!(
            parse("2 eggs. eggs"),
            vec![("eggs".to_string(), 2.0)]
        );
    }

    #[test]
    fn test_repeated_quantities_are_not_merged() {
        assert_eq!(
            parse("1 toast and 1 toast"),
            vec![("toast".to_string(), 1.0), ("toast".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_short_names_are_dropped() {
        // "I" is a chunk of one character, "ox" has two
        assert_eq!(parse("I ox"), Vec::<(String, f64)>::new());
    }

    #[test]
    fn test_unit_without_of_emits_nothing_but_consumes_number() {
        let doc = RuleBasedAnnotator::new().annotate("2 cups");
        let mut consumed = ConsumedTokens::new(doc.len());
        let items = extract_quantities(&doc, &mut consumed);
        assert!(items.is_empty());
        assert!(consumed.is_consumed(0));

        // the "2 cups" chunk overlaps the consumed number
        let mut all = items;
        collect_residual_chunks(&doc, &consumed, &mut all);
        assert!(all.is_empty());
    }

    #[test]
    fn test_head_without_chunk_uses_head_text() {
        // hand-built document: "2" governed by a verb that is in no chunk
        let tokens = vec![
            AnnotatedToken::new(0, "Ate", PartOfSpeech::Verb, 0),
            AnnotatedToken::new(1, "2", PartOfSpeech::Numeral, 0),
        ];
        let doc = Document::new(tokens, vec![]);
        let mut consumed = ConsumedTokens::new(doc.len());
        let items = extract_quantities(&doc, &mut consumed);
        assert_eq!(items, vec![ExtractedItem::new("ate", 2.0)]);
        assert!(consumed.is_consumed(0));
        assert!(consumed.is_consumed(1));
    }

    #[test]
    fn test_unparseable_number_is_not_consumed() {
        let mut tokens = vec![
            AnnotatedToken::new(0, "million", PartOfSpeech::Numeral, 1),
            AnnotatedToken::new(1, "grapes", PartOfSpeech::Noun, 1),
        ];
        tokens[0].like_num = true;
        let doc = Document::new(tokens, vec![NounChunk { start: 0, end: 2 }]);
        let items = parse_document(&doc);
        assert_eq!(items, vec![ExtractedItem::new("grapes", 1.0)]);
    }

    #[test]
    fn test_blank_text() {
        assert!(parse("   ").is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_consumed_tokens_bounds() {
        let mut consumed = ConsumedTokens::new(2);
        consumed.mark(5);
        assert!(!consumed.is_consumed(5));
        assert_eq!(consumed.count(), 0);
    }
}
