//! Ingredient-line parsing: "1 1/2 cups flour, divided" into quantity,
//! unit, item and note.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Ingredient;
use crate::normalize::units::canonical_unit;
use crate::normalize::{
    decode_entities, format_quantity, normalize_dashes, parse_number_token,
    replace_vulgar_fractions,
};

const NUMBER_PATTERN: &str = r"\d+\s+\d+/\d+|\d+/\d+|\d+(?:\.\d+)?";

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^({NUMBER_PATTERN})\s*(?:-|to)\s*({NUMBER_PATTERN})\b"
    ))
    .unwrap()
});

static SINGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({NUMBER_PATTERN})")).unwrap());

static UNIT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z.]*").unwrap());

/// Parse one raw ingredient line. Returns None for lines that are empty
/// after decoding; everything else yields at least a verbatim `original`.
pub fn parse_ingredient_line(line: &str) -> Option<Ingredient> {
    let decoded = decode_entities(line);
    let original = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if original.is_empty() {
        return None;
    }

    let working = normalize_dashes(&replace_vulgar_fractions(&original));
    let mut rest = working.as_str();
    let mut notes: Vec<String> = Vec::new();

    // quantity: a range takes the minimum bound, a single number parses
    // directly; no match consumes nothing
    let mut quantity: Option<f64> = None;
    if let Some(caps) = RANGE_RE.captures(rest) {
        let low = parse_number_token(&caps[1]);
        let high = parse_number_token(&caps[2]);
        if let (Some(low), Some(high)) = (low, high) {
            if (low - high).abs() > f64::EPSILON {
                quantity = Some(low.min(high));
                notes.push(format!(
                    "range {} - {}",
                    format_quantity(low.min(high)),
                    format_quantity(low.max(high))
                ));
            } else {
                quantity = Some(low);
            }
            rest = &rest[caps.get(0).unwrap().end()..];
        }
    }
    if quantity.is_none() {
        if let Some(caps) = SINGLE_RE.captures(rest) {
            if let Some(value) = parse_number_token(&caps[1]) {
                quantity = Some(value);
                rest = &rest[caps.get(0).unwrap().end()..];
            }
        }
    }
    rest = rest.trim_start();

    // parenthesized prefix remarks become notes before unit detection,
    // e.g. "(about 2 lbs) chicken thighs"
    loop {
        rest = rest.trim_start();
        if !rest.starts_with('(') {
            break;
        }
        match matching_close_paren(rest) {
            Some(close) => {
                notes.push(rest[1..close].to_string());
                rest = &rest[close + 1..];
            }
            None => break,
        }
    }

    // unit token: only consumed when the alias table recognizes it
    let mut unit: Option<String> = None;
    if let Some(token) = UNIT_TOKEN_RE.find(rest) {
        if let Some(canonical) = canonical_unit(token.as_str()) {
            unit = Some(canonical.to_string());
            rest = rest[token.end()..].trim_start();
        }
    }

    let mut item_text = rest.trim().to_string();

    // trailing parenthesized remarks, innermost last
    loop {
        let trimmed = item_text.trim_end();
        if !trimmed.ends_with(')') {
            item_text = trimmed.to_string();
            break;
        }
        match matching_open_paren(trimmed) {
            Some(open) => {
                notes.push(trimmed[open + 1..trimmed.len() - 1].to_string());
                item_text = trimmed[..open].trim_end().to_string();
            }
            None => {
                item_text = trimmed.to_string();
                break;
            }
        }
    }

    // first comma outside parentheses splits item from note
    if let Some(idx) = first_comma_outside_parens(&item_text) {
        let after = item_text[idx + 1..].trim().to_string();
        if !after.is_empty() {
            notes.push(after);
        }
        item_text.truncate(idx);
    }

    // "cups of flour" leaves an "of " connector behind
    if item_text.to_lowercase().starts_with("of ") {
        item_text = item_text[3..].trim_start().to_string();
    }

    let item_text = item_text
        .trim_end()
        .trim_end_matches('*')
        .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ';' | ':' | '.'))
        .trim()
        .to_string();

    let note_fragments: Vec<String> = notes
        .iter()
        .map(|fragment| {
            fragment
                .trim_start_matches(|c: char| {
                    c.is_whitespace() || matches!(c, '-' | ',' | ';' | ':' | '.')
                })
                .trim_end_matches(|c: char| c.is_whitespace() || c == '*')
                .to_string()
        })
        .filter(|fragment| !fragment.is_empty())
        .collect();
    let note = if note_fragments.is_empty() {
        None
    } else {
        Some(note_fragments.join("; "))
    };

    Some(Ingredient {
        original,
        quantity,
        unit,
        item: if item_text.is_empty() {
            None
        } else {
            Some(item_text)
        },
        note,
    })
}

fn matching_close_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn matching_open_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices().rev() {
        match ch {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn first_comma_outside_parens(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_number_with_unit() {
        let ing = parse_ingredient_line("1 1/2 cups flour").unwrap();
        assert_eq!(ing.quantity, Some(1.5));
        assert_eq!(ing.unit.as_deref(), Some("cup"));
        assert_eq!(ing.item.as_deref(), Some("flour"));
        assert_eq!(ing.note, None);
        assert_eq!(ing.original, "1 1/2 cups flour");
    }

    #[test]
    fn test_comma_note() {
        let ing = parse_ingredient_line("2 tbsp olive oil, divided").unwrap();
        assert_eq!(ing.quantity, Some(2.0));
        assert_eq!(ing.unit.as_deref(), Some("tbsp"));
        assert_eq!(ing.item.as_deref(), Some("olive oil"));
        assert_eq!(ing.note.as_deref(), Some("divided"));
    }

    #[test]
    fn test_range_takes_minimum_and_records_note() {
        let ing = parse_ingredient_line("3-4 cloves garlic, minced").unwrap();
        assert_eq!(ing.quantity, Some(3.0));
        assert_eq!(ing.unit.as_deref(), Some("clove"));
        assert_eq!(ing.item.as_deref(), Some("garlic"));
        let note = ing.note.unwrap();
        assert!(note.contains("range 3 - 4"), "note was: {note}");
        assert!(note.contains("minced"));
    }

    #[test]
    fn test_no_quantity_keeps_full_item() {
        let ing = parse_ingredient_line("Salt to taste").unwrap();
        assert_eq!(ing.quantity, None);
        assert_eq!(ing.unit, None);
        assert_eq!(ing.item.as_deref(), Some("Salt to taste"));
        assert_eq!(ing.note, None);
    }

    #[test]
    fn test_vulgar_fraction_quantity() {
        let ing = parse_ingredient_line("½ cup sugar").unwrap();
        assert_eq!(ing.quantity, Some(0.5));
        assert_eq!(ing.unit.as_deref(), Some("cup"));
        assert_eq!(ing.item.as_deref(), Some("sugar"));
        assert_eq!(ing.original, "½ cup sugar");
    }

    #[test]
    fn test_equal_range_bounds_have_no_range_note() {
        let ing = parse_ingredient_line("2-2 cups stock").unwrap();
        assert_eq!(ing.quantity, Some(2.0));
        assert_eq!(ing.note, None);
    }

    #[test]
    fn test_parenthesized_prefix_remark() {
        let ing = parse_ingredient_line("1 (about 2 lbs) whole chicken").unwrap();
        assert_eq!(ing.quantity, Some(1.0));
        assert_eq!(ing.unit, None);
        assert_eq!(ing.item.as_deref(), Some("whole chicken"));
        assert_eq!(ing.note.as_deref(), Some("about 2 lbs"));
    }

    #[test]
    fn test_trailing_parenthesized_remark() {
        let ing = parse_ingredient_line("2 cups basil leaves (loosely packed)").unwrap();
        assert_eq!(ing.unit.as_deref(), Some("cup"));
        assert_eq!(ing.item.as_deref(), Some("basil leaves"));
        assert_eq!(ing.note.as_deref(), Some("loosely packed"));
    }

    #[test]
    fn test_of_connector_stripped() {
        let ing = parse_ingredient_line("2 cups of flour").unwrap();
        assert_eq!(ing.item.as_deref(), Some("flour"));
    }

    #[test]
    fn test_footnote_asterisk_stripped() {
        let ing = parse_ingredient_line("1 cup vegetable broth*").unwrap();
        assert_eq!(ing.item.as_deref(), Some("vegetable broth"));
    }

    #[test]
    fn test_adjective_never_taken_as_unit() {
        let ing = parse_ingredient_line("2 large eggs").unwrap();
        assert_eq!(ing.quantity, Some(2.0));
        assert_eq!(ing.unit, None);
        assert_eq!(ing.item.as_deref(), Some("large eggs"));
    }

    #[test]
    fn test_entity_decoding() {
        let ing = parse_ingredient_line("1 cup half &amp; half").unwrap();
        assert_eq!(ing.original, "1 cup half & half");
        assert_eq!(ing.item.as_deref(), Some("half & half"));
    }

    #[test]
    fn test_empty_line_is_discarded() {
        assert!(parse_ingredient_line("   ").is_none());
        assert!(parse_ingredient_line("").is_none());
    }

    #[test]
    fn test_reparse_of_original_is_idempotent() {
        let lines = [
            "1 1/2 cups flour",
            "2 tbsp olive oil, divided",
            "3-4 cloves garlic, minced",
            "Salt to taste",
        ];
        for line in lines {
            let first = parse_ingredient_line(line).unwrap();
            let second = parse_ingredient_line(&first.original).unwrap();
            assert_eq!(first.quantity, second.quantity, "line: {line}");
            assert_eq!(first.unit, second.unit, "line: {line}");
            assert_eq!(first.item, second.item, "line: {line}");
            assert_eq!(first.note, second.note, "line: {line}");
        }
    }
}
