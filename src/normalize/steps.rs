//! Step-list normalization and section-heading filtering.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Step;
use crate::normalize::decode_entities;

static SERVES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:serves?|servings?)\b").unwrap());

/// Section markers like "FOR THE GLAZE" are informational, not cooking
/// actions: a short line whose letters are entirely uppercase, a line
/// starting "for the", or a serves/servings line.
pub fn is_section_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.to_lowercase().starts_with("for the") {
        return true;
    }
    if SERVES_RE.is_match(trimmed) {
        return true;
    }
    if trimmed.split_whitespace().count() <= 4 {
        let mut has_letter = false;
        let all_upper = trimmed.chars().filter(|c| c.is_alphabetic()).all(|c| {
            has_letter = true;
            c.is_uppercase()
        });
        if has_letter && all_upper {
            return true;
        }
    }
    false
}

/// Decode, trim and number instruction lines, dropping empties and
/// section headings. Numbering is contiguous from 1 regardless of gaps in
/// the input.
pub fn normalize_steps(lines: impl IntoIterator<Item = String>) -> Vec<Step> {
    let mut steps = Vec::new();
    for line in lines {
        let text = decode_entities(&line)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if text.is_empty() || is_section_heading(&text) {
            continue;
        }
        steps.push(Step {
            n: (steps.len() + 1) as u32,
            text,
        });
    }
    steps
}
