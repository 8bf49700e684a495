//! Duration parsing: ISO-8601 values from structured data and free-text
//! phrases scanned out of instruction prose.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{normalize_dashes, parse_number_token, replace_vulgar_fractions};

static ISO_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^P(?:(\d+(?:\.\d+)?)W)?(?:(\d+(?:\.\d+)?)D)?(?:T(?:(\d+(?:\.\d+)?)H)?(?:(\d+(?:\.\d+)?)M)?(?:(\d+(?:\.\d+)?)S)?)?$",
    )
    .unwrap()
});

static TEXT_DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:about |around |approximately |at least |up to |for |another |an additional |extra )?\s*(\d+(?:\.\d+)?(?:\s+\d+/\d+)?|\d+/\d+)(?:\s*-\s*(\d+(?:\.\d+)?(?:\s+\d+/\d+)?|\d+/\d+))?\s*(hours?|hrs?|h|minutes?|mins?|m)\b",
    )
    .unwrap()
});

/// Parse an ISO-8601-ish duration value into whole minutes.
///
/// Accepts a single value or a list of candidates; the first one shaped
/// like a duration (`P…` prefix or containing `T`) is parsed. Seconds are
/// rounded to the nearest minute. Returns None when no candidate matches
/// or the pattern carries no numeric fields.
pub fn minutes_from_iso8601(value: &Value) -> Option<u32> {
    let candidate = first_duration_candidate(value)?;
    parse_iso_minutes(&candidate)
}

fn first_duration_candidate(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if looks_like_duration(trimmed) {
                Some(trimmed.to_string())
            } else {
                None
            }
        }
        Value::Array(items) => items.iter().find_map(first_duration_candidate),
        _ => None,
    }
}

fn looks_like_duration(text: &str) -> bool {
    text.starts_with('P') || text.starts_with('p') || text.contains('T')
}

fn parse_iso_minutes(text: &str) -> Option<u32> {
    let caps = ISO_DURATION_RE.captures(text)?;
    if (1..=5).all(|i| caps.get(i).is_none()) {
        return None;
    }
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    let minutes = field(1) * 7.0 * 24.0 * 60.0
        + field(2) * 24.0 * 60.0
        + field(3) * 60.0
        + field(4)
        + field(5) / 60.0;
    Some(minutes.round().max(0.0) as u32)
}

/// Scan instruction prose for duration phrases ("Simmer for 20-25
/// minutes", "bake about 1½ hours") and return the maximum minute value
/// found across all matches. Ranges are averaged; hour units multiply by
/// 60. The maximum is read as the most conservative cook-time signal.
pub fn scan_text_minutes<'a>(texts: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    let mut best: Option<f64> = None;
    for text in texts {
        let prepared = normalize_dashes(&replace_vulgar_fractions(text));
        for caps in TEXT_DURATION_RE.captures_iter(&prepared) {
            let Some(low) = caps.get(1).and_then(|m| parse_number_token(m.as_str())) else {
                continue;
            };
            let value = match caps.get(2).and_then(|m| parse_number_token(m.as_str())) {
                Some(high) => (low + high) / 2.0,
                None => low,
            };
            let unit = caps.get(3).map(|m| m.as_str().to_lowercase()).unwrap_or_default();
            let minutes = if unit.starts_with('h') { value * 60.0 } else { value };
            best = Some(best.map_or(minutes, |b: f64| b.max(minutes)));
        }
    }
    best.map(|m| m.round() as u32)
}
