pub mod coerce;
pub mod duration;
pub mod ingredient;
pub mod steps;
pub mod structured;
pub mod units;

use html_escape::decode_html_entities;

/// Unicode vulgar fractions and their ASCII `n/d` equivalents
const VULGAR_FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅕', "1/5"),
    ('⅖', "2/5"),
    ('⅗', "3/5"),
    ('⅘', "4/5"),
    ('⅙', "1/6"),
    ('⅚', "5/6"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
];

fn decode_entities_once(text: &str) -> String {
    decode_html_entities(text).into_owned()
}

/// Decode HTML entities. Pages frequently double-encode (`&amp;amp;`),
/// so decode twice to get the correct string.
pub(crate) fn decode_entities(text: &str) -> String {
    decode_entities_once(&decode_entities_once(text))
}

/// Replace Unicode vulgar fractions with ASCII `n/d`, inserting a space
/// when the fraction directly follows a digit so "1½" reads "1 1/2".
pub(crate) fn replace_vulgar_fractions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_was_digit = false;
    for ch in text.chars() {
        if let Some((_, ascii)) = VULGAR_FRACTIONS.iter().find(|(c, _)| *c == ch) {
            if prev_was_digit {
                out.push(' ');
            }
            out.push_str(ascii);
            prev_was_digit = false;
        } else {
            out.push(ch);
            prev_was_digit = ch.is_ascii_digit();
        }
    }
    out
}

/// Normalize minus/en/em dash variants to a plain hyphen
pub(crate) fn normalize_dashes(text: &str) -> String {
    text.replace(['−', '–', '—'], "-")
}

/// Parse an integer, decimal, simple fraction (`a/b`) or mixed number
/// (`a b/c`) into a float. Returns None for malformed or zero-denominator
/// fractions.
pub(crate) fn parse_number_token(token: &str) -> Option<f64> {
    let token = token.trim();
    if let Some((whole, frac)) = token.split_once(char::is_whitespace) {
        let whole: f64 = whole.trim().parse().ok()?;
        return Some(whole + parse_fraction(frac.trim())?);
    }
    if token.contains('/') {
        return parse_fraction(token);
    }
    token.parse().ok()
}

fn parse_fraction(token: &str) -> Option<f64> {
    let (numerator, denominator) = token.split_once('/')?;
    let numerator: f64 = numerator.trim().parse().ok()?;
    let denominator: f64 = denominator.trim().parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator)
}

/// Format a quantity without a trailing `.0` for whole values
pub(crate) fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vulgar_fraction_substitution() {
        assert_eq!(replace_vulgar_fractions("½ cup"), "1/2 cup");
        assert_eq!(replace_vulgar_fractions("1½ cups"), "1 1/2 cups");
        assert_eq!(replace_vulgar_fractions("add ¾ tsp"), "add 3/4 tsp");
    }

    #[test]
    fn test_parse_number_token() {
        assert_eq!(parse_number_token("2"), Some(2.0));
        assert_eq!(parse_number_token("2.5"), Some(2.5));
        assert_eq!(parse_number_token("1/2"), Some(0.5));
        assert_eq!(parse_number_token("1 1/2"), Some(1.5));
        assert_eq!(parse_number_token("1/0"), None);
        assert_eq!(parse_number_token("abc"), None);
    }

    #[test]
    fn test_decode_entities_handles_double_encoding() {
        assert_eq!(decode_entities("Mac &amp;amp; Cheese"), "Mac & Cheese");
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
    }

    #[test]
    fn test_format_quantity() {
        assert_eq!(format_quantity(3.0), "3");
        assert_eq!(format_quantity(1.5), "1.5");
    }
}
