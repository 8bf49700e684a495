//! Unit aliasing and measurement-system inference.

use crate::model::UnitSystem;

/// Map a lowercase, period-stripped token to its canonical unit symbol.
/// Returns None for tokens that are not measurement units, so adjectives
/// like "large" are never mis-classified.
pub fn canonical_unit(token: &str) -> Option<&'static str> {
    let cleaned = token.trim().to_lowercase().replace('.', "");
    let unit = match cleaned.as_str() {
        "tsp" | "tsps" | "teaspoon" | "teaspoons" => "tsp",
        "tbsp" | "tbsps" | "tbs" | "tbl" | "tablespoon" | "tablespoons" => "tbsp",
        "g" | "gr" | "gram" | "grams" => "g",
        "kg" | "kgs" | "kilogram" | "kilograms" => "kg",
        "ml" | "mls" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => "ml",
        "l" | "liter" | "liters" | "litre" | "litres" => "l",
        "cup" | "cups" => "cup",
        "oz" | "ozs" | "ounce" | "ounces" => "oz",
        "lb" | "lbs" | "pound" | "pounds" => "lb",
        "clove" | "cloves" => "clove",
        "can" | "cans" => "can",
        "pinch" | "pinches" => "pinch",
        "bunch" | "bunches" => "bunch",
        "slice" | "slices" => "slice",
        "sprig" | "sprigs" => "sprig",
        "strip" | "strips" => "strip",
        "stalk" | "stalks" => "stalk",
        "sheet" | "sheets" => "sheet",
        _ => return None,
    };
    Some(unit)
}

/// Normalize a unit token: alias-mapped when recognized, otherwise passed
/// through lowercased.
pub fn normalize_unit(token: &str) -> String {
    canonical_unit(token)
        .map(str::to_string)
        .unwrap_or_else(|| token.trim().to_lowercase().replace('.', ""))
}

const METRIC_ONLY: [&str; 4] = ["g", "kg", "ml", "l"];
const US_ONLY: [&str; 3] = ["cup", "oz", "lb"];
const NEUTRAL: [&str; 7] = ["tsp", "tbsp", "pinch", "bunch", "slice", "clove", "can"];

/// Infer the measurement system from observed ingredient units. Metric
/// wins on ties and when there is no unit evidence at all.
pub fn infer_unit_system<'a>(units: impl IntoIterator<Item = &'a str>) -> UnitSystem {
    let mut all_metric_or_neutral = true;
    let mut all_us_or_neutral = true;
    for unit in units {
        let unit = unit.to_lowercase();
        let unit = unit.as_str();
        let in_metric = METRIC_ONLY.contains(&unit) || NEUTRAL.contains(&unit);
        let in_us = US_ONLY.contains(&unit) || NEUTRAL.contains(&unit);
        if !in_metric {
            all_metric_or_neutral = false;
        }
        if !in_us {
            all_us_or_neutral = false;
        }
    }
    if all_us_or_neutral && !all_metric_or_neutral {
        UnitSystem::Us
    } else {
        UnitSystem::Metric
    }
}
