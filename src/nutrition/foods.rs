//! Static food-to-nutrient lookup used when a logged item carries no
//! nutrient estimate of its own. Entries are per 100 g; lookups scale by the
//! item's quantity.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::nutrition::nutrients::{Nutrient, NutrientVector};

const FOOD_TABLE_JSON: &str = include_str!("foods.json");

/// Synonyms checked after direct containment fails.
const KEYWORDS: &[(&str, &str)] = &[
    ("chicken", "chicken_breast_100g"),
    ("salmon", "salmon_100g"),
    ("fish", "salmon_100g"),
    ("spinach", "spinach_100g"),
    ("broccoli", "broccoli_100g"),
    ("egg", "eggs_100g"),
    ("milk", "milk_100ml"),
    ("yogurt", "yogurt_100g"),
    ("bread", "whole_grain_bread_100g"),
    ("rice", "brown_rice_100g_cooked"),
    ("lentil", "lentils_100g_cooked"),
    ("avocado", "avocado_100g"),
    ("banana", "banana_100g"),
    ("orange", "orange_100g"),
    ("almond", "almonds_100g"),
    ("cheese", "cheese_100g"),
];

lazy_static! {
    static ref FOOD_TABLE: BTreeMap<String, NutrientVector> =
        serde_json::from_str(FOOD_TABLE_JSON).expect("embedded food table is valid JSON");
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9 ]+").unwrap();
}

fn table() -> &'static BTreeMap<String, NutrientVector> {
    &FOOD_TABLE
}

fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cleaned = NON_ALNUM.replace_all(&lowered, " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "chicken_breast_100g" -> "chicken breast"
fn key_base(key: &str) -> String {
    key.replace("_100g", "")
        .replace("_100ml", "")
        .replace("_cooked", "")
        .replace('_', " ")
}

/// Resolves a free-text food name to a canonical table key. Stages are tried
/// in fixed priority order: substring containment, keyword dictionary,
/// partial word match. First hit wins.
pub fn find_food_key(name: &str) -> Option<&'static str> {
    let name = normalize(name);
    if name.is_empty() {
        return None;
    }

    for key in table().keys() {
        let base = key_base(key);
        if name.contains(&base) || base.contains(&name) {
            return Some(key.as_str());
        }
    }

    for &(keyword, key) in KEYWORDS {
        if name.contains(keyword) {
            return Some(key);
        }
    }

    // Partial word match: prefix overlap between the item's words and the
    // key-base words, e.g. "bananas" vs "banana". Short words match too
    // much, so both sides must carry at least four characters.
    for word in name.split(' ').filter(|w| w.len() >= 4) {
        for key in table().keys() {
            let base = key_base(key);
            if base
                .split(' ')
                .filter(|kw| kw.len() >= 4)
                .any(|kw| kw.starts_with(word) || word.starts_with(kw))
            {
                return Some(key.as_str());
            }
        }
    }

    None
}

/// Estimates the absolute nutrient contribution of `quantity_g` of the named
/// food. No match yields the zero vector; the meal is still recorded.
pub fn estimate(name: &str, quantity_g: u32) -> NutrientVector {
    match find_food_key(name).and_then(|key| table().get(key)) {
        Some(per_100g) => per_100g.scaled(f64::from(quantity_g) / 100.0),
        None => NutrientVector::zero(),
    }
}

/// Table keys ranked by how much of `nutrient` they carry, richest first.
/// Feeds the suggestion list shown next to a gap report.
pub fn foods_rich_in(nutrient: Nutrient) -> Vec<&'static str> {
    let mut entries: Vec<(&'static str, f64)> = table()
        .iter()
        .map(|(key, vector)| (key.as_str(), vector.get(nutrient)))
        .filter(|(_, amount)| *amount > 0.0)
        .collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1));
    entries.into_iter().map(|(key, _)| key).collect()
}

/// Human-readable suggestions for the largest deficits: the two richest
/// foods for each of the top three missing nutrients.
pub fn suggestions_for(missing: &BTreeMap<Nutrient, f64>) -> Vec<String> {
    let mut ranked: Vec<(&Nutrient, &f64)> = missing.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1));

    let mut suggestions = Vec::new();
    for (nutrient, _) in ranked.into_iter().take(3) {
        for key in foods_rich_in(*nutrient).into_iter().take(2) {
            let pretty = key_base(key);
            if !suggestions.contains(&pretty) {
                suggestions.push(pretty);
            }
        }
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_containment_matches_single_word_keys() {
        assert_eq!(find_food_key("spinach salad"), Some("spinach_100g"));
        assert_eq!(find_food_key("Fresh Broccoli!"), Some("broccoli_100g"));
        // Plurals still contain the singular key base.
        assert_eq!(find_food_key("two bananas"), Some("banana_100g"));
    }

    #[test]
    fn keyword_stage_resolves_synonyms() {
        assert_eq!(find_food_key("grilled chicken"), Some("chicken_breast_100g"));
        assert_eq!(find_food_key("white fish fillet"), Some("salmon_100g"));
    }

    #[test]
    fn partial_word_stage_matches_on_shared_words() {
        // Neither containment nor keywords fire for "toast"; the shared
        // "whole"/"grain" words resolve it.
        assert_eq!(find_food_key("whole grain toast"), Some("whole_grain_bread_100g"));
    }

    #[test]
    fn unmatched_name_yields_none_and_zero_estimate() {
        assert_eq!(find_food_key("mystery stew"), None);
        assert!(estimate("mystery stew", 250).is_zero());
    }

    #[test]
    fn estimate_scales_by_quantity() {
        // 150 g of chicken breast: 165 kcal per 100 g scaled by 1.5.
        let v = estimate("grilled chicken", 150);
        assert!((v.get(Nutrient::Calories) - 247.5).abs() < 1e-9);
        assert!((v.get(Nutrient::ProteinG) - 46.5).abs() < 1e-9);
    }

    #[test]
    fn foods_rich_in_ranks_descending() {
        let ranked = foods_rich_in(Nutrient::CalciumMg);
        assert_eq!(ranked.first().copied(), Some("cheese_100g"));
        assert!(ranked.len() > 1);
    }

    #[test]
    fn suggestions_cover_top_deficits_without_duplicates() {
        let mut missing = BTreeMap::new();
        missing.insert(Nutrient::CalciumMg, 800.0);
        missing.insert(Nutrient::IronMg, 15.0);
        let suggestions = suggestions_for(&missing);
        assert!(suggestions.contains(&"cheese".to_string()));
        let mut deduped = suggestions.clone();
        deduped.dedup();
        assert_eq!(suggestions, deduped);
    }
}
