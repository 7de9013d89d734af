//! Ingredient text normalization.
//!
//! Turns a raw label string into ordered candidate tokens. Pure; no catalog
//! access. Duplicates are kept; the resolver deduplicates at the id level.
//!
//! Per fragment:
//!
//! ```text
//! "Organic Cane Sugar 12%"
//!   split ,;  ─▶ "Organic Cane Sugar 12%"
//!   trim, len ≥ 2, lowercase ─▶ "organic cane sugar 12%"
//!   strip (...) suffix + stray brackets
//!   strip trailing quantity ─▶ "organic cane sugar"
//!   fold descriptors/units  ─▶ "cane sugar"
//!   fold synonyms           ─▶ (unchanged)
//!   collapse whitespace     ─▶ "cane sugar"
//!   drop bare trailing number
//! ```
//!
//! A bare trailing number (`"salt 5"`) is dropped from the match token, but the
//! numbered form is kept on the token as well: it may be a real catalog name
//! such as "red dye 40", and the resolver tries it first.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One surviving fragment: what the label said, and what we match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedToken {
    pub raw: String,
    pub normalized: String,
    /// `normalized` before its bare trailing number was dropped.
    pub numbered: Option<String>,
}

/// Whole-token abbreviations expanded before catalog lookup.
static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("msg", "monosodium glutamate"),
        ("hfcs", "high fructose corn syrup"),
        ("bha", "butylated hydroxyanisole"),
        ("bht", "butylated hydroxytoluene"),
        ("tbhq", "tert-butylhydroquinone"),
        ("edta", "ethylenediaminetetraacetic acid"),
        ("mct", "medium chain triglycerides"),
        ("sls", "sodium lauryl sulfate"),
    ])
});

/// Chemical names folded to their common vitamin form.
static VITAMIN_SYNONYMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ascorbic acid", "vitamin c"),
        ("sodium ascorbate", "vitamin c"),
        ("l-ascorbic acid", "vitamin c"),
        ("tocopherol", "vitamin e"),
        ("tocopherols", "vitamin e"),
        ("mixed tocopherols", "vitamin e"),
        ("alpha-tocopherol", "vitamin e"),
        ("tocopheryl acetate", "vitamin e"),
        ("retinol", "vitamin a"),
        ("retinyl palmitate", "vitamin a"),
        ("beta-carotene", "vitamin a"),
        ("cholecalciferol", "vitamin d"),
        ("ergocalciferol", "vitamin d"),
        ("thiamine", "vitamin b1"),
        ("thiamin", "vitamin b1"),
        ("thiamine mononitrate", "vitamin b1"),
        ("riboflavin", "vitamin b2"),
        ("niacin", "vitamin b3"),
        ("niacinamide", "vitamin b3"),
        ("pantothenic acid", "vitamin b5"),
        ("calcium pantothenate", "vitamin b5"),
        ("pyridoxine", "vitamin b6"),
        ("pyridoxine hydrochloride", "vitamin b6"),
        ("biotin", "vitamin b7"),
        ("folic acid", "vitamin b9"),
        ("folate", "vitamin b9"),
        ("cobalamin", "vitamin b12"),
        ("cyanocobalamin", "vitamin b12"),
        ("methylcobalamin", "vitamin b12"),
        ("phylloquinone", "vitamin k"),
    ])
});

/// Normalize `raw` into match tokens. Empty or absent text yields no tokens.
pub fn normalize(raw: &str) -> Vec<String> {
    normalize_tokens(raw).into_iter().map(|t| t.normalized).collect()
}

/// Like [`normalize`] but keeps the original fragment next to each token.
pub fn normalize_tokens(raw: &str) -> Vec<NormalizedToken> {
    let body = regex!(r"(?i)^\s*ingredients?\s*:\s*").replace(raw, "");

    body.split([',', ';'])
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() >= 2)
        .filter_map(|fragment| {
            let full = normalize_fragment(fragment);
            if full.chars().count() < 2 {
                tracing::debug!(fragment, "fragment folded away during normalization");
                return None;
            }
            let (normalized, numbered) = split_bare_number(full);
            Some(NormalizedToken { raw: fragment.to_string(), normalized, numbered })
        })
        .collect()
}

fn normalize_fragment(fragment: &str) -> String {
    let lower = fragment.to_lowercase();

    // "(fd&c)" at the end, or a "(wheat flour" opened before a split comma.
    let s = regex!(r"\s*\([^)]*\)?\s*$").replace(&lower, "");
    let s = regex!(r"[()\[\]{}]").replace_all(&s, " ");
    let s = regex!(r"^\s*(?:contains\s+)?(?:less than\s+)?\d+(?:\.\d+)?\s*%\s*(?:or less\s+)?(?:of\s*:?)?\s*")
        .replace(&s, "");
    let s = regex!(r"\s*\d+(?:[.,]\d+)?\s*(?:%|mg|mcg|µg|g|kg|ml|l|iu|oz)\.?\s*$").replace(&s, "");

    let s = regex!(
        r"\b(?:certified|organic|natural|naturally|pure|fresh|dried|raw|refined|unrefined|partially|fully|hydrogenated|enriched|bleached|unbleached|cold[- ]pressed|extra virgin|virgin|non-gmo|filtered|concentrated|from concentrate|added)\b"
    )
    .replace_all(&s, " ");
    let s = regex!(r"\b\d+(?:\.\d+)?\s*(?:mg|mcg|µg|g|kg|ml|iu|oz)\b").replace_all(&s, " ");

    let collapsed = collapse_whitespace(&s);
    let expanded = ABBREVIATIONS.get(collapsed.as_str()).map(|s| s.to_string()).unwrap_or(collapsed);
    let folded = VITAMIN_SYNONYMS.get(expanded.as_str()).map(|s| s.to_string()).unwrap_or(expanded);

    folded.trim_matches(|c: char| c == '-' || c == '.' || c == '*' || c == ':' || c.is_whitespace()).to_string()
}

fn split_bare_number(full: String) -> (String, Option<String>) {
    let stripped = regex!(r"\s+\d+$").replace(&full, "").into_owned();
    if stripped.len() == full.len() || stripped.chars().count() < 2 {
        return (full, None);
    }
    (stripped, Some(full))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_blank_input_yield_nothing() {
        assert!(normalize("").is_empty());
        assert!(normalize("   ").is_empty());
        assert!(normalize(", ; ,").is_empty());
    }

    #[test]
    fn splits_on_commas_and_semicolons() {
        assert_eq!(normalize("Water; Salt, Sugar"), vec!["water", "salt", "sugar"]);
    }

    #[test]
    fn drops_single_character_fragments() {
        assert_eq!(normalize("a, Salt, ,b"), vec!["salt"]);
    }

    #[test]
    fn strips_parenthetical_suffix() {
        let tokens = normalize_tokens("Red Dye 40 (FD&C)");
        assert_eq!(tokens[0].normalized, "red dye");
        assert_eq!(tokens[0].numbered.as_deref(), Some("red dye 40"));
    }

    #[test]
    fn split_parenthetical_keeps_both_halves() {
        assert_eq!(normalize("Enriched Flour (Wheat Flour, Niacin)"), vec!["flour", "vitamin b3"]);
    }

    #[test]
    fn strips_trailing_quantities() {
        assert_eq!(normalize("Sugar 12%"), vec!["sugar"]);
        assert_eq!(normalize("Caffeine 80mg"), vec!["caffeine"]);
        assert_eq!(normalize("Salt 5"), vec!["salt"]);
    }

    #[test]
    fn bare_number_keeps_numbered_form() {
        let tokens = normalize_tokens("Omega 3, Salt");
        assert_eq!(tokens[0].normalized, "omega");
        assert_eq!(tokens[0].numbered.as_deref(), Some("omega 3"));
        assert_eq!(tokens[1].numbered, None);
    }

    #[test]
    fn glued_digits_are_not_a_quantity() {
        assert_eq!(normalize("Vitamin B12"), vec!["vitamin b12"]);
        assert_eq!(normalize("B 5"), vec!["b 5"]);
    }

    #[test]
    fn folds_descriptors_and_collapses_whitespace() {
        assert_eq!(normalize("Organic   Cane Sugar"), vec!["cane sugar"]);
        assert_eq!(normalize("Partially Hydrogenated Soybean Oil"), vec!["soybean oil"]);
    }

    #[test]
    fn descriptor_only_fragment_disappears() {
        assert_eq!(normalize("Organic, Salt"), vec!["salt"]);
    }

    #[test]
    fn folds_vitamin_synonyms_and_abbreviations() {
        assert_eq!(normalize("Ascorbic Acid, Mixed Tocopherols, MSG"), vec![
            "vitamin c",
            "vitamin e",
            "monosodium glutamate"
        ]);
    }

    #[test]
    fn strips_label_prefixes() {
        assert_eq!(normalize("Ingredients: Water, Contains 2% or less of: Salt"), vec!["water", "salt"]);
    }

    #[test]
    fn duplicates_are_retained_in_order() {
        assert_eq!(normalize("salt, sugar, Salt"), vec!["salt", "sugar", "salt"]);
    }

    #[test]
    fn keeps_raw_fragment() {
        let tokens = normalize_tokens("Organic Sugar");
        assert_eq!(tokens, vec![NormalizedToken { raw: "Organic Sugar".into(), normalized: "sugar".into(), numbered: None }]);
    }
}
