//! Verdict / ingredient consistency check.
//!
//! The last gate before a save. Compares the verdict about to be stored with
//! what the resolved ingredients and the product's category say:
//!
//! ```text
//! recommend + avoid ingredient    -> error    (vetoes save unless overridden)
//! recommend + caution ingredient  -> warning
//! category hazard substring hit   -> warning  (any verdict)
//! ```
//!
//! The veto is a normal result, not an error. Messages name the offending
//! ingredients and category so the operator sees exactly what conflicts.

use super::catalog::CatalogIndex;
use crate::model::Category;
use crate::{IngredientVerdict, RecordId, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    AvoidIngredient,
    CautionIngredient,
    CategoryHazard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub severity: Severity,
    pub message: String,
    /// Names of the ingredients (and hazards) involved.
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub has_conflicts: bool,
    pub conflicts: Vec<Conflict>,
    pub can_save: bool,
    /// An error conflict was present and the override let the save through.
    pub overridden: bool,
}

impl Default for ConflictResult {
    fn default() -> Self {
        Self { has_conflicts: false, conflicts: Vec::new(), can_save: true, overridden: false }
    }
}

impl ConflictResult {
    pub fn errors(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.severity == Severity::Error)
    }

    /// Ingredient names behind error conflicts.
    pub fn blocking_names(&self) -> Vec<String> {
        self.errors().flat_map(|c| c.details.iter().cloned()).collect()
    }
}

/// Check `proposed` against the linked ingredients and the category.
///
/// `verdict_override` is the operator's explicit, audited escape hatch; it
/// lifts the veto but the conflict is still reported.
pub fn detect_conflicts(
    proposed: Option<Verdict>,
    ingredient_ids: &BTreeSet<RecordId>,
    verdict_override: bool,
    category: Option<&Category>,
    catalog: &CatalogIndex,
) -> ConflictResult {
    if ingredient_ids.is_empty() {
        return ConflictResult::default();
    }

    let linked: Vec<_> = ingredient_ids.iter().filter_map(|id| catalog.get(id)).collect();
    let mut result = ConflictResult::default();

    if proposed == Some(Verdict::Recommend) {
        let avoid: Vec<String> = linked
            .iter()
            .filter(|e| e.verdict == IngredientVerdict::Avoid)
            .map(|e| e.canonical_name.clone())
            .collect();
        if !avoid.is_empty() {
            result.conflicts.push(Conflict {
                kind: ConflictKind::AvoidIngredient,
                severity: Severity::Error,
                message: format!("Recommended product contains avoid-class ingredients: {}", avoid.join(", ")),
                details: avoid,
            });
        }

        let caution: Vec<String> = linked
            .iter()
            .filter(|e| e.verdict == IngredientVerdict::Caution)
            .map(|e| e.canonical_name.clone())
            .collect();
        if !caution.is_empty() {
            result.conflicts.push(Conflict {
                kind: ConflictKind::CautionIngredient,
                severity: Severity::Warning,
                message: format!("Recommended product contains caution-class ingredients: {}", caution.join(", ")),
                details: caution,
            });
        }
    }

    if let Some(category) = category.filter(|c| !c.harmful_ingredients.is_empty()) {
        let mut hits = Vec::new();
        for entry in &linked {
            let name = entry.canonical_name.to_lowercase();
            for hazard in &category.harmful_ingredients {
                let needle = hazard.ingredient.trim().to_lowercase();
                if needle.is_empty() || !name.contains(&needle) {
                    continue;
                }
                hits.push(match &hazard.reason {
                    Some(reason) => format!("{} ({})", entry.canonical_name, reason),
                    None => entry.canonical_name.clone(),
                });
                break;
            }
        }
        if !hits.is_empty() {
            result.conflicts.push(Conflict {
                kind: ConflictKind::CategoryHazard,
                severity: Severity::Warning,
                message: format!("Ingredients flagged as harmful for {}: {}", category.name, hits.join(", ")),
                details: hits,
            });
        }
    }

    let has_error = result.errors().next().is_some();
    result.has_conflicts = !result.conflicts.is_empty();
    result.can_save = !has_error || verdict_override;
    result.overridden = has_error && verdict_override;

    if has_error {
        tracing::debug!(overridden = result.overridden, names = ?result.blocking_names(), "verdict conflict");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HarmfulIngredient, IngredientCatalogEntry};

    fn catalog() -> CatalogIndex {
        CatalogIndex::new(vec![
            IngredientCatalogEntry::new("dye", "Red Dye 40", IngredientVerdict::Avoid),
            IngredientCatalogEntry::new("carr", "Carrageenan", IngredientVerdict::Caution),
            IngredientCatalogEntry::new("sugar", "Cane Sugar", IngredientVerdict::Recommend),
        ])
    }

    fn ids(list: &[&str]) -> BTreeSet<RecordId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn bars(hazards: &[(&str, Option<&str>)]) -> Category {
        Category {
            id: "bars".into(),
            name: "Protein Bars".into(),
            slug: "protein-bars".into(),
            parent: None,
            ai_suggested: false,
            harmful_ingredients: hazards
                .iter()
                .map(|(i, r)| HarmfulIngredient { ingredient: i.to_string(), reason: r.map(str::to_string) })
                .collect(),
        }
    }

    #[test]
    fn no_ingredients_is_clean() {
        let result = detect_conflicts(Some(Verdict::Recommend), &ids(&[]), false, None, &catalog());
        assert_eq!(result, ConflictResult::default());
        assert!(result.can_save);
    }

    #[test]
    fn recommend_with_avoid_blocks() {
        let result = detect_conflicts(Some(Verdict::Recommend), &ids(&["dye", "sugar"]), false, None, &catalog());
        assert!(result.has_conflicts);
        assert!(!result.can_save);
        assert!(!result.overridden);
        assert_eq!(result.blocking_names(), vec!["Red Dye 40"]);
        assert!(result.conflicts[0].message.contains("Red Dye 40"));
    }

    #[test]
    fn override_lifts_veto_but_keeps_conflict() {
        let result = detect_conflicts(Some(Verdict::Recommend), &ids(&["dye"]), true, None, &catalog());
        assert!(result.can_save);
        assert!(result.overridden);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].severity, Severity::Error);
    }

    #[test]
    fn caution_ingredient_only_warns() {
        let result = detect_conflicts(Some(Verdict::Recommend), &ids(&["carr"]), false, None, &catalog());
        assert!(result.has_conflicts);
        assert!(result.can_save);
        assert_eq!(result.conflicts[0].kind, ConflictKind::CautionIngredient);
    }

    #[test]
    fn non_recommend_verdicts_skip_ingredient_checks() {
        for verdict in [Some(Verdict::Avoid), Some(Verdict::Caution), None] {
            let result = detect_conflicts(verdict, &ids(&["dye", "carr"]), false, None, &catalog());
            assert!(!result.has_conflicts);
            assert!(result.can_save);
        }
    }

    #[test]
    fn category_hazards_warn_for_any_verdict() {
        let category = bars(&[("dye", Some("artificial colour")), ("", None)]);
        let result = detect_conflicts(Some(Verdict::Avoid), &ids(&["dye", "sugar"]), false, Some(&category), &catalog());
        assert!(result.can_save);
        assert_eq!(result.conflicts.len(), 1);
        assert_eq!(result.conflicts[0].kind, ConflictKind::CategoryHazard);
        assert_eq!(result.conflicts[0].details, vec!["Red Dye 40 (artificial colour)"]);
        assert!(result.conflicts[0].message.contains("Protein Bars"));
    }

    #[test]
    fn hazard_matching_is_case_insensitive() {
        let category = bars(&[("SUGAR", None)]);
        let result = detect_conflicts(None, &ids(&["sugar"]), false, Some(&category), &catalog());
        assert_eq!(result.conflicts[0].details, vec!["Cane Sugar"]);
    }
}
