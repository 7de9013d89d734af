//! Persisted record shapes.
//!
//! These mirror the documents held by the external stores. Field names on
//! the wire are camelCase; the rule vocabulary is a closed set of tagged
//! variants so a new condition or action is a compile-checked change.

use crate::{IngredientVerdict, RecordId};
use serde::{Deserialize, Serialize};

/// One canonical ingredient in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCatalogEntry {
    pub id: RecordId,
    pub canonical_name: String,
    #[serde(default)]
    pub verdict: IngredientVerdict,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl IngredientCatalogEntry {
    pub fn new(id: impl Into<RecordId>, canonical_name: impl Into<String>, verdict: IngredientVerdict) -> Self {
        Self { id: id.into(), canonical_name: canonical_name.into(), verdict, aliases: Vec::new() }
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }
}

/// Verdict predicate used by `ingredient_verdict` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictCondition {
    /// At least one resolved ingredient is `avoid`.
    Avoid,
    /// At least one resolved ingredient is `caution`.
    Caution,
    /// Every resolved ingredient is `safe` or `recommend`.
    SafeOnly,
}

/// What a rule tests, tagged by `conditionType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "conditionType", rename_all = "snake_case")]
pub enum RuleCondition {
    ContainsIngredient {
        #[serde(rename = "ingredientCondition", default)]
        ingredients: Vec<RecordId>,
    },
    MissingIngredient {
        #[serde(rename = "ingredientCondition", default)]
        ingredients: Vec<RecordId>,
    },
    IngredientVerdict {
        #[serde(rename = "ingredientVerdictCondition")]
        verdict: VerdictCondition,
    },
    CategoryMatch {
        #[serde(rename = "categoryCondition", default)]
        categories: Vec<RecordId>,
    },
}

impl RuleCondition {
    pub fn kind(&self) -> &'static str {
        match self {
            RuleCondition::ContainsIngredient { .. } => "contains_ingredient",
            RuleCondition::MissingIngredient { .. } => "missing_ingredient",
            RuleCondition::IngredientVerdict { .. } => "ingredient_verdict",
            RuleCondition::CategoryMatch { .. } => "category_match",
        }
    }
}

/// What a matching rule does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    SetAvoid,
    SetCaution,
    SetRecommend,
    BlockPublish,
    WarnOnly,
}

impl RuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleAction::SetAvoid => "set_avoid",
            RuleAction::SetCaution => "set_caution",
            RuleAction::SetRecommend => "set_recommend",
            RuleAction::BlockPublish => "block_publish",
            RuleAction::WarnOnly => "warn_only",
        }
    }
}

/// Admin-authored verdict rule.
///
/// The engine only ever writes `applied_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRule {
    pub id: RecordId,
    pub name: String,
    #[serde(flatten)]
    pub condition: RuleCondition,
    pub action: RuleAction,
    #[serde(default)]
    pub warning_message: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub applied_count: u64,
}

fn default_true() -> bool {
    true
}

/// Substring flagged as hazardous for every product in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarmfulIngredient {
    pub ingredient: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Node of the category tree. `parent` is a non-owning id reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub ai_suggested: bool,
    #[serde(default)]
    pub harmful_ingredients: Vec<HarmfulIngredient>,
}

/// Payload for creating a category; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub parent: Option<RecordId>,
    pub ai_suggested: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_deserializes_from_flat_document() {
        let json = r#"{
            "id": "r1",
            "name": "No red dyes",
            "conditionType": "contains_ingredient",
            "ingredientCondition": ["red-40", "red-3"],
            "action": "set_avoid",
            "warningMessage": "Contains a synthetic red dye",
            "isActive": true,
            "priority": 90,
            "appliedCount": 4
        }"#;

        let rule: VerdictRule = serde_json::from_str(json).unwrap();
        assert_eq!(
            rule.condition,
            RuleCondition::ContainsIngredient { ingredients: vec!["red-40".into(), "red-3".into()] }
        );
        assert_eq!(rule.action, RuleAction::SetAvoid);
        assert_eq!(rule.priority, 90);
        assert_eq!(rule.applied_count, 4);
    }

    #[test]
    fn rule_defaults_to_active() {
        let json = r#"{
            "id": "r2",
            "name": "Only safe",
            "conditionType": "ingredient_verdict",
            "ingredientVerdictCondition": "safe_only",
            "action": "set_recommend"
        }"#;

        let rule: VerdictRule = serde_json::from_str(json).unwrap();
        assert!(rule.is_active);
        assert_eq!(rule.condition, RuleCondition::IngredientVerdict { verdict: VerdictCondition::SafeOnly });
        assert_eq!(rule.warning_message, None);
    }

    #[test]
    fn category_parent_is_optional() {
        let json = r#"{"id": "c1", "name": "Snacks", "slug": "snacks"}"#;
        let cat: Category = serde_json::from_str(json).unwrap();
        assert_eq!(cat.parent, None);
        assert!(cat.harmful_ingredients.is_empty());
    }
}
