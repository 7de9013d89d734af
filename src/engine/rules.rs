//! Rule set preparation and evaluation.
//!
//! Rules are data: admins author them, the store hands them over, and the
//! engine walks them in priority order. Each rule is tested independently
//! against the same fixed inputs; only the *application* of actions carries
//! state from one rule to the next.
//!
//! ## Action precedence
//!
//! ```text
//! suggestion:  None ──set_recommend──▶ Recommend
//!               │                        │
//!               └──set_caution──▶ Caution ◀┘ (set_caution)
//!                                  │
//!   any state ──set_avoid──▶ Avoid (terminal: nothing downgrades it)
//!
//! block_publish: should_block = true, message -> warnings
//! warn_only:     message -> warnings
//! ```
//!
//! ## Invariants
//!
//! - `RuleSet` only ever holds active rules, sorted by descending priority
//!   with a stable sort, capped at the configured maximum.
//! - `evaluate_rules` is pure. The `appliedCount` side effect lives in
//!   [`record_applied`] and never fails the evaluation.

use crate::error::Result;
use crate::model::{RuleAction, RuleCondition, VerdictCondition, VerdictRule};
use crate::store::RuleStore;
use crate::{RecordId, Verdict, VerdictSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Active rules in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<VerdictRule>,
}

impl RuleSet {
    /// Keep active rules, order by priority (highest first), cap at `max`.
    pub fn prepare(rules: impl IntoIterator<Item = VerdictRule>, max: usize) -> Self {
        let mut rules: Vec<VerdictRule> = rules.into_iter().filter(|r| r.is_active).collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules.truncate(max);
        RuleSet { rules }
    }

    /// Fetch active rules from `store`. Store failures propagate.
    pub fn fetch(store: &dyn RuleStore, max: usize) -> Result<Self> {
        let rules = store.find_active_rules(max)?;
        Ok(Self::prepare(rules, max))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VerdictRule> {
        self.rules.iter()
    }
}

/// One rule's verdict for one evaluation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub rule_id: RecordId,
    pub rule_name: String,
    pub matched: bool,
    pub action: RuleAction,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub evaluations: Vec<RuleEvaluation>,
    pub suggested_verdict: Option<Verdict>,
    pub should_block: bool,
    pub warnings: Vec<String>,
}

impl RuleOutcome {
    pub fn matched(&self) -> impl Iterator<Item = &RuleEvaluation> {
        self.evaluations.iter().filter(|e| e.matched)
    }
}

/// Evaluate every rule in `rules` against a product's resolved state.
///
/// `verdicts` is the set of verdict classes among `ingredient_ids`
/// (see [`Resolution::verdicts`](super::Resolution::verdicts)).
pub fn evaluate_rules(
    rules: &RuleSet,
    ingredient_ids: &BTreeSet<RecordId>,
    verdicts: VerdictSet,
    category_id: Option<&str>,
) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();

    for rule in rules.iter() {
        let matched = condition_holds(&rule.condition, ingredient_ids, verdicts, category_id);

        tracing::debug!(
            rule = %rule.name,
            condition = rule.condition.kind(),
            action = rule.action.as_str(),
            matched,
            "rule evaluated"
        );

        if matched {
            apply_action(&mut outcome, rule);
        }

        outcome.evaluations.push(RuleEvaluation {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            matched,
            action: rule.action,
            message: if matched { rule.warning_message.clone() } else { None },
        });
    }

    outcome
}

fn condition_holds(
    condition: &RuleCondition,
    ingredient_ids: &BTreeSet<RecordId>,
    verdicts: VerdictSet,
    category_id: Option<&str>,
) -> bool {
    match condition {
        RuleCondition::ContainsIngredient { ingredients } => ingredients.iter().any(|id| ingredient_ids.contains(id)),
        RuleCondition::MissingIngredient { ingredients } => {
            !ingredients.is_empty() && !ingredients.iter().any(|id| ingredient_ids.contains(id))
        }
        RuleCondition::IngredientVerdict { verdict } => match verdict {
            VerdictCondition::Avoid => verdicts.contains(VerdictSet::AVOID),
            VerdictCondition::Caution => verdicts.contains(VerdictSet::CAUTION),
            VerdictCondition::SafeOnly => verdicts.safe_only(),
        },
        RuleCondition::CategoryMatch { categories } => {
            category_id.is_some_and(|current| categories.iter().any(|c| c == current))
        }
    }
}

fn apply_action(outcome: &mut RuleOutcome, rule: &VerdictRule) {
    match rule.action {
        RuleAction::SetAvoid => outcome.suggested_verdict = Some(Verdict::Avoid),
        RuleAction::SetCaution => {
            if outcome.suggested_verdict != Some(Verdict::Avoid) {
                outcome.suggested_verdict = Some(Verdict::Caution);
            }
        }
        RuleAction::SetRecommend => {
            if outcome.suggested_verdict.is_none() {
                outcome.suggested_verdict = Some(Verdict::Recommend);
            }
        }
        RuleAction::BlockPublish => {
            outcome.should_block = true;
            outcome.warnings.extend(rule.warning_message.clone());
        }
        RuleAction::WarnOnly => outcome.warnings.extend(rule.warning_message.clone()),
    }
}

/// Bump `appliedCount` for every matched rule.
///
/// The counter is telemetry: failures are logged and skipped, and concurrent
/// saves may under- or double-count. Returns how many increments succeeded.
pub fn record_applied(store: &dyn RuleStore, outcome: &RuleOutcome) -> usize {
    let mut recorded = 0;
    for evaluation in outcome.matched() {
        match store.increment_applied(&evaluation.rule_id) {
            Ok(_) => recorded += 1,
            Err(err) => {
                tracing::warn!(rule = %evaluation.rule_id, error = %err, "could not record rule application");
            }
        }
    }
    recorded
}
