extern crate self as verdict_engine;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[macro_use]
mod macros;
mod api;
mod config;
mod engine;
mod error;
mod model;
mod store;
mod throttle;

pub use api::{
    Collaborators, Context, Decision, DecisionDetails, DecisionVerbose, Options, ProductInput, VerdictSource, decide,
    decide_verbose_with, decide_with,
};
pub use config::{EngineConfig, FreshnessPolicy, Thresholds};
pub use engine::{
    CatalogIndex, Conflict, ConflictKind, ConflictResult, Freshness, FreshnessStatus, Hydration, HydrateOptions,
    MatchType, ParsedIngredient, Resolution, ResolutionSummary, RuleEvaluation, RuleOutcome, RuleSet, StageMetrics,
    Severity, detect_conflicts, distance, evaluate_rules, freshness, hydrate_category, load_catalog, normalize,
    record_applied, resolve_ingredients, slugify,
};
pub use error::{EngineError, Result, StoreError};
pub use model::{
    Category, HarmfulIngredient, IngredientCatalogEntry, NewCategory, RuleAction, RuleCondition, VerdictCondition,
    VerdictRule,
};
pub use store::{
    AuditEvent, AuditSink, CatalogStore, CategoryStore, FailurePlan, MemoryStore, NullAudit, ParentFilter, RuleStore,
};
pub use throttle::{SubmissionThrottle, ThrottleDecision};

// --- Shared types -----------------------------------------------------------

/// Identifier of a persisted record (catalog entry, rule, category).
pub type RecordId = String;

/// Product-level trust verdict.
///
/// Variants are declared in ascending severity so `Ord` doubles as the
/// "worst case" comparison: `max` of two verdicts is the more severe one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Recommend,
    Caution,
    Avoid,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Recommend => "recommend",
            Verdict::Caution => "caution",
            Verdict::Avoid => "avoid",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = EngineError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommend" => Ok(Verdict::Recommend),
            "caution" => Ok(Verdict::Caution),
            "avoid" => Ok(Verdict::Avoid),
            other => Err(EngineError::Input(format!("unknown verdict '{other}' (expected recommend|caution|avoid)"))),
        }
    }
}

/// Safety class of a single catalog ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngredientVerdict {
    Safe,
    Recommend,
    Caution,
    Avoid,
    #[default]
    Unknown,
}

impl IngredientVerdict {
    /// Product verdict this ingredient pushes towards, if it is classified at all.
    ///
    /// ```text
    /// safe | recommend -> Recommend
    /// caution          -> Caution
    /// avoid            -> Avoid
    /// unknown          -> None (linked, but carries no severity)
    /// ```
    pub fn severity(self) -> Option<Verdict> {
        match self {
            IngredientVerdict::Safe | IngredientVerdict::Recommend => Some(Verdict::Recommend),
            IngredientVerdict::Caution => Some(Verdict::Caution),
            IngredientVerdict::Avoid => Some(Verdict::Avoid),
            IngredientVerdict::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IngredientVerdict::Safe => "safe",
            IngredientVerdict::Recommend => "recommend",
            IngredientVerdict::Caution => "caution",
            IngredientVerdict::Avoid => "avoid",
            IngredientVerdict::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IngredientVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Which ingredient verdicts occur among a product's resolved ingredients.
    ///
    /// Rule conditions over verdicts only need presence information, so the
    /// evaluator folds the resolved set into this mask once per call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VerdictSet: u8 {
        const SAFE      = 1 << 0;
        const RECOMMEND = 1 << 1;
        const CAUTION   = 1 << 2;
        const AVOID     = 1 << 3;
        const UNKNOWN   = 1 << 4;
    }
}

impl VerdictSet {
    pub fn of(verdict: IngredientVerdict) -> Self {
        match verdict {
            IngredientVerdict::Safe => VerdictSet::SAFE,
            IngredientVerdict::Recommend => VerdictSet::RECOMMEND,
            IngredientVerdict::Caution => VerdictSet::CAUTION,
            IngredientVerdict::Avoid => VerdictSet::AVOID,
            IngredientVerdict::Unknown => VerdictSet::UNKNOWN,
        }
    }

    /// True when every verdict present is `safe` or `recommend` (and at least one is present).
    pub fn safe_only(self) -> bool {
        !self.is_empty() && (VerdictSet::SAFE | VerdictSet::RECOMMEND).contains(self)
    }
}

impl FromIterator<IngredientVerdict> for VerdictSet {
    fn from_iter<I: IntoIterator<Item = IngredientVerdict>>(iter: I) -> Self {
        iter.into_iter().fold(VerdictSet::empty(), |acc, v| acc | VerdictSet::of(v))
    }
}
