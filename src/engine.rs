//! Verdict determination engine.
//!
//! Everything in here runs synchronously over data the caller already
//! fetched. The pieces are split into focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! ```text
//! raw ingredient text
//!        │  normalize                       (normalize.rs)
//!        v
//!   tokens ── CatalogIndex lookups ──────── (catalog.rs)
//!        │    exact ▸ alias ▸ partial ▸ fuzzy (distance.rs)
//!        v
//!   Resolution {linked ids, unmatched, auto verdict}   (resolver.rs)
//!        │
//!        v
//!   evaluate_rules over RuleSet            (rules.rs)
//!        │  suggested verdict, block flag, warnings
//!        v
//!   detect_conflicts                       (conflicts.rs)
//!        │  can_save veto unless overridden
//!        v
//!   Decision (assembled in api.rs)
//! ```
//!
//! Category paths are reconciled separately by `hydrate_category`
//! (`hydrate.rs`), and review staleness by `freshness` (`freshness.rs`).
//!
//! ## Determinism
//!
//! Given the same catalog contents, rule set, and inputs, every function here
//! returns the same result regardless of the order the store returned
//! records in: the catalog index sorts its keys, and the rule set sorts by
//! priority with a stable sort.
//!
//! ## Debugging
//!
//! Per-token and per-rule traces are emitted at `debug` level through
//! `tracing`; set `VERDICT_LOG=verdict_engine=debug` when running the CLI.

#[path = "engine/catalog.rs"]
mod catalog;
#[path = "engine/conflicts.rs"]
mod conflicts;
#[path = "engine/distance.rs"]
mod distance;
#[path = "engine/freshness.rs"]
mod freshness;
#[path = "engine/hydrate.rs"]
mod hydrate;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/normalize.rs"]
mod normalize;
#[path = "engine/resolver.rs"]
mod resolver;
#[path = "engine/rules.rs"]
mod rules;


pub use catalog::{CatalogIndex, load_catalog};
pub use conflicts::{Conflict, ConflictKind, ConflictResult, Severity, detect_conflicts};
pub use distance::distance;
pub use freshness::{Freshness, FreshnessStatus, freshness};
pub use hydrate::{HydrateOptions, Hydration, hydrate_category, slugify};
pub use metrics::StageMetrics;
pub use normalize::normalize;
pub use resolver::{MatchType, ParsedIngredient, Resolution, ResolutionSummary, resolve_ingredients};
pub use rules::{RuleEvaluation, RuleOutcome, RuleSet, evaluate_rules, record_applied};
