use crate::config::EngineConfig;
use crate::engine::{
    self, ConflictResult, Freshness, HydrateOptions, Hydration, ParsedIngredient, ResolutionSummary, RuleEvaluation,
    RuleSet, StageMetrics,
};
use crate::error::Result;
use crate::store::{AuditEvent, AuditSink, CatalogStore, CategoryStore, RuleStore, emit};
use crate::{RecordId, Verdict};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Decision context.
///
/// Holds the environment needed for time-dependent results (review freshness).
#[derive(Debug, Clone)]
pub struct Context {
    /// Reference instant freshness is measured against.
    pub now: DateTime<Utc>,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            Self { now: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).single().unwrap_or_else(Utc::now) }
        } else {
            Self { now: Utc::now() }
        }
    }
}

/// Options that affect resolution and hydration.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub config: EngineConfig,
    pub hydrate: HydrateOptions,
}

/// The product being saved, as the record-save hook sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub ingredients_text: String,
    /// `">"`-delimited path; hydrated when present and not blank.
    pub category_path: Option<String>,
    /// Already-known category, used when no path is given.
    pub category_id: Option<RecordId>,
    /// Verdict the operator (or upstream extractor) proposes.
    pub proposed_verdict: Option<Verdict>,
    /// Explicit operator override of a blocking conflict.
    pub verdict_override: bool,
    pub last_reviewed: Option<DateTime<Utc>>,
}

/// Where the final verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Proposed,
    Rules,
    Ingredients,
    Undetermined,
}

/// Borrowed collaborator handles for one save operation.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub catalog: &'a dyn CatalogStore,
    pub rules: &'a dyn RuleStore,
    pub categories: &'a dyn CategoryStore,
    pub audit: &'a dyn AuditSink,
}

impl<'a> Collaborators<'a> {
    /// Use one object for every collaborator role.
    pub fn from_store<S>(store: &'a S) -> Self
    where
        S: CatalogStore + RuleStore + CategoryStore + AuditSink,
    {
        Self { catalog: store, rules: store, categories: store, audit: store }
    }
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Outcome of [`decide`] and [`decide_with`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub verdict: Option<Verdict>,
    pub verdict_source: VerdictSource,
    /// False means the save is vetoed; `conflicts` names the reasons.
    pub can_save: bool,
    /// A `block_publish` rule fired, or the save is vetoed.
    pub publish_blocked: bool,
    pub warnings: Vec<String>,
    pub conflicts: ConflictResult,
    pub resolution: ResolutionSummary,
    pub parsed: Vec<ParsedIngredient>,
    pub category_id: Option<RecordId>,
    #[serde(skip)]
    pub hydration: Option<Hydration>,
    pub freshness: Freshness,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Extra details returned by [`decide_verbose_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionDetails {
    pub metrics: StageMetrics,
    pub evaluations: Vec<RuleEvaluation>,
    /// Rules considered, in evaluation order.
    pub active_rules: Vec<String>,
    /// Applied-count increments that went through.
    pub rules_recorded: usize,
    pub catalog_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionVerbose {
    pub decision: Decision,
    pub details: DecisionDetails,
}

/// Run the full pipeline with default [`Context`] and [`Options`].
///
/// # Example
/// ```
/// use verdict_engine::{IngredientCatalogEntry, IngredientVerdict, MemoryStore, ProductInput, Verdict, decide};
///
/// let store = MemoryStore::new()
///     .with_catalog([IngredientCatalogEntry::new("dye", "red dye 40", IngredientVerdict::Avoid)]);
/// let product = ProductInput {
///     ingredients_text: "Water, Red Dye 40".into(),
///     proposed_verdict: Some(Verdict::Recommend),
///     ..ProductInput::default()
/// };
///
/// let decision = decide(&product, &store).unwrap();
/// assert!(!decision.can_save);
/// ```
pub fn decide<S>(product: &ProductInput, store: &S) -> Result<Decision>
where
    S: CatalogStore + RuleStore + CategoryStore + AuditSink,
{
    decide_with(product, Collaborators::from_store(store), &Context::default(), &Options::default())
}

/// Run the full pipeline against explicit collaborators, context, and options.
///
/// Store failures surface as [`EngineError::Infrastructure`](crate::EngineError::Infrastructure);
/// a conflict veto is a successful `Decision` with `can_save == false`.
pub fn decide_with(
    product: &ProductInput,
    collaborators: Collaborators<'_>,
    context: &Context,
    options: &Options,
) -> Result<Decision> {
    decide_verbose_with(product, collaborators, context, options).map(|run| run.decision)
}

/// Like [`decide_with`], also returning per-stage timings and rule traces.
pub fn decide_verbose_with(
    product: &ProductInput,
    collaborators: Collaborators<'_>,
    context: &Context,
    options: &Options,
) -> Result<DecisionVerbose> {
    let config = &options.config;
    let total_start = Instant::now();
    let mut metrics = StageMetrics::default();

    // Fetch everything once for this save.
    let fetch_start = Instant::now();
    let catalog = engine::load_catalog(collaborators.catalog, config.catalog_page_size)?;
    let rules = RuleSet::fetch(collaborators.rules, config.max_active_rules)?;
    let hydration = match product.category_path.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(path) => Some(engine::hydrate_category(path, collaborators.categories, collaborators.audit, &options.hydrate)?),
        None => None,
    };
    let category_id = hydration.as_ref().map(|h| h.category_id.clone()).or_else(|| product.category_id.clone());
    let category = match &category_id {
        Some(id) => collaborators.categories.find_category_by_id(id)?,
        None => None,
    };
    metrics.fetch = fetch_start.elapsed();

    let resolve_start = Instant::now();
    let resolution =
        engine::resolve_ingredients(&product.ingredients_text, &catalog, &config.thresholds, collaborators.audit);
    metrics.resolve = resolve_start.elapsed();

    let evaluate_start = Instant::now();
    let verdicts = resolution.verdicts(&catalog);
    let outcome = engine::evaluate_rules(&rules, &resolution.linked_ids, verdicts, category_id.as_deref());
    let rules_recorded = engine::record_applied(collaborators.rules, &outcome);
    metrics.evaluate = evaluate_start.elapsed();

    let (verdict, verdict_source) = match (product.proposed_verdict, outcome.suggested_verdict, resolution.auto_verdict)
    {
        (Some(v), _, _) => (Some(v), VerdictSource::Proposed),
        (None, Some(v), _) => (Some(v), VerdictSource::Rules),
        (None, None, Some(v)) => (Some(v), VerdictSource::Ingredients),
        (None, None, None) => (None, VerdictSource::Undetermined),
    };

    let detect_start = Instant::now();
    let conflicts = engine::detect_conflicts(
        verdict,
        &resolution.linked_ids,
        product.verdict_override,
        category.as_ref(),
        &catalog,
    );
    metrics.detect = detect_start.elapsed();

    if conflicts.overridden {
        if let Some(verdict) = verdict {
            emit(collaborators.audit, AuditEvent::VerdictOverride { verdict, conflicting: conflicts.blocking_names() });
        }
    }

    let mut warnings = outcome.warnings.clone();
    warnings.extend(conflicts.conflicts.iter().map(|c| c.message.clone()));

    let freshness = engine::freshness(product.last_reviewed, context.now, &config.freshness);
    metrics.total = total_start.elapsed();

    tracing::info!(
        verdict = ?verdict,
        source = ?verdict_source,
        can_save = conflicts.can_save,
        blocked = outcome.should_block,
        linked = resolution.linked_ids.len(),
        unmatched = resolution.unmatched.len(),
        "verdict decided"
    );

    let decision = Decision {
        verdict,
        verdict_source,
        can_save: conflicts.can_save,
        publish_blocked: outcome.should_block || !conflicts.can_save,
        warnings,
        resolution: resolution.summary(),
        parsed: resolution.parsed,
        conflicts,
        category_id,
        hydration,
        freshness,
        elapsed: metrics.total,
    };

    let details = DecisionDetails {
        metrics,
        active_rules: rules.iter().map(|r| r.name.clone()).collect(),
        evaluations: outcome.evaluations,
        rules_recorded,
        catalog_size: catalog.len(),
    };

    Ok(DecisionVerbose { decision, details })
}
