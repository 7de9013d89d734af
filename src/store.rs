//! Collaborator contracts.
//!
//! The engine never talks to a database directly. Callers hand it objects
//! implementing these traits; everything is fetched once per save operation.
//!
//! ```text
//! CatalogStore  ── load_catalog ──▶ CatalogIndex ──▶ resolve_ingredients
//! RuleStore     ── RuleSet::fetch ─▶ evaluate_rules ─▶ record_applied
//! CategoryStore ── hydrate_category / detect_conflicts
//! AuditSink     ◀── fuzzy matches, overrides, created categories
//! ```
//!
//! [`MemoryStore`] implements all four and is what the CLI and the tests use.

use crate::error::StoreError;
use crate::model::{Category, IngredientCatalogEntry, NewCategory, VerdictRule};
use crate::{RecordId, Verdict};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read access to the ingredient catalog.
pub trait CatalogStore {
    /// Fetch up to `limit` entries starting at `offset`, in a stable order.
    fn find_catalog_page(&self, offset: usize, limit: usize) -> StoreResult<Vec<IngredientCatalogEntry>>;
}

/// Read access to verdict rules plus the observational applied counter.
pub trait RuleStore {
    /// Active rules, highest priority first, at most `limit`.
    fn find_active_rules(&self, limit: usize) -> StoreResult<Vec<VerdictRule>>;

    /// Increment `appliedCount` for `rule_id`, returning the new value.
    fn increment_applied(&self, rule_id: &str) -> StoreResult<u64>;
}

/// Scope of a by-name category lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter<'a> {
    /// Match on name only.
    Any,
    /// Match only children of the given category.
    Under(&'a str),
}

pub trait CategoryStore {
    fn find_category(&self, name: &str, parent: ParentFilter<'_>) -> StoreResult<Option<Category>>;
    fn find_category_by_id(&self, id: &str) -> StoreResult<Option<Category>>;
    fn create_category(&self, data: NewCategory) -> StoreResult<Category>;
}

/// Events that need a human to look at them later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    FuzzyMatch { raw: String, canonical: String, ingredient_id: RecordId, distance: usize },
    VerdictOverride { verdict: Verdict, conflicting: Vec<String> },
    CategoryCreated { id: RecordId, name: String, parent: Option<RecordId>, ai_suggested: bool },
}

/// Fire-and-forget audit destination. Callers swallow its errors.
pub trait AuditSink {
    fn record(&self, event: &AuditEvent) -> StoreResult<()>;
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _event: &AuditEvent) -> StoreResult<()> {
        Ok(())
    }
}

/// Forward an event and log (not propagate) a failure.
pub(crate) fn emit(audit: &dyn AuditSink, event: AuditEvent) {
    if let Err(err) = audit.record(&event) {
        tracing::warn!(error = %err, ?event, "audit sink rejected event");
    }
}

// --- In-memory implementation -----------------------------------------------

/// Which collaborator calls should fail, for exercising error paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailurePlan {
    pub catalog: bool,
    pub rule_reads: bool,
    pub rule_writes: bool,
    pub categories: bool,
    pub audit: bool,
}

/// JSON fixture accepted by [`MemoryStore::from_fixture_json`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Fixture {
    catalog: Vec<IngredientCatalogEntry>,
    rules: Vec<VerdictRule>,
    categories: Vec<Category>,
}

#[derive(Debug, Default)]
struct Inner {
    catalog: Vec<IngredientCatalogEntry>,
    rules: Vec<VerdictRule>,
    categories: Vec<Category>,
    audit: Vec<AuditEvent>,
    next_category: usize,
    failures: FailurePlan,
}

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.catalog = fixture.catalog;
            inner.rules = fixture.rules;
            inner.categories = fixture.categories;
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_catalog(self, entries: impl IntoIterator<Item = IngredientCatalogEntry>) -> Self {
        self.lock().catalog.extend(entries);
        self
    }

    pub fn with_rules(self, rules: impl IntoIterator<Item = VerdictRule>) -> Self {
        self.lock().rules.extend(rules);
        self
    }

    pub fn with_categories(self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.lock().categories.extend(categories);
        self
    }

    pub fn inject(&self, failures: FailurePlan) {
        self.lock().failures = failures;
    }

    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    pub fn rules(&self) -> Vec<VerdictRule> {
        self.lock().rules.clone()
    }

    pub fn audit_log(&self) -> Vec<AuditEvent> {
        self.lock().audit.clone()
    }
}

impl CatalogStore for MemoryStore {
    fn find_catalog_page(&self, offset: usize, limit: usize) -> StoreResult<Vec<IngredientCatalogEntry>> {
        let inner = self.lock();
        if inner.failures.catalog {
            return Err(StoreError::Unavailable("catalog".into()));
        }
        Ok(inner.catalog.iter().skip(offset).take(limit).cloned().collect())
    }
}

impl RuleStore for MemoryStore {
    fn find_active_rules(&self, limit: usize) -> StoreResult<Vec<VerdictRule>> {
        let inner = self.lock();
        if inner.failures.rule_reads {
            return Err(StoreError::Unavailable("rules".into()));
        }
        let mut active: Vec<VerdictRule> = inner.rules.iter().filter(|r| r.is_active).cloned().collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));
        active.truncate(limit);
        Ok(active)
    }

    fn increment_applied(&self, rule_id: &str) -> StoreResult<u64> {
        let mut inner = self.lock();
        if inner.failures.rule_writes {
            return Err(StoreError::Write(format!("rule {rule_id}")));
        }
        let rule = inner
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| StoreError::NotFound(format!("rule {rule_id}")))?;
        rule.applied_count += 1;
        Ok(rule.applied_count)
    }
}

impl CategoryStore for MemoryStore {
    fn find_category(&self, name: &str, parent: ParentFilter<'_>) -> StoreResult<Option<Category>> {
        let inner = self.lock();
        if inner.failures.categories {
            return Err(StoreError::Unavailable("categories".into()));
        }
        Ok(inner
            .categories
            .iter()
            .find(|c| {
                c.name == name
                    && match parent {
                        ParentFilter::Any => true,
                        ParentFilter::Under(id) => c.parent.as_deref() == Some(id),
                    }
            })
            .cloned())
    }

    fn find_category_by_id(&self, id: &str) -> StoreResult<Option<Category>> {
        let inner = self.lock();
        if inner.failures.categories {
            return Err(StoreError::Unavailable("categories".into()));
        }
        Ok(inner.categories.iter().find(|c| c.id == id).cloned())
    }

    fn create_category(&self, data: NewCategory) -> StoreResult<Category> {
        let mut inner = self.lock();
        if inner.failures.categories {
            return Err(StoreError::Unavailable("categories".into()));
        }
        if let Some(parent) = &data.parent {
            if !inner.categories.iter().any(|c| &c.id == parent) {
                return Err(StoreError::NotFound(format!("parent category {parent}")));
            }
        }
        inner.next_category += 1;
        let category = Category {
            id: format!("cat-{}", inner.next_category),
            name: data.name,
            slug: data.slug,
            parent: data.parent,
            ai_suggested: data.ai_suggested,
            harmful_ingredients: Vec::new(),
        };
        inner.categories.push(category.clone());
        Ok(category)
    }
}

impl AuditSink for MemoryStore {
    fn record(&self, event: &AuditEvent) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.failures.audit {
            return Err(StoreError::Unavailable("audit".into()));
        }
        inner.audit.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IngredientVerdict, RuleAction, RuleCondition, VerdictCondition};

    #[test]
    fn pages_are_stable_slices() {
        let store = MemoryStore::new().with_catalog(
            (0..5).map(|i| IngredientCatalogEntry::new(format!("i{i}"), format!("item {i}"), IngredientVerdict::Safe)),
        );
        let first = store.find_catalog_page(0, 2).unwrap();
        let last = store.find_catalog_page(4, 2).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, "i4");
    }

    #[test]
    fn active_rules_come_back_highest_priority_first() {
        let store = MemoryStore::new().with_rules([
            verdict_rule! {
                id: "low", name: "low",
                when: RuleCondition::IngredientVerdict { verdict: VerdictCondition::Caution },
                then: RuleAction::WarnOnly, priority: 1,
            },
            verdict_rule! {
                id: "off", name: "off",
                when: RuleCondition::IngredientVerdict { verdict: VerdictCondition::Avoid },
                then: RuleAction::SetAvoid, priority: 99, active: false,
            },
            verdict_rule! {
                id: "high", name: "high",
                when: RuleCondition::IngredientVerdict { verdict: VerdictCondition::Avoid },
                then: RuleAction::SetAvoid, priority: 10,
            },
        ]);

        let ids: Vec<String> = store.find_active_rules(100).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["high", "low"]);
    }

    #[test]
    fn create_rejects_unknown_parent() {
        let store = MemoryStore::new();
        let err = store
            .create_category(NewCategory {
                name: "Orphan".into(),
                slug: "orphan".into(),
                parent: Some("missing".into()),
                ai_suggested: false,
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn fixture_loads_all_collections() {
        let json = r#"{
            "catalog": [{"id": "i1", "canonicalName": "sugar", "verdict": "recommend"}],
            "categories": [{"id": "c1", "name": "Snacks", "slug": "snacks"}]
        }"#;
        let store = MemoryStore::from_fixture_json(json).unwrap();
        assert_eq!(store.find_catalog_page(0, 10).unwrap().len(), 1);
        assert_eq!(store.categories().len(), 1);
        assert!(store.rules().is_empty());
    }

    #[test]
    fn emit_swallows_sink_failures() {
        let store = MemoryStore::new();
        store.inject(FailurePlan { audit: true, ..FailurePlan::default() });
        emit(&store, AuditEvent::VerdictOverride { verdict: Verdict::Recommend, conflicting: vec![] });
        assert!(store.audit_log().is_empty());
    }
}
