//! Ingredient resolution.
//!
//! Maps each normalized token to at most one catalog entry. Strategies run
//! in a fixed order and the first hit wins:
//!
//! ```text
//! token ──┬─ exact    canonical name
//!         ├─ alias    alias table
//!         ├─ partial  longest catalog key contained in / containing the token
//!         └─ fuzzy    closest canonical name within the threshold
//!                     (only when enabled and the token has ≥ 4 chars)
//! ```
//!
//! Matched tokens feed `linked_ids` and the worst-case `auto_verdict`;
//! unmatched tokens are handed back verbatim for operator review. Fuzzy hits
//! are reported to the audit sink because they are probabilistic.

use super::catalog::CatalogIndex;
use super::normalize::{NormalizedToken, normalize_tokens};
use crate::config::Thresholds;
use crate::store::{AuditEvent, AuditSink, emit};
use crate::{IngredientVerdict, RecordId, Verdict, VerdictSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tokens shorter than this never go through fuzzy matching.
const MIN_FUZZY_TOKEN_CHARS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Alias,
    Partial,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Alias => "alias",
            MatchType::Partial => "partial",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// Outcome for a single input token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedIngredient {
    /// Fragment as it appeared in the label.
    pub raw_name: String,
    /// Token the catalog was searched with.
    pub normalized: String,
    pub matched: bool,
    pub match_type: Option<MatchType>,
    pub matched_canonical_name: Option<String>,
    pub ingredient_id: Option<RecordId>,
    pub verdict: Option<IngredientVerdict>,
    pub fuzzy_distance: Option<usize>,
}

impl ParsedIngredient {
    fn unmatched(raw_name: String, normalized: String) -> Self {
        Self {
            raw_name,
            normalized,
            matched: false,
            match_type: None,
            matched_canonical_name: None,
            ingredient_id: None,
            verdict: None,
            fuzzy_distance: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub linked_ids: BTreeSet<RecordId>,
    pub unmatched: Vec<String>,
    pub auto_verdict: Option<Verdict>,
    pub parsed: Vec<ParsedIngredient>,
}

/// Persistable digest of a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub fuzzy_count: usize,
    pub linked_ids: Vec<RecordId>,
    pub unmatched: Vec<String>,
    pub auto_verdict: Option<Verdict>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.parsed.is_empty()
    }

    pub fn matched(&self) -> impl Iterator<Item = &ParsedIngredient> {
        self.parsed.iter().filter(|p| p.matched)
    }

    /// Which verdict classes occur among the linked ingredients.
    pub fn verdicts(&self, catalog: &CatalogIndex) -> VerdictSet {
        self.linked_ids.iter().filter_map(|id| catalog.get(id)).map(|e| e.verdict).collect()
    }

    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary {
            matched_count: self.matched().count(),
            unmatched_count: self.unmatched.len(),
            fuzzy_count: self.matched().filter(|p| p.match_type == Some(MatchType::Fuzzy)).count(),
            linked_ids: self.linked_ids.iter().cloned().collect(),
            unmatched: self.unmatched.clone(),
            auto_verdict: self.auto_verdict,
        }
    }
}

/// Resolve `raw` against `catalog`.
///
/// Absent text is not an error: it resolves to an empty [`Resolution`].
pub fn resolve_ingredients(
    raw: &str,
    catalog: &CatalogIndex,
    thresholds: &Thresholds,
    audit: &dyn AuditSink,
) -> Resolution {
    let mut resolution = Resolution::default();

    for token in normalize_tokens(raw) {
        let parsed = resolve_token(token, catalog, thresholds);

        if !parsed.matched {
            tracing::debug!(token = %parsed.normalized, "no catalog match");
            resolution.unmatched.push(parsed.normalized.clone());
            resolution.parsed.push(parsed);
            continue;
        }

        if let (Some(MatchType::Fuzzy), Some(id), Some(canonical), Some(d)) =
            (parsed.match_type, &parsed.ingredient_id, &parsed.matched_canonical_name, parsed.fuzzy_distance)
        {
            emit(
                audit,
                AuditEvent::FuzzyMatch {
                    raw: parsed.raw_name.clone(),
                    canonical: canonical.clone(),
                    ingredient_id: id.clone(),
                    distance: d,
                },
            );
        }

        if let Some(id) = &parsed.ingredient_id {
            resolution.linked_ids.insert(id.clone());
        }
        if let Some(severity) = parsed.verdict.and_then(IngredientVerdict::severity) {
            resolution.auto_verdict = Some(resolution.auto_verdict.map_or(severity, |v| v.max(severity)));
        }
        resolution.parsed.push(parsed);
    }

    tracing::debug!(
        linked = resolution.linked_ids.len(),
        unmatched = resolution.unmatched.len(),
        auto_verdict = ?resolution.auto_verdict,
        "ingredients resolved"
    );
    resolution
}

fn resolve_token(token: NormalizedToken, catalog: &CatalogIndex, thresholds: &Thresholds) -> ParsedIngredient {
    let NormalizedToken { raw, normalized, numbered } = token;
    // "red dye 40" before "red dye": the number may belong to the name.
    let forms: Vec<&str> = numbered.iter().map(String::as_str).chain([normalized.as_str()]).collect();

    let hit = forms
        .iter()
        .find_map(|f| catalog.exact(f).map(|e| (*f, e, MatchType::Exact, None)))
        .or_else(|| forms.iter().find_map(|f| catalog.alias(f).map(|e| (*f, e, MatchType::Alias, None))))
        .or_else(|| forms.iter().find_map(|f| catalog.partial(f).map(|(e, _)| (*f, e, MatchType::Partial, None))))
        .or_else(|| {
            if !thresholds.enable_fuzzy_matching || normalized.chars().count() < MIN_FUZZY_TOKEN_CHARS {
                return None;
            }
            catalog
                .fuzzy(&normalized, thresholds.fuzzy_match_threshold)
                .map(|(e, d)| (normalized.as_str(), e, MatchType::Fuzzy, Some(d)))
        });

    match hit {
        Some((form, entry, match_type, fuzzy_distance)) => {
            tracing::debug!(
                token = %form,
                match_type = match_type.as_str(),
                canonical = %entry.canonical_name,
                "catalog match"
            );
            ParsedIngredient {
                normalized: form.to_string(),
                raw_name: raw,
                matched: true,
                match_type: Some(match_type),
                matched_canonical_name: Some(entry.canonical_name.clone()),
                ingredient_id: Some(entry.id.clone()),
                verdict: Some(entry.verdict),
                fuzzy_distance,
            }
        }
        None => ParsedIngredient::unmatched(raw, normalized),
    }
}
