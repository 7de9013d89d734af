//! Catalog lookup index.
//!
//! Built once per save operation from the full catalog. Holds the four
//! lookup structures the resolver walks in priority order:
//!
//! ```text
//! by_name   lowercase canonical name -> entry    (exact)
//! by_alias  lowercase alias          -> entry    (alias)
//! partial   every key, longest first -> entry    (substring, either direction)
//! fuzzy     canonical names, sorted  -> entry    (edit distance)
//! ```
//!
//! ## Invariants
//!
//! - Keys are compared case-insensitively. When two entries claim the same
//!   key the one loaded later wins; the engine does not police catalog data.
//! - `partial` is sorted by descending key length, then lexicographically,
//!   so the longest (most specific) key wins regardless of store order.
//! - `fuzzy` never contains aliases.

use super::distance::{distance, within_length_window};
use crate::error::Result;
use crate::model::IngredientCatalogEntry;
use crate::store::CatalogStore;
use std::collections::{BTreeMap, HashMap};

/// Keys and tokens shorter than this never take part in substring matching.
const MIN_PARTIAL_KEY_CHARS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<IngredientCatalogEntry>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    partial: Vec<(String, usize)>,
    fuzzy: Vec<(String, usize)>,
}

fn lookup_key(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl CatalogIndex {
    pub fn new(entries: Vec<IngredientCatalogEntry>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_alias = HashMap::new();

        for (idx, entry) in entries.iter().enumerate() {
            by_id.insert(entry.id.clone(), idx);

            let name = lookup_key(&entry.canonical_name);
            if !name.is_empty() {
                by_name.insert(name, idx);
            }
            for alias in &entry.aliases {
                let alias = lookup_key(alias);
                if !alias.is_empty() {
                    by_alias.insert(alias, idx);
                }
            }
        }

        // Canonical names shadow aliases with the same spelling.
        let mut keys: BTreeMap<&str, usize> = BTreeMap::new();
        for (key, &idx) in &by_alias {
            keys.insert(key.as_str(), idx);
        }
        for (key, &idx) in &by_name {
            keys.insert(key.as_str(), idx);
        }

        let mut partial: Vec<(String, usize)> = keys
            .into_iter()
            .filter(|(key, _)| key.chars().count() >= MIN_PARTIAL_KEY_CHARS)
            .map(|(key, idx)| (key.to_string(), idx))
            .collect();
        partial.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()).then_with(|| a.0.cmp(&b.0)));

        let mut fuzzy: Vec<(String, usize)> = by_name.iter().map(|(k, &idx)| (k.clone(), idx)).collect();
        fuzzy.sort();

        CatalogIndex { entries, by_id, by_name, by_alias, partial, fuzzy }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IngredientCatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&IngredientCatalogEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    /// Case-insensitive canonical-name lookup.
    pub fn exact(&self, token: &str) -> Option<&IngredientCatalogEntry> {
        self.by_name.get(&lookup_key(token)).map(|&idx| &self.entries[idx])
    }

    pub fn alias(&self, token: &str) -> Option<&IngredientCatalogEntry> {
        self.by_alias.get(&lookup_key(token)).map(|&idx| &self.entries[idx])
    }

    /// First key (longest first) that contains, or is contained by, `token`.
    ///
    /// Returns the entry together with the key that hit.
    pub fn partial(&self, token: &str) -> Option<(&IngredientCatalogEntry, &str)> {
        let token = lookup_key(token);
        if token.chars().count() < MIN_PARTIAL_KEY_CHARS {
            return None;
        }
        self.partial
            .iter()
            .find(|(key, _)| token.contains(key.as_str()) || key.contains(token.as_str()))
            .map(|(key, idx)| (&self.entries[*idx], key.as_str()))
    }

    /// Closest canonical name within `threshold` edits.
    ///
    /// Only names inside the length window are measured; on equal distance the
    /// first candidate in sorted order is kept.
    pub fn fuzzy(&self, token: &str, threshold: usize) -> Option<(&IngredientCatalogEntry, usize)> {
        let token = lookup_key(token);
        let mut best: Option<(usize, usize)> = None;

        for (name, idx) in &self.fuzzy {
            if !within_length_window(&token, name, threshold) {
                continue;
            }
            let d = distance(&token, name);
            if d <= threshold && best.is_none_or(|(best_d, _)| d < best_d) {
                best = Some((d, *idx));
            }
        }

        best.map(|(d, idx)| (&self.entries[idx], d))
    }
}

/// Fetch the whole catalog page by page and index it.
///
/// A store failure aborts the load: an empty index here would read as
/// "nothing matched" downstream.
pub fn load_catalog(store: &dyn CatalogStore, page_size: usize) -> Result<CatalogIndex> {
    let page_size = page_size.max(1);
    let mut entries = Vec::new();
    let mut offset = 0;

    loop {
        let page = store.find_catalog_page(offset, page_size)?;
        let fetched = page.len();
        entries.extend(page);
        offset += fetched;
        if fetched < page_size {
            break;
        }
    }

    tracing::debug!(entries = entries.len(), page_size, "catalog loaded");
    Ok(CatalogIndex::new(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IngredientVerdict;
    use crate::error::EngineError;
    use crate::store::{FailurePlan, MemoryStore};

    fn entry(id: &str, name: &str) -> IngredientCatalogEntry {
        IngredientCatalogEntry::new(id, name, IngredientVerdict::Recommend)
    }

    #[test]
    fn exact_and_alias_are_case_insensitive() {
        let index = CatalogIndex::new(vec![entry("i1", "Sodium Chloride").with_aliases(["Table  Salt"])]);
        assert_eq!(index.exact("sodium chloride").map(|e| e.id.as_str()), Some("i1"));
        assert_eq!(index.alias("TABLE SALT").map(|e| e.id.as_str()), Some("i1"));
        assert!(index.exact("table salt").is_none());
    }

    #[test]
    fn later_entry_wins_duplicate_name() {
        let index = CatalogIndex::new(vec![entry("first", "sugar"), entry("second", "Sugar")]);
        assert_eq!(index.exact("sugar").map(|e| e.id.as_str()), Some("second"));
    }

    #[test]
    fn partial_prefers_longest_key_regardless_of_order() {
        let a = CatalogIndex::new(vec![entry("short", "sugar"), entry("long", "cane sugar")]);
        let b = CatalogIndex::new(vec![entry("long", "cane sugar"), entry("short", "sugar")]);

        for index in [a, b] {
            let (hit, key) = index.partial("raw cane sugar syrup").unwrap();
            assert_eq!(hit.id, "long");
            assert_eq!(key, "cane sugar");
        }
    }

    #[test]
    fn partial_matches_in_both_directions() {
        let index = CatalogIndex::new(vec![entry("i1", "red dye 40")]);
        assert_eq!(index.partial("red dye").map(|(e, _)| e.id.as_str()), Some("i1"));
        assert_eq!(index.partial("red dye 40 lake").map(|(e, _)| e.id.as_str()), Some("i1"));
        assert!(index.partial("blue dye").is_none());
    }

    #[test]
    fn partial_ignores_tiny_keys() {
        let index = CatalogIndex::new(vec![entry("i1", "oi")]);
        assert!(index.partial("soybean oil").is_none());
    }

    #[test]
    fn partial_ignores_tiny_tokens() {
        let index = CatalogIndex::new(vec![entry("i1", "xanthan gum")]);
        assert!(index.partial("gu").is_none());
        assert_eq!(index.partial("gum").map(|(e, _)| e.id.as_str()), Some("i1"));
    }

    #[test]
    fn fuzzy_only_scans_canonical_names() {
        let index = CatalogIndex::new(vec![entry("i1", "turmeric").with_aliases(["curcuma"])]);
        assert_eq!(index.fuzzy("tumeric", 2).map(|(e, d)| (e.id.as_str(), d)), Some(("i1", 1)));
        assert!(index.fuzzy("curcuna", 2).is_none());
    }

    #[test]
    fn fuzzy_keeps_smallest_distance() {
        let index = CatalogIndex::new(vec![entry("far", "lecathin"), entry("near", "lecithin")]);
        assert_eq!(index.fuzzy("lecithn", 2).map(|(e, d)| (e.id.as_str(), d)), Some(("near", 1)));
    }

    #[test]
    fn load_catalog_pages_through_store() {
        let store = MemoryStore::new().with_catalog((0..7).map(|i| entry(&format!("i{i}"), &format!("item {i}"))));
        let index = load_catalog(&store, 3).unwrap();
        assert_eq!(index.len(), 7);
        assert!(index.get("i6").is_some());
    }

    #[test]
    fn load_catalog_propagates_store_failure() {
        let store = MemoryStore::new().with_catalog([entry("i1", "sugar")]);
        store.inject(FailurePlan { catalog: true, ..FailurePlan::default() });
        let err = load_catalog(&store, 10).unwrap_err();
        assert!(matches!(err, EngineError::Infrastructure(_)));
    }
}
