//! Category path hydration.
//!
//! Resolves `"Food & Beverage > Protein Bars"` into category records,
//! creating whatever is missing, one level at a time:
//!
//! ```text
//! segment 0  find by name (no parent scoping)  ── found? reuse : create root
//! segment i  find by name under parent_{i-1}   ── found? reuse : create child
//! ```
//!
//! Hydration only ever appends children under an already-resolved parent and
//! never reparents, so the tree stays acyclic. Re-hydrating the same path
//! finds every node again and creates nothing.

use crate::error::{EngineError, Result};
use crate::model::NewCategory;
use crate::store::{AuditEvent, AuditSink, CategoryStore, ParentFilter, emit};
use crate::RecordId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrateOptions {
    /// Tag created nodes as AI-suggested (pending human confirmation).
    pub ai_suggested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hydration {
    /// Deepest category on the path.
    pub category_id: RecordId,
    /// The deepest category was created by this call.
    pub created: bool,
    /// Top-level category id, when the path has more than one segment.
    pub parent_id: Option<RecordId>,
    /// Every id on the path, root first.
    pub chain: Vec<RecordId>,
}

/// URL slug: lowercase, runs of non-alphanumerics become one `-`, no edge hyphens.
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    regex!(r"[^\p{L}\p{N}]+").replace_all(&lower, "-").trim_matches('-').to_string()
}

fn segments(path: &str) -> Vec<&str> {
    path.split('>').map(str::trim).filter(|s| !s.is_empty()).collect()
}

pub fn hydrate_category(
    path: &str,
    store: &dyn CategoryStore,
    audit: &dyn AuditSink,
    options: &HydrateOptions,
) -> Result<Hydration> {
    let names = segments(path);
    if names.is_empty() {
        return Err(EngineError::InvalidPath(format!("'{path}' has no category segments")));
    }

    let mut chain: Vec<RecordId> = Vec::with_capacity(names.len());
    let mut created = false;

    for name in &names {
        let parent = chain.last().cloned();
        let filter = match &parent {
            Some(id) => ParentFilter::Under(id),
            None => ParentFilter::Any,
        };

        match store.find_category(name, filter)? {
            Some(existing) => {
                tracing::debug!(name, id = %existing.id, "category found");
                chain.push(existing.id);
                created = false;
            }
            None => {
                let category = store.create_category(NewCategory {
                    name: name.to_string(),
                    slug: slugify(name),
                    parent: parent.clone(),
                    ai_suggested: options.ai_suggested,
                })?;
                tracing::info!(name, id = %category.id, parent = ?parent, "category created");
                emit(
                    audit,
                    AuditEvent::CategoryCreated {
                        id: category.id.clone(),
                        name: category.name.clone(),
                        parent,
                        ai_suggested: options.ai_suggested,
                    },
                );
                chain.push(category.id);
                created = true;
            }
        }
    }

    let parent_id = if chain.len() > 1 { chain.first().cloned() } else { None };
    let category_id = match chain.last() {
        Some(id) => id.clone(),
        None => return Err(EngineError::InvalidPath(format!("'{path}' resolved to no category"))),
    };

    Ok(Hydration { category_id, created, parent_id, chain })
}
