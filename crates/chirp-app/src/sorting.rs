//! Multi-collection stable sorter.
//!
//! Pure transformation applied uniformly to every feed variant. Each
//! named collection is sorted independently; inputs are never mutated.
//! The sort is stable by contract: equal-key items keep their input
//! order, because no secondary key is defined.

use chirp_core::records::{Comment, Post};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Shared sort criterion across feed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortCriterion {
    /// Descending by creation timestamp.
    #[default]
    Latest,
    /// Descending by liker-set size.
    Likes,
}

/// The two attributes the sorter reads. Nothing else about an item is
/// inspected or touched.
pub trait Sortable {
    fn created_at_ms(&self) -> u64;
    fn liker_count(&self) -> usize;
}

impl Sortable for Post {
    fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    fn liker_count(&self) -> usize {
        self.liked_by.len()
    }
}

impl Sortable for Comment {
    fn created_at_ms(&self) -> u64 {
        self.created_at_ms
    }

    fn liker_count(&self) -> usize {
        self.liked_by.len()
    }
}

/// Sort one collection. `sort_by` is a stable sort, which carries the
/// tie-break contract: equal keys preserve input order.
pub fn sort_items<T: Sortable + Clone>(items: &[T], criterion: SortCriterion) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by(|a, b| match criterion {
        SortCriterion::Latest => b.created_at_ms().cmp(&a.created_at_ms()),
        SortCriterion::Likes => b.liker_count().cmp(&a.liker_count()),
    });
    out
}

/// Sort several named collections independently by a shared criterion.
pub fn sort_collections<T: Sortable + Clone>(
    collections: &HashMap<String, Vec<T>>,
    criterion: SortCriterion,
) -> HashMap<String, Vec<T>> {
    collections
        .iter()
        .map(|(name, items)| (name.clone(), sort_items(items, criterion)))
        .collect()
}

/// Memoized sorter keyed on input reference identity and criterion.
///
/// A collection is re-sorted only when its `Arc` pointer or the
/// criterion changes, so unrelated re-renders reuse the previous output.
pub struct SortMemo<T> {
    criterion: Option<SortCriterion>,
    sources: HashMap<String, usize>,
    sorted: HashMap<String, Arc<Vec<T>>>,
}

impl<T: Sortable + Clone> SortMemo<T> {
    pub fn new() -> Self {
        Self {
            criterion: None,
            sources: HashMap::new(),
            sorted: HashMap::new(),
        }
    }

    /// Sorted view of the inputs, recomputing only what changed.
    pub fn sort(
        &mut self,
        inputs: &HashMap<String, Arc<Vec<T>>>,
        criterion: SortCriterion,
    ) -> HashMap<String, Arc<Vec<T>>> {
        if self.criterion != Some(criterion) {
            self.criterion = Some(criterion);
            self.sources.clear();
            self.sorted.clear();
        }
        self.sources.retain(|name, _| inputs.contains_key(name));
        self.sorted.retain(|name, _| inputs.contains_key(name));

        for (name, items) in inputs {
            let ptr = Arc::as_ptr(items) as usize;
            if self.sources.get(name) != Some(&ptr) {
                self.sorted
                    .insert(name.clone(), Arc::new(sort_items(items, criterion)));
                self.sources.insert(name.clone(), ptr);
            }
        }
        self.sorted.clone()
    }
}

impl<T: Sortable + Clone> Default for SortMemo<T> {
    fn default() -> Self {
        Self::new()
    }
}
