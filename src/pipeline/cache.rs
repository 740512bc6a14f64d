//! Memoised views keyed on (dataset version, criteria).
//!
//! Criteria are normalised against the dataset's filter domain before
//! lookup, so ticking every box and "select all" share one entry.

use super::dataset::Dataset;
use super::view::{recompute, ViewModel};
use crate::types::FilterCriteria;
use std::collections::VecDeque;
use std::sync::Arc;

/// Lookup key of one view: dataset version, ranking length and the
/// normalised criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewKey {
    version: u64,
    top_n: usize,
    criteria: FilterCriteria,
}

impl ViewKey {
    pub fn new(dataset: &Dataset, criteria: &FilterCriteria, top_n: usize) -> Self {
        Self {
            version: dataset.version(),
            top_n,
            criteria: criteria.clone().normalize(dataset.domain()),
        }
    }

    pub const fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub const fn top_n(&self) -> usize {
        self.top_n
    }
}

/// Bounded cache; the oldest entry is evicted first.
///
/// Lookup and insertion are separate so callers sharing the cache behind a
/// lock can compute a missing view without holding it.
#[derive(Debug)]
pub struct ViewCache {
    capacity: usize,
    entries: VecDeque<(ViewKey, Arc<ViewModel>)>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl ViewCache {
    /// A capacity of 0 disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached view of `dataset` for `key`, counting the hit or miss.
    pub fn lookup(&mut self, dataset: &Arc<Dataset>, key: &ViewKey) -> Option<Arc<ViewModel>> {
        let found = self
            .entries
            .iter()
            .find(|(k, v)| k == key && Arc::ptr_eq(v.dataset(), dataset))
            .map(|(_, v)| Arc::clone(v));
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Store a computed view and return the one to serve.
    ///
    /// If an equal view was stored meanwhile, that one is returned and
    /// `view` is dropped. Views of a version older than the newest cached
    /// one are served but not stored.
    pub fn insert(&mut self, key: ViewKey, view: Arc<ViewModel>) -> Arc<ViewModel> {
        if self.capacity == 0 {
            return view;
        }
        if let Some((_, existing)) = self
            .entries
            .iter()
            .find(|(k, v)| *k == key && Arc::ptr_eq(v.dataset(), view.dataset()))
        {
            return Arc::clone(existing);
        }
        if self.entries.iter().any(|(k, _)| k.version > key.version) {
            return view;
        }

        // Views of older versions can never be hit again.
        self.entries.retain(|(k, _)| k.version >= key.version);
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, Arc::clone(&view)));
        view
    }

    /// Return the cached view for these inputs, computing it on a miss.
    pub fn get_or_compute(
        &mut self,
        dataset: &Arc<Dataset>,
        criteria: &FilterCriteria,
        top_n: usize,
    ) -> Arc<ViewModel> {
        let key = ViewKey::new(dataset, criteria, top_n);
        if let Some(view) = self.lookup(dataset, &key) {
            return view;
        }
        let view = Arc::new(recompute(dataset, key.criteria(), top_n));
        self.insert(key, view)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
        }
    }
}
