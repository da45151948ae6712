//! Is-a hierarchy built from taxonomy records.
//!
//! [`TreeBuilder`] is the per-worker accumulator the collector folds concepts
//! into. Builders combine associatively, so the order in which workers are
//! reduced does not change the result. [`TaxonomyTree`] is the immutable
//! product: direct parent and child lists plus BFS traversals.
//!
//! Terminologies are polyhierarchies, so a concept may have several parents
//! and the "tree" is a DAG. Traversals are cycle-safe regardless.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;
use termdb_core::Nid;

/// Static empty slice for concepts without parents or children
static EMPTY_NIDS: &[Nid] = &[];

/// Counters gathered while collecting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Concepts whose record was read and queried
    pub processed: usize,
    /// Concepts the provider had no record for
    pub missing: usize,
    /// Processed concepts whose is-a query resolved no parent
    pub without_parents: usize,
}

impl CollectStats {
    fn add(&mut self, other: &CollectStats) {
        self.processed += other.processed;
        self.missing += other.missing;
        self.without_parents += other.without_parents;
    }
}

// ---------------------------------------------------------------------------
// TreeBuilder
// ---------------------------------------------------------------------------

/// Mutable tree fragment owned by one worker.
#[derive(Clone, Debug, Default)]
pub struct TreeBuilder {
    /// child -> direct parents, in insertion order
    parents: FxHashMap<Nid, SmallVec<[Nid; 2]>>,
    /// every concept seen as a processed origin or as a parent
    concepts: FxHashSet<Nid>,
    stats: CollectStats,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processed origin concept.
    pub fn add_concept(&mut self, nid: Nid) {
        self.concepts.insert(nid);
        self.stats.processed += 1;
    }

    /// Record the is-a edge `child -> parent`. Duplicate edges are ignored.
    pub fn add_parent(&mut self, child: Nid, parent: Nid) {
        self.concepts.insert(child);
        self.concepts.insert(parent);
        let parents = self.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }

    pub fn note_missing(&mut self) {
        self.stats.missing += 1;
    }

    pub fn note_without_parents(&mut self) {
        self.stats.without_parents += 1;
    }

    /// Fold `other` into this fragment.
    pub fn combine(&mut self, other: TreeBuilder) {
        for (child, parents) in other.parents {
            for parent in parents {
                self.add_parent(child, parent);
            }
        }
        self.concepts.extend(other.concepts);
        self.stats.add(&other.stats);
    }

    pub fn stats(&self) -> CollectStats {
        self.stats
    }

    pub fn edge_count(&self) -> usize {
        self.parents.values().map(|p| p.len()).sum()
    }

    /// Freeze into a [`TaxonomyTree`]. Parent and child lists are sorted.
    pub fn build(self) -> TaxonomyTree {
        let mut parents = self.parents;
        let mut children: FxHashMap<Nid, SmallVec<[Nid; 4]>> = FxHashMap::default();
        for (child, list) in parents.iter_mut() {
            list.sort_unstable();
            for parent in list.iter() {
                children.entry(*parent).or_default().push(*child);
            }
        }
        for list in children.values_mut() {
            list.sort_unstable();
        }

        let mut concepts: Vec<Nid> = self.concepts.into_iter().collect();
        concepts.sort_unstable();
        let roots: Vec<Nid> = concepts
            .iter()
            .copied()
            .filter(|nid| parents.get(nid).map_or(true, |p| p.is_empty()))
            .collect();
        let edge_count = parents.values().map(|p| p.len()).sum();

        TaxonomyTree {
            inner: Arc::new(TaxonomyTreeInner {
                parents,
                children,
                concepts,
                roots,
                edge_count,
                stats: self.stats,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// TaxonomyTree
// ---------------------------------------------------------------------------

/// Arc-backed is-a hierarchy for cheap cloning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxonomyTree {
    inner: Arc<TaxonomyTreeInner>,
}

#[derive(Debug, PartialEq, Eq)]
struct TaxonomyTreeInner {
    /// child -> direct parents (sorted)
    parents: FxHashMap<Nid, SmallVec<[Nid; 2]>>,
    /// parent -> direct children (sorted)
    children: FxHashMap<Nid, SmallVec<[Nid; 4]>>,
    /// every concept (sorted)
    concepts: Vec<Nid>,
    /// concepts without parents (sorted)
    roots: Vec<Nid>,
    edge_count: usize,
    stats: CollectStats,
}

impl TaxonomyTree {
    /// Direct parents of `nid`.
    pub fn parents_of(&self, nid: Nid) -> &[Nid] {
        self.inner
            .parents
            .get(&nid)
            .map(|sv| sv.as_slice())
            .unwrap_or(EMPTY_NIDS)
    }

    /// Direct children of `nid`.
    pub fn children_of(&self, nid: Nid) -> &[Nid] {
        self.inner
            .children
            .get(&nid)
            .map(|sv| sv.as_slice())
            .unwrap_or(EMPTY_NIDS)
    }

    pub fn roots(&self) -> &[Nid] {
        &self.inner.roots
    }

    pub fn concepts(&self) -> &[Nid] {
        &self.inner.concepts
    }

    pub fn contains(&self, nid: Nid) -> bool {
        self.inner.concepts.binary_search(&nid).is_ok()
    }

    /// All ancestors of `nid` in BFS order, not including `nid`.
    pub fn ancestors_of(&self, nid: Nid) -> Vec<Nid> {
        bfs(nid, |n| self.parents_of(n))
    }

    /// All descendants of `nid` in BFS order, not including `nid`.
    pub fn descendants_of(&self, nid: Nid) -> Vec<Nid> {
        bfs(nid, |n| self.children_of(n))
    }

    /// True if `ancestor` is reachable from `nid` through is-a edges.
    pub fn is_descendant_of(&self, nid: Nid, ancestor: Nid) -> bool {
        if nid == ancestor {
            return false;
        }
        let mut visited: FxHashSet<Nid> = FxHashSet::default();
        let mut queue: VecDeque<Nid> = VecDeque::new();
        visited.insert(nid);
        queue.push_back(nid);
        while let Some(current) = queue.pop_front() {
            for &parent in self.parents_of(current) {
                if parent == ancestor {
                    return true;
                }
                if visited.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    /// Every `(parent, child)` edge, sorted.
    pub fn edges(&self) -> Vec<(Nid, Nid)> {
        let mut edges: Vec<(Nid, Nid)> = self
            .inner
            .parents
            .iter()
            .flat_map(|(child, parents)| parents.iter().map(move |parent| (*parent, *child)))
            .collect();
        edges.sort_unstable();
        edges
    }

    pub fn concept_count(&self) -> usize {
        self.inner.concepts.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count
    }

    pub fn stats(&self) -> CollectStats {
        self.inner.stats
    }

    pub fn is_empty(&self) -> bool {
        self.inner.concepts.is_empty()
    }
}

/// Nodes reachable from `start` through `next`, BFS order, excluding `start`
/// even when a cycle leads back to it.
fn bfs<'t>(start: Nid, next: impl Fn(Nid) -> &'t [Nid]) -> Vec<Nid> {
    let mut visited: FxHashSet<Nid> = FxHashSet::default();
    let mut queue: VecDeque<Nid> = VecDeque::new();
    let mut result: Vec<Nid> = Vec::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        for &n in next(current) {
            if visited.insert(n) {
                queue.push_back(n);
                result.push(n);
            }
        }
    }
    result
}
