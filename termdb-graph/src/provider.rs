//! Concept-array providers.
//!
//! A provider maps a concept nid to that concept's current packed taxonomy
//! array. The collector calls it from every worker thread at once, so
//! implementations must tolerate unsynchronized concurrent reads.

use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use termdb_core::{Error, Nid, Result};
use termdb_taxonomy::{merge_arrays, validate, ActivityPolicy, TaxonomyRecord, VertexActivity};
use tracing::warn;

/// Read-only source of packed taxonomy arrays.
pub trait ConceptArrayProvider: Send + Sync {
    /// Current snapshot for `nid`, or `None` when the concept has no record.
    fn taxonomy_array(&self, nid: Nid) -> Option<Arc<[i32]>>;

    /// Like [`taxonomy_array`](Self::taxonomy_array), but a missing record is
    /// an error.
    fn require(&self, nid: Nid) -> Result<Arc<[i32]>> {
        self.taxonomy_array(nid).ok_or(Error::MissingRecord(nid))
    }
}

impl<F> ConceptArrayProvider for F
where
    F: Fn(Nid) -> Option<Arc<[i32]>> + Send + Sync,
{
    fn taxonomy_array(&self, nid: Nid) -> Option<Arc<[i32]>> {
        self(nid)
    }
}

// ---------------------------------------------------------------------------
// MemoryTaxonomyStore
// ---------------------------------------------------------------------------

/// In-memory provider over a map of packed arrays.
///
/// Writers validate every array before it becomes visible, so readers only
/// ever see well-formed snapshots.
#[derive(Debug, Default)]
pub struct MemoryTaxonomyStore {
    arrays: RwLock<FxHashMap<Nid, Arc<[i32]>>>,
}

impl MemoryTaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `nid`'s array.
    pub fn insert(&self, nid: Nid, array: impl Into<Arc<[i32]>>) -> Result<()> {
        let array = array.into();
        validate(&array)?;
        self.arrays.write().insert(nid, array);
        Ok(())
    }

    /// Pack `record` and store it as `nid`'s array.
    pub fn insert_record(&self, nid: Nid, record: &TaxonomyRecord) -> Result<()> {
        self.insert(nid, record.pack()?)
    }

    /// Merge `array` into `nid`'s current array (or store it if absent).
    pub fn merge_insert(&self, nid: Nid, array: &[i32]) -> Result<()> {
        validate(array)?;
        let mut arrays = self.arrays.write();
        let merged: Arc<[i32]> = match arrays.get(&nid) {
            Some(existing) => merge_arrays(existing, array)?.into(),
            None => merge_arrays(&[], array)?.into(),
        };
        arrays.insert(nid, merged);
        Ok(())
    }

    pub fn remove(&self, nid: Nid) -> Option<Arc<[i32]>> {
        self.arrays.write().remove(&nid)
    }

    /// Every stored concept, ascending.
    pub fn concept_nids(&self) -> Vec<Nid> {
        let mut nids: Vec<Nid> = self.arrays.read().keys().copied().collect();
        nids.sort_unstable();
        nids
    }

    pub fn len(&self) -> usize {
        self.arrays.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.read().is_empty()
    }
}

impl ConceptArrayProvider for MemoryTaxonomyStore {
    fn taxonomy_array(&self, nid: Nid) -> Option<Arc<[i32]>> {
        self.arrays.read().get(&nid).cloned()
    }
}

// ---------------------------------------------------------------------------
// ProviderVertexActivity
// ---------------------------------------------------------------------------

/// Vertex activity read from each destination's own status pseudo-edge.
///
/// A destination with no record, or with an undecodable one, is inactive.
/// Lookups never mutate: [`with_resolved`](Self::with_resolved) answers a
/// known population up front, and any other nid is resolved on every call.
pub struct ProviderVertexActivity<'a> {
    provider: &'a dyn ConceptArrayProvider,
    policy: &'a dyn ActivityPolicy,
    resolved: FxHashMap<Nid, bool>,
}

impl<'a> ProviderVertexActivity<'a> {
    pub fn new(provider: &'a dyn ConceptArrayProvider, policy: &'a dyn ActivityPolicy) -> Self {
        Self {
            provider,
            policy,
            resolved: FxHashMap::default(),
        }
    }

    /// Resolve every nid in `nids` in parallel and keep the answers.
    ///
    /// Call before collection; the table is read-only afterwards.
    pub fn with_resolved(mut self, nids: &[Nid]) -> Self {
        let answers: Vec<(Nid, bool)> = nids
            .par_iter()
            .map(|&nid| (nid, self.resolve(nid)))
            .collect();
        self.resolved.extend(answers);
        self
    }

    /// Number of pre-resolved vertices.
    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    fn resolve(&self, nid: Nid) -> bool {
        let Some(array) = self.provider.taxonomy_array(nid) else {
            return false;
        };
        match TaxonomyRecord::from_packed(&array) {
            Ok(record) => record.is_concept_active(nid, self.policy),
            Err(e) => {
                warn!(
                    concept = nid.0,
                    error = %e,
                    "undecodable destination record; treating vertex as inactive"
                );
                false
            }
        }
    }
}

impl VertexActivity for ProviderVertexActivity<'_> {
    fn is_vertex_active(&self, nid: Nid) -> bool {
        match self.resolved.get(&nid) {
            Some(active) => *active,
            None => self.resolve(nid),
        }
    }
}

impl std::fmt::Debug for ProviderVertexActivity<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderVertexActivity")
            .field("resolved", &self.resolved.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termdb_core::{Stamp, StampCatalog, StampRecord, Status};
    use termdb_taxonomy::AsOfPolicy;

    const STATED: i32 = 0x1000_0000;

    #[test]
    fn test_store_insert_and_read() {
        let store = MemoryTaxonomyStore::new();
        assert!(store.is_empty());
        store.insert(Nid(-100), vec![-200, 4, -50, 1, STATED]).unwrap();
        store.insert(Nid(-300), Vec::<i32>::new()).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.concept_nids(), vec![Nid(-300), Nid(-100)]);
        assert_eq!(
            store.taxonomy_array(Nid(-100)).as_deref(),
            Some(&[-200, 4, -50, 1, STATED][..])
        );
        assert!(store.taxonomy_array(Nid(-999)).is_none());
        assert!(matches!(store.require(Nid(-999)), Err(Error::MissingRecord(Nid(-999)))));
    }

    #[test]
    fn test_store_rejects_invalid_array() {
        let store = MemoryTaxonomyStore::new();
        let err = store.insert(Nid(-100), vec![200, 4, -50, 1, STATED]).unwrap_err();
        assert!(err.is_invalid_record());
        assert!(store.is_empty());
    }

    #[test]
    fn test_merge_insert() {
        let store = MemoryTaxonomyStore::new();
        store.merge_insert(Nid(-100), &[-200, 4, -50, 1001, STATED]).unwrap();
        store.merge_insert(Nid(-100), &[-200, 4, -50, 1002, 0x2000_0000]).unwrap();
        assert_eq!(
            store.require(Nid(-100)).unwrap().as_ref(),
            &[-200, 7, -50, 1001, STATED, -50, 1002, 0x2000_0000]
        );
        assert!(store.remove(Nid(-100)).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn test_closure_provider() {
        let provider =
            |nid: Nid| (nid == Nid(-1)).then(|| Arc::<[i32]>::from(vec![-2, 4, -50, 1, STATED]));
        assert!(provider.taxonomy_array(Nid(-1)).is_some());
        assert!(provider.require(Nid(-2)).is_err());
    }

    #[test]
    fn test_provider_vertex_activity() {
        let catalog = StampCatalog::new();
        let author = Nid(-5);
        catalog
            .insert(Stamp(1), StampRecord::new(Status::Active, 10, author, Nid(-10), Nid(-1)))
            .unwrap();
        catalog
            .insert(Stamp(2), StampRecord::new(Status::Inactive, 20, author, Nid(-10), Nid(-1)))
            .unwrap();
        let policy = AsOfPolicy::latest(Arc::new(catalog));

        let store = MemoryTaxonomyStore::new();
        let mut active = TaxonomyRecord::new();
        active.add_concept_status(Nid(-200), Stamp(1)).unwrap();
        store.insert_record(Nid(-200), &active).unwrap();

        let mut retired = TaxonomyRecord::new();
        retired.add_concept_status(Nid(-300), Stamp(1)).unwrap();
        retired.add_concept_status(Nid(-300), Stamp(2)).unwrap();
        store.insert_record(Nid(-300), &retired).unwrap();

        let vertices = ProviderVertexActivity::new(&store, &policy);
        assert!(vertices.is_vertex_active(Nid(-200)));
        assert!(!vertices.is_vertex_active(Nid(-300)));
        assert!(!vertices.is_vertex_active(Nid(-400)), "missing record is inactive");
        assert_eq!(vertices.resolved_len(), 0, "lookups do not write");

        let resolved = ProviderVertexActivity::new(&store, &policy)
            .with_resolved(&[Nid(-200), Nid(-300), Nid(-400)]);
        assert_eq!(resolved.resolved_len(), 3);
        // Answers are fixed at resolve time.
        store.remove(Nid(-200));
        assert!(resolved.is_vertex_active(Nid(-200)));
        assert!(!resolved.is_vertex_active(Nid(-300)));
        assert!(!resolved.is_vertex_active(Nid(-400)));
        assert!(!vertices.is_vertex_active(Nid(-200)));
    }
}
