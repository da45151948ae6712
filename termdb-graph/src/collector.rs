//! Parallel is-a graph collection.
//!
//! Collection is a three-function reduction over the concept population:
//!
//! - **supplier**: every rayon task starts from an empty [`TreeBuilder`]
//! - **accept**: read one concept's packed record, resolve its is-a parents
//!   under the premise flag and the edge/vertex policies, and record the
//!   edges in the task's builder
//! - **combine**: fold one builder into another after accumulation
//!
//! Workers never share mutable state; the provider is the only shared input
//! and is read-only. A concept without a record is logged and skipped. A
//! record that fails to decode aborts the run.

use crate::config::CollectorConfig;
use crate::provider::ConceptArrayProvider;
use crate::tree::{TaxonomyTree, TreeBuilder};
use rayon::prelude::*;
use termdb_core::{Error, Nid, Result};
use termdb_taxonomy::{
    ActivityPolicy, NidOrder, TaxonomyQuery, TaxonomyRecordPrimitive, VertexActivity, VertexSort,
};
use tracing::{debug, info, trace, warn};

/// Builds a [`TaxonomyTree`] from a provider and a pair of activity policies.
pub struct GraphCollector<'a> {
    provider: &'a dyn ConceptArrayProvider,
    edges: &'a dyn ActivityPolicy,
    vertices: &'a dyn VertexActivity,
    sort: &'a dyn VertexSort,
    config: CollectorConfig,
}

impl<'a> GraphCollector<'a> {
    /// Fails if `config` does not validate.
    pub fn new(
        provider: &'a dyn ConceptArrayProvider,
        edges: &'a dyn ActivityPolicy,
        vertices: &'a dyn VertexActivity,
        config: CollectorConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            provider,
            edges,
            vertices,
            sort: &NidOrder,
            config,
        })
    }

    /// Order parent lists with `sort` instead of ascending nid.
    pub fn with_sort(mut self, sort: &'a dyn VertexSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn query(&self) -> TaxonomyQuery<'_> {
        TaxonomyQuery::new(self.config.premise.flags(), self.edges, self.vertices, self.sort)
    }

    /// Fresh per-task accumulator.
    pub fn supplier(&self) -> TreeBuilder {
        TreeBuilder::new()
    }

    /// Add `origin`'s is-a edges to `builder`.
    ///
    /// A missing record is counted and skipped. Only a malformed record is
    /// an error.
    pub fn accept(&self, builder: &mut TreeBuilder, origin: Nid) -> Result<()> {
        let Some(array) = self.provider.taxonomy_array(origin) else {
            builder.note_missing();
            if self.config.log_missing {
                warn!(concept = origin.0, "no taxonomy record; concept excluded from tree");
            } else {
                trace!(concept = origin.0, "no taxonomy record; concept excluded from tree");
            }
            return Ok(());
        };

        let mut primitive = TaxonomyRecordPrimitive::new(array);
        let parents = primitive
            .parent_nids(self.config.is_a, &self.query())
            .map_err(|e| with_concept(e, origin))?;

        builder.add_concept(origin);
        if parents.is_empty() {
            builder.note_without_parents();
            debug!(concept = origin.0, "no active is-a parents");
        }
        for parent in parents {
            builder.add_parent(origin, parent);
        }
        Ok(())
    }

    /// Fold `right` into `left`.
    pub fn combine(&self, mut left: TreeBuilder, right: TreeBuilder) -> TreeBuilder {
        left.combine(right);
        left
    }

    /// Collect `nids` in parallel.
    ///
    /// Runs on a dedicated pool when the config sets `threads`, otherwise on
    /// the rayon global pool. The result does not depend on the thread count.
    pub fn collect(&self, nids: &[Nid]) -> Result<TaxonomyTree> {
        let threads = self.config.threads.unwrap_or_else(rayon::current_num_threads);
        let span = tracing::debug_span!("graph_collect", concepts = nids.len(), threads = threads);
        let _guard = span.enter();

        let builder = match self.config.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("termdb-graph-{i}"))
                    .build()
                    .map_err(|e| Error::config(format!("rayon pool: {e}")))?;
                pool.install(|| self.reduce_parallel(nids))?
            }
            None => self.reduce_parallel(nids)?,
        };
        Ok(self.finish(builder))
    }

    /// Collect `nids` on the calling thread.
    pub fn collect_sequential(&self, nids: &[Nid]) -> Result<TaxonomyTree> {
        let span = tracing::debug_span!("graph_collect", concepts = nids.len(), threads = 1usize);
        let _guard = span.enter();

        let mut builder = self.supplier();
        for &nid in nids {
            self.accept(&mut builder, nid)?;
        }
        Ok(self.finish(builder))
    }

    fn reduce_parallel(&self, nids: &[Nid]) -> Result<TreeBuilder> {
        let parent = tracing::Span::current();
        nids.par_iter()
            .with_min_len(self.config.min_batch_len)
            .try_fold(
                || self.supplier(),
                |mut builder, &nid| {
                    let _p = parent.enter();
                    self.accept(&mut builder, nid)?;
                    Ok::<_, Error>(builder)
                },
            )
            .try_reduce(|| self.supplier(), |left, right| Ok(self.combine(left, right)))
    }

    fn finish(&self, builder: TreeBuilder) -> TaxonomyTree {
        let tree = builder.build();
        let stats = tree.stats();
        info!(
            processed = stats.processed,
            missing = stats.missing,
            without_parents = stats.without_parents,
            concepts = tree.concept_count(),
            edges = tree.edge_count(),
            premise = ?self.config.premise,
            "taxonomy graph collected"
        );
        tree
    }
}

impl std::fmt::Debug for GraphCollector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCollector")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Prefix a decode error with the concept whose record failed.
fn with_concept(err: Error, origin: Nid) -> Error {
    match err {
        Error::InvalidRecord { offset, reason } => {
            Error::invalid_record(offset, format!("record of concept {}: {reason}", origin.0))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use termdb_core::{PremiseType, Stamp, Status};
    use termdb_taxonomy::AllVerticesActive;

    const IS_A: Nid = Nid(-50);
    const STATED: i32 = 0x1000_0000;
    const INFERRED: i32 = 0x2000_0000;

    /// Every stamp is active; the highest stamp is latest.
    struct AllActive;

    impl ActivityPolicy for AllActive {
        fn is_latest_active(&self, stamps: &[Stamp]) -> bool {
            !stamps.is_empty()
        }
        fn latest_stamps(&self, stamps: &[Stamp]) -> Vec<Stamp> {
            stamps.iter().max().copied().into_iter().collect()
        }
        fn on_route(&self, _stamp: Stamp) -> bool {
            true
        }
        fn status(&self, _stamp: Stamp) -> Option<Status> {
            Some(Status::Active)
        }
    }

    fn provider(nid: Nid) -> Option<Arc<[i32]>> {
        let array: Vec<i32> = match nid.0 {
            -100 => vec![-200, 4, -50, 1, STATED],
            -200 => vec![-300, 7, -50, 1, STATED, -50, 2, INFERRED],
            -300 => vec![],
            -400 => vec![-300, 4, -50, 1, INFERRED],
            _ => return None,
        };
        Some(array.into())
    }

    fn collector(premise: PremiseType) -> GraphCollector<'static> {
        let config = CollectorConfig::new(IS_A).with_premise(premise).with_min_batch_len(1);
        GraphCollector::new(&provider, &AllActive, &AllVerticesActive, config).unwrap()
    }

    #[test]
    fn test_accept_records_parents() {
        let collector = collector(PremiseType::Stated);
        let mut builder = collector.supplier();
        collector.accept(&mut builder, Nid(-100)).unwrap();
        collector.accept(&mut builder, Nid(-300)).unwrap();
        collector.accept(&mut builder, Nid(-999)).unwrap();

        let tree = builder.build();
        assert_eq!(tree.parents_of(Nid(-100)), &[Nid(-200)]);
        assert_eq!(tree.stats().processed, 2);
        assert_eq!(tree.stats().missing, 1);
        assert_eq!(tree.stats().without_parents, 1);
    }

    #[test]
    fn test_premise_selects_edges() {
        let nids = [Nid(-100), Nid(-200), Nid(-300), Nid(-400)];

        let stated = collector(PremiseType::Stated).collect_sequential(&nids).unwrap();
        assert_eq!(
            stated.edges(),
            vec![(Nid(-300), Nid(-200)), (Nid(-200), Nid(-100))]
        );

        let inferred = collector(PremiseType::Inferred).collect_sequential(&nids).unwrap();
        assert_eq!(
            inferred.edges(),
            vec![(Nid(-300), Nid(-400)), (Nid(-300), Nid(-200))]
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let nids = [Nid(-100), Nid(-200), Nid(-300), Nid(-400), Nid(-500)];
        let collector = collector(PremiseType::Stated);
        assert_eq!(
            collector.collect(&nids).unwrap(),
            collector.collect_sequential(&nids).unwrap()
        );
    }

    #[test]
    fn test_invalid_record_aborts() {
        let corrupt = |nid: Nid| -> Option<Arc<[i32]>> {
            (nid == Nid(-100)).then(|| Arc::from(vec![-200, 4, 50, 1, STATED]))
        };
        let collector = GraphCollector::new(
            &corrupt,
            &AllActive,
            &AllVerticesActive,
            CollectorConfig::new(IS_A),
        )
        .unwrap();
        let err = collector.collect(&[Nid(-100)]).unwrap_err();
        assert!(err.is_invalid_record());
        assert!(err.to_string().contains("-100"), "{err}");
    }

    #[test]
    fn test_non_nid_destination_never_reaches_tree() {
        let corrupt = |nid: Nid| -> Option<Arc<[i32]>> {
            (nid == Nid(-100)).then(|| Arc::from(vec![200, 4, -50, 1, STATED]))
        };
        let config = CollectorConfig::new(IS_A).with_min_batch_len(1);
        let collector =
            GraphCollector::new(&corrupt, &AllActive, &AllVerticesActive, config).unwrap();
        let err = collector.collect_sequential(&[Nid(-100)]).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { offset: 0, .. }), "{err}");
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = GraphCollector::new(
            &provider,
            &AllActive,
            &AllVerticesActive,
            CollectorConfig::default(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
