//! Is-a hierarchy construction over packed taxonomy records
//!
//! This crate walks a concept population in parallel, reads each concept's
//! packed taxonomy record from a [`ConceptArrayProvider`], and builds the
//! is-a [`TaxonomyTree`] visible under a premise (stated or inferred) and a
//! pair of edge/vertex activity policies.
//!
//! # Example
//!
//! ```ignore
//! use termdb_graph::{CollectorConfig, GraphCollector, MemoryTaxonomyStore};
//!
//! let store = MemoryTaxonomyStore::new();
//! store.insert(Nid(-100), vec![-200, 4, -50, 1001, 0x1000_0000])?;
//!
//! let config = CollectorConfig::new(Nid(-50)).with_premise(PremiseType::Stated);
//! let collector = GraphCollector::new(&store, &policy, &AllVerticesActive, config)?;
//! let tree = collector.collect(&store.concept_nids())?;
//! assert_eq!(tree.parents_of(Nid(-100)), &[Nid(-200)]);
//! ```

pub mod collector;
pub mod config;
pub mod provider;
pub mod tree;

pub use collector::GraphCollector;
pub use config::{CollectorConfig, DEFAULT_MIN_BATCH_LEN};
pub use provider::{ConceptArrayProvider, MemoryTaxonomyStore, ProviderVertexActivity};
pub use tree::{CollectStats, TaxonomyTree, TreeBuilder};
