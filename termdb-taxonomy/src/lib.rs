//! Packed per-concept taxonomy records
//!
//! Every concept owns one taxonomy record: the versioned edges from that
//! concept to every other concept it relates to, plus its own status history.
//! The persisted form is a flat `i32` array:
//!
//! ```text
//! [otherNid, len, (type, stamp, flags) * n] ...     len = 1 + 3n
//! ```
//!
//! # Design
//!
//! - **Canonical packing**: sub-records ascend by other-concept nid, triples
//!   ascend by (type, stamp). Every producer keeps this order.
//! - **Two views**: [`TaxonomyRecordPrimitive`] holds the array and unpacks
//!   lazily into a [`TaxonomyRecord`] (nid -> [`TypeStampRecords`]).
//! - **Array-level merge**: [`merge_arrays`] combines two snapshots with a
//!   nested sort-merge and never builds the map.
//! - **Injected activity**: queries take a [`TaxonomyQuery`] carrying the edge
//!   [`ActivityPolicy`], the [`VertexActivity`] and the [`VertexSort`].
//!
//! # Example
//!
//! ```ignore
//! use termdb_taxonomy::{TaxonomyRecordPrimitive, TaxonomyQuery, AllVerticesActive, NidOrder};
//!
//! let mut primitive = TaxonomyRecordPrimitive::new(vec![-200, 4, -50, 1001, 0x1000_0000]);
//! let query = TaxonomyQuery::new(TaxonomyFlags::STATED, &policy, &AllVerticesActive, &NidOrder);
//! assert_eq!(primitive.parent_nids(Nid(-50), &query)?, vec![Nid(-200)]);
//! ```

pub mod edge;
mod layout;
pub mod merge;
pub mod policy;
pub mod primitive;
pub mod record;
pub mod validate;

pub use edge::{EdgeKey, StampList, TypeStampRecord, TypeStampRecords};
pub use merge::merge_arrays;
pub use policy::{
    ActivityPolicy, AllVerticesActive, AsOfPolicy, NidOrder, TaxonomyQuery, VertexActivity,
    VertexSort,
};
pub use primitive::TaxonomyRecordPrimitive;
pub use record::TaxonomyRecord;
pub use validate::validate;
