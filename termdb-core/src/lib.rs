//! # termdb core
//!
//! Shared vocabulary for the terminology taxonomy engine.
//!
//! This crate provides:
//! - Identifier newtypes: [`Nid`] (always negative) and [`Stamp`]
//! - [`TaxonomyFlag`] bits and the [`TaxonomyFlags`] set carried on every edge
//! - [`Status`] and an in-memory [`StampCatalog`]
//! - The [`Error`] type used across the workspace
//!
//! Nothing here does I/O; packed records and graph building live in
//! `termdb-taxonomy` and `termdb-graph`.

pub mod error;
pub mod flags;
pub mod ids;
pub mod stamp;

pub use error::{Error, Result};
pub use flags::{PremiseType, TaxonomyFlag, TaxonomyFlags, ALL_RELS};
pub use ids::{Nid, Stamp, TypeFilter, ANY_TYPE, FIRST_STAMP_SEQUENCE};
pub use stamp::{StampCatalog, StampRecord, Status};
