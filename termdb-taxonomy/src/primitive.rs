//! Packed taxonomy record with a lazily unpacked view.
//!
//! The packed array is the only persisted form. The unpacked
//! [`TaxonomyRecord`] is built on first query and kept until the array is
//! replaced. Replacing the array always drops the cached view.

use crate::merge::merge_arrays;
use crate::policy::{ActivityPolicy, TaxonomyQuery};
use crate::record::TaxonomyRecord;
use crate::validate;
use std::sync::Arc;
use termdb_core::{Nid, Result, TaxonomyFlags, TypeFilter};

/// One concept's packed taxonomy record.
#[derive(Clone, Debug)]
pub struct TaxonomyRecordPrimitive {
    array: Arc<[i32]>,
    /// Decoded view of `array`; `None` until the first query.
    unpacked: Option<TaxonomyRecord>,
}

impl TaxonomyRecordPrimitive {
    /// Wrap a packed array. Nothing is decoded until the first query.
    pub fn new(array: impl Into<Arc<[i32]>>) -> Self {
        Self {
            array: array.into(),
            unpacked: None,
        }
    }

    /// Pack `record` and keep it as the cached view.
    pub fn from_record(record: TaxonomyRecord) -> Result<Self> {
        let array: Arc<[i32]> = record.pack()?.into();
        Ok(Self {
            array,
            unpacked: Some(record),
        })
    }

    /// The packed array.
    pub fn array(&self) -> &Arc<[i32]> {
        &self.array
    }

    pub fn into_array(self) -> Arc<[i32]> {
        self.array
    }

    /// Swap in a new packed array, dropping any cached view.
    pub fn replace_array(&mut self, array: impl Into<Arc<[i32]>>) {
        self.array = array.into();
        self.unpacked = None;
    }

    pub fn is_unpacked(&self) -> bool {
        self.unpacked.is_some()
    }

    /// The unpacked view, decoding the array on first call only.
    ///
    /// A decode failure leaves the primitive packed.
    pub fn unpack(&mut self) -> Result<&TaxonomyRecord> {
        let record = match self.unpacked.take() {
            Some(record) => record,
            None => TaxonomyRecord::from_packed(&self.array)?,
        };
        Ok(self.unpacked.insert(record))
    }

    /// Merge another packed snapshot of the same concept into this one.
    pub fn merge_in(&mut self, other: &[i32]) -> Result<()> {
        let merged = merge_arrays(self.array(), other)?;
        self.replace_array(merged);
        Ok(())
    }

    /// Merge two packed arrays. See [`merge_arrays`].
    pub fn merge(a: &[i32], b: &[i32]) -> Result<Vec<i32>> {
        merge_arrays(a, b)
    }

    /// Structural check of a packed array. See [`validate::validate`].
    pub fn validate(array: &[i32]) -> Result<()> {
        validate::validate(array)
    }

    // -----------------------------------------------------------------------
    // Delegating queries
    // -----------------------------------------------------------------------

    pub fn parent_nids(&mut self, is_a: Nid, query: &TaxonomyQuery<'_>) -> Result<Vec<Nid>> {
        Ok(self.unpack()?.parent_nids(is_a, query))
    }

    pub fn concept_nids_for_type(
        &mut self,
        type_filter: TypeFilter,
        query: &TaxonomyQuery<'_>,
    ) -> Result<Vec<Nid>> {
        Ok(self.unpack()?.concept_nids_for_type(type_filter, query))
    }

    pub fn contains_nid_via_type(
        &mut self,
        destination: Nid,
        type_filter: TypeFilter,
        query: &TaxonomyQuery<'_>,
    ) -> Result<bool> {
        Ok(self.unpack()?.contains_nid_via_type(destination, type_filter, query))
    }

    pub fn contains_stamp_of_type_with_flags(
        &mut self,
        type_filter: TypeFilter,
        flags: TaxonomyFlags,
    ) -> Result<bool> {
        Ok(self.unpack()?.contains_stamp_of_type_with_flags(type_filter, flags))
    }

    pub fn is_concept_active(&mut self, concept: Nid, policy: &dyn ActivityPolicy) -> Result<bool> {
        Ok(self.unpack()?.is_concept_active(concept, policy))
    }
}

impl From<Vec<i32>> for TaxonomyRecordPrimitive {
    fn from(array: Vec<i32>) -> Self {
        Self::new(array)
    }
}
