//! Unpacked taxonomy record: other-concept nid -> versioned edge set.
//!
//! One record exists per origin concept. The origin's own activation-status
//! history is kept as a pseudo-edge under the origin's own nid, flagged
//! `CONCEPT_STATUS`; its type word is ignored by status queries.
//!
//! This form is a disposable cache of the packed array. [`TaxonomyRecord::pack`]
//! produces the canonical array: ascending other-concept nid, and within each
//! sub-record ascending (type, stamp).

use crate::edge::{StampList, TypeStampRecord, TypeStampRecords};
use crate::layout::scan_checked;
use crate::policy::{ActivityPolicy, TaxonomyQuery};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use termdb_core::{Error, Nid, Result, Stamp, Status, TaxonomyFlags, TypeFilter};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaxonomyRecord {
    records: FxHashMap<Nid, TypeStampRecords>,
}

impl TaxonomyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a packed array.
    ///
    /// Sub-records need not be in canonical order; duplicate nids or keys are
    /// merged. Fails on anything [`validate`](crate::validate()) rejects.
    pub fn from_packed(array: &[i32]) -> Result<Self> {
        let mut record = Self::new();
        for pos in scan_checked(array)? {
            let set = TypeStampRecords::from_words(pos.triples(array), pos.triples_offset())?;
            record.merge_set(Nid(pos.nid), &set)?;
        }
        Ok(record)
    }

    /// Canonical packed form.
    pub fn pack(&self) -> Result<Vec<i32>> {
        let mut nids: Vec<Nid> = self.records.keys().copied().collect();
        nids.sort_unstable();
        let words: usize = self.records.values().map(|s| s.packed_len() + 1).sum();
        let mut out = Vec::with_capacity(words);
        for nid in nids {
            out.push(nid.0);
            self.records[&nid].write_to(&mut out)?;
        }
        Ok(out)
    }

    /// Fold every entry of `other` into this record.
    pub fn merge(&mut self, other: &TaxonomyRecord) -> Result<()> {
        for (nid, set) in &other.records {
            self.merge_set(*nid, set)?;
        }
        Ok(())
    }

    fn merge_set(&mut self, nid: Nid, set: &TypeStampRecords) -> Result<()> {
        match self.records.get_mut(&nid) {
            Some(existing) => existing.merge(set),
            None => {
                self.records.insert(nid, set.clone());
                Ok(())
            }
        }
    }

    /// Record one versioned edge from the origin concept to `destination`.
    pub fn add_stamp_record(
        &mut self,
        destination: Nid,
        type_nid: Nid,
        stamp: Stamp,
        flags: TaxonomyFlags,
    ) -> Result<()> {
        if !destination.is_valid() {
            return Err(Error::invalid_edge(format!(
                "destination {} is not a nid",
                destination.0
            )));
        }
        let record = TypeStampRecord::new(type_nid, stamp, flags)?;
        self.records.entry(destination).or_default().add(record)
    }

    /// Record a version of `concept`'s own activation status.
    pub fn add_concept_status(&mut self, concept: Nid, stamp: Stamp) -> Result<()> {
        self.add_stamp_record(concept, concept, stamp, TaxonomyFlags::CONCEPT_STATUS)
    }

    pub fn get(&self, nid: Nid) -> Option<&TypeStampRecords> {
        self.records.get(&nid)
    }

    /// Other-concept nids in ascending order (including the pseudo-edge key).
    pub fn concept_nids(&self) -> Vec<Nid> {
        let mut nids: Vec<Nid> = self.records.keys().copied().collect();
        nids.sort_unstable();
        nids
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// True if any edge version matches the type and carries every bit of `flags`.
    pub fn contains_stamp_of_type_with_flags(
        &self,
        type_filter: TypeFilter,
        flags: TaxonomyFlags,
    ) -> bool {
        self.records
            .values()
            .any(|set| set.contains_stamp_of_type_with_flags(type_filter, flags))
    }

    /// Destinations reached through an active edge of `type_filter` whose
    /// destination concept is itself active, ordered by the query's sort.
    pub fn concept_nids_for_type(
        &self,
        type_filter: TypeFilter,
        query: &TaxonomyQuery<'_>,
    ) -> Vec<Nid> {
        let mut result: Vec<Nid> = self
            .records
            .iter()
            .filter(|(nid, set)| Self::edge_reaches(**nid, set, type_filter, query))
            .map(|(nid, _)| *nid)
            .collect();
        query.sort.sort(&mut result);
        result
    }

    /// Destinations reached through an active edge of any of `types`.
    pub fn destination_nids_of_type(&self, types: &[Nid], query: &TaxonomyQuery<'_>) -> Vec<Nid> {
        let mut result: Vec<Nid> = self
            .records
            .iter()
            .filter(|(nid, set)| {
                types
                    .iter()
                    .any(|t| Self::edge_reaches(**nid, set, TypeFilter::Is(*t), query))
            })
            .map(|(nid, _)| *nid)
            .collect();
        query.sort.sort(&mut result);
        result
    }

    /// Destinations reached through an active edge whose type is not in `types`.
    pub fn destination_nids_not_of_type(
        &self,
        types: &[Nid],
        query: &TaxonomyQuery<'_>,
    ) -> Vec<Nid> {
        let mut result: Vec<Nid> = self
            .records
            .iter()
            .filter(|(nid, set)| {
                set.active_types_with_flags(query.flags, query.edges)
                    .into_iter()
                    .any(|t| !types.contains(&t))
                    && query.vertices.is_vertex_active(**nid)
            })
            .map(|(nid, _)| *nid)
            .collect();
        query.sort.sort(&mut result);
        result
    }

    /// Short-circuiting existence check for
    /// [`destination_nids_of_type`](Self::destination_nids_of_type).
    pub fn contains_destination_of_type(&self, types: &[Nid], query: &TaxonomyQuery<'_>) -> bool {
        self.records.iter().any(|(nid, set)| {
            types
                .iter()
                .any(|t| Self::edge_reaches(*nid, set, TypeFilter::Is(*t), query))
        })
    }

    /// True if `destination` is reached through an active edge of `type_filter`.
    pub fn contains_nid_via_type(
        &self,
        destination: Nid,
        type_filter: TypeFilter,
        query: &TaxonomyQuery<'_>,
    ) -> bool {
        self.records
            .get(&destination)
            .is_some_and(|set| Self::edge_reaches(destination, set, type_filter, query))
    }

    /// Is-a parents of the origin concept.
    pub fn parent_nids(&self, is_a: Nid, query: &TaxonomyQuery<'_>) -> Vec<Nid> {
        self.concept_nids_for_type(TypeFilter::Is(is_a), query)
    }

    /// Relationship types currently active from the origin to `destination`,
    /// ascending. Destination activity is not consulted.
    pub fn types_for_relationship(&self, destination: Nid, query: &TaxonomyQuery<'_>) -> Vec<Nid> {
        self.records
            .get(&destination)
            .map(|set| set.active_types_with_flags(query.flags, query.edges))
            .unwrap_or_default()
    }

    fn edge_reaches(
        destination: Nid,
        set: &TypeStampRecords,
        type_filter: TypeFilter,
        query: &TaxonomyQuery<'_>,
    ) -> bool {
        set.is_active_with_flags(type_filter, query.flags, query.edges)
            && query.vertices.is_vertex_active(destination)
    }

    // -----------------------------------------------------------------------
    // Concept status (pseudo-edge keyed by the concept's own nid)
    // -----------------------------------------------------------------------

    /// Every stamp recorded on `concept`'s status pseudo-edge.
    pub fn concept_status_stamps(&self, concept: Nid) -> StampList {
        self.records
            .get(&concept)
            .map(|set| {
                set.stamps_of_type_with_flags(TypeFilter::Any, TaxonomyFlags::CONCEPT_STATUS)
            })
            .unwrap_or_default()
    }

    /// True if the latest status version of `concept` is active.
    pub fn is_concept_active(&self, concept: Nid, policy: &dyn ActivityPolicy) -> bool {
        let stamps = self.concept_status_stamps(concept);
        !stamps.is_empty() && policy.is_latest_active(&stamps)
    }

    /// True if any status version of `concept` lies on the policy's route,
    /// i.e. the concept exists at that position regardless of its status.
    pub fn concept_satisfies_stamp(&self, concept: Nid, policy: &dyn ActivityPolicy) -> bool {
        self.concept_status_stamps(concept)
            .iter()
            .any(|s| policy.on_route(*s))
    }

    /// Statuses of the latest status versions (more than one on contradiction).
    pub fn concept_states(&self, concept: Nid, policy: &dyn ActivityPolicy) -> BTreeSet<Status> {
        let stamps = self.concept_status_stamps(concept);
        policy
            .latest_stamps(&stamps)
            .into_iter()
            .filter_map(|s| policy.status(s))
            .collect()
    }

    /// Statuses of every status version on the policy's route.
    pub fn historical_states(&self, concept: Nid, policy: &dyn ActivityPolicy) -> BTreeSet<Status> {
        self.concept_status_stamps(concept)
            .into_iter()
            .filter(|s| policy.on_route(*s))
            .filter_map(|s| policy.status(s))
            .collect()
    }
}

impl fmt::Display for TaxonomyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nid in self.concept_nids() {
            writeln!(f, "{}: {}", nid.0, self.records[&nid])?;
        }
        Ok(())
    }
}
