//! Versioned edge records.
//!
//! A [`TypeStampRecord`] is one (type, stamp, flags) triple. The
//! [`TypeStampRecords`] set holds every triple between one origin concept and
//! one other concept, keyed by (type, stamp). Records sharing a key reconcile
//! by OR-ing their flags, so a set never holds a key twice.

use crate::layout::TRIPLE_WORDS;
use crate::policy::ActivityPolicy;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use termdb_core::{Error, Nid, Result, Stamp, TaxonomyFlag, TaxonomyFlags, TypeFilter};

/// Stamps gathered for one query; most edges carry only a few versions.
pub type StampList = SmallVec<[Stamp; 4]>;

/// Composite (type, stamp) key.
///
/// Field order gives the ascending iteration order used when packing.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct EdgeKey {
    pub type_nid: Nid,
    pub stamp: Stamp,
}

impl EdgeKey {
    pub fn new(type_nid: Nid, stamp: Stamp) -> Self {
        Self { type_nid, stamp }
    }
}

// ---------------------------------------------------------------------------
// TypeStampRecord
// ---------------------------------------------------------------------------

/// One versioned edge: relationship type, version stamp and flag bits.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeStampRecord {
    type_nid: Nid,
    stamp: Stamp,
    flags: TaxonomyFlags,
}

impl TypeStampRecord {
    /// Create a record. The type must be a nid (negative).
    pub fn new(type_nid: Nid, stamp: Stamp, flags: TaxonomyFlags) -> Result<Self> {
        if !type_nid.is_valid() {
            return Err(Error::invalid_edge(format!(
                "relationship type {} is not a nid (stamp {}, flags {})",
                type_nid.0, stamp.0, flags
            )));
        }
        Ok(Self {
            type_nid,
            stamp,
            flags,
        })
    }

    #[inline]
    pub fn type_nid(&self) -> Nid {
        self.type_nid
    }

    #[inline]
    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    #[inline]
    pub fn flags(&self) -> TaxonomyFlags {
        self.flags
    }

    #[inline]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.type_nid, self.stamp)
    }

    /// Fold `other` into this record.
    ///
    /// Succeeds only when type and stamp are identical, in which case the flag
    /// bits are OR'ed. Returns `false` otherwise and leaves `self` unchanged.
    pub fn merge(&mut self, other: &TypeStampRecord) -> bool {
        if self.type_nid != other.type_nid || self.stamp != other.stamp {
            return false;
        }
        self.flags |= other.flags;
        true
    }
}

impl fmt::Display for TypeStampRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[type {} stamp {} {}]",
            self.type_nid.0, self.stamp.0, self.flags
        )
    }
}

// ---------------------------------------------------------------------------
// TypeStampRecords
// ---------------------------------------------------------------------------

/// All versioned edges from one origin concept to one other concept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeStampRecords {
    records: BTreeMap<EdgeKey, TaxonomyFlags>,
}

impl TypeStampRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode triple words (everything after a sub-record's length word).
    ///
    /// `offset` is the position of `words[0]` in the enclosing array and is
    /// only used for error reporting.
    pub fn from_words(words: &[i32], offset: usize) -> Result<Self> {
        if words.len() % TRIPLE_WORDS != 0 {
            return Err(Error::invalid_record(
                offset,
                format!("{} triple words do not frame whole triples", words.len()),
            ));
        }
        let mut set = Self::new();
        for (i, triple) in words.chunks_exact(TRIPLE_WORDS).enumerate() {
            let record = TypeStampRecord::new(
                Nid(triple[0]),
                Stamp(triple[1]),
                TaxonomyFlags::from_word(triple[2]),
            )
            .map_err(|e| Error::invalid_record(offset + i * TRIPLE_WORDS, e.to_string()))?;
            set.add(record)?;
        }
        Ok(set)
    }

    /// Insert a record, merging flags into an existing record with the same key.
    pub fn add(&mut self, record: TypeStampRecord) -> Result<()> {
        let key = record.key();
        match self.records.get_mut(&key) {
            None => {
                self.records.insert(key, record.flags);
            }
            Some(flags) => {
                let mut existing = TypeStampRecord {
                    type_nid: key.type_nid,
                    stamp: key.stamp,
                    flags: *flags,
                };
                if !existing.merge(&record) {
                    return Err(Error::merge_conflict(format!(
                        "record {record} cannot merge into {existing} under key {key:?}"
                    )));
                }
                *flags = existing.flags;
            }
        }
        Ok(())
    }

    /// Insert-or-merge every record of `other`.
    pub fn merge(&mut self, other: &TypeStampRecords) -> Result<()> {
        for record in other.iter() {
            self.add(record)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending (type, stamp) order.
    pub fn iter(&self) -> impl Iterator<Item = TypeStampRecord> + '_ {
        self.records.iter().map(|(key, flags)| TypeStampRecord {
            type_nid: key.type_nid,
            stamp: key.stamp,
            flags: *flags,
        })
    }

    /// Value of the length word this set packs under (`1 + 3n`).
    pub fn packed_len(&self) -> usize {
        1 + TRIPLE_WORDS * self.records.len()
    }

    /// Append the length word followed by every triple in key order.
    pub fn write_to(&self, out: &mut Vec<i32>) -> Result<()> {
        let len = i32::try_from(self.packed_len()).map_err(|_| {
            Error::invalid_record(out.len(), "sub-record length exceeds the i32 range")
        })?;
        out.reserve(self.packed_len());
        out.push(len);
        for (key, flags) in &self.records {
            out.push(key.type_nid.0);
            out.push(key.stamp.0);
            out.push(flags.word());
        }
        Ok(())
    }

    /// Stamps of records whose type matches and whose flags include `flags`.
    pub fn stamps_of_type_with_flags(
        &self,
        type_filter: TypeFilter,
        flags: TaxonomyFlags,
    ) -> StampList {
        self.records
            .iter()
            .filter(|(key, rec_flags)| {
                type_filter.matches(key.type_nid) && rec_flags.contains(flags)
            })
            .map(|(key, _)| key.stamp)
            .collect()
    }

    /// Like [`stamps_of_type_with_flags`](Self::stamps_of_type_with_flags),
    /// but skips concept-status pseudo-edge triples unless the requested
    /// flags ask for them.
    pub fn relationship_stamps(&self, type_filter: TypeFilter, flags: TaxonomyFlags) -> StampList {
        let want_status = flags.has(TaxonomyFlag::ConceptStatus);
        self.records
            .iter()
            .filter(|(key, rec_flags)| {
                type_filter.matches(key.type_nid)
                    && rec_flags.contains(flags)
                    && (want_status || !rec_flags.has(TaxonomyFlag::ConceptStatus))
            })
            .map(|(key, _)| key.stamp)
            .collect()
    }

    pub fn contains_stamp_of_type_with_flags(
        &self,
        type_filter: TypeFilter,
        flags: TaxonomyFlags,
    ) -> bool {
        self.records
            .iter()
            .any(|(key, rec_flags)| type_filter.matches(key.type_nid) && rec_flags.contains(flags))
    }

    /// True if the latest matching relationship version is active under `policy`.
    pub fn is_active_with_flags(
        &self,
        type_filter: TypeFilter,
        flags: TaxonomyFlags,
        policy: &dyn ActivityPolicy,
    ) -> bool {
        let stamps = self.relationship_stamps(type_filter, flags);
        !stamps.is_empty() && policy.is_latest_active(&stamps)
    }

    /// Distinct relationship types whose latest version with `flags` is
    /// active, in ascending order.
    pub fn active_types_with_flags(
        &self,
        flags: TaxonomyFlags,
        policy: &dyn ActivityPolicy,
    ) -> Vec<Nid> {
        let mut types: Vec<Nid> = self
            .records
            .keys()
            .map(|key| key.type_nid)
            .collect();
        types.dedup();
        types
            .into_iter()
            .filter(|t| self.is_active_with_flags(TypeFilter::Is(*t), flags, policy))
            .collect()
    }
}

impl fmt::Display for TypeStampRecords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for record in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{record}")?;
            first = false;
        }
        Ok(())
    }
}
