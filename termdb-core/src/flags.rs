//! Taxonomy flags carried in the high byte of a flag word.
//!
//! Flags qualify each versioned edge (stated vs. inferred, semantic vs.
//! non-defining) and tag the concept-status pseudo-edge. They combine with
//! bitwise OR; `ALL_RELS` (no bits) is the wildcard.
//!
//! ```text
//! bit 30  0x40000000  SEMANTIC
//! bit 29  0x20000000  INFERRED
//! bit 28  0x10000000  STATED
//! bit 27  0x08000000  NON_DL_REL
//! bit 26  0x04000000  CONCEPT_STATUS
//! bit 25  0x02000000  RESERVED_1
//! bit 24  0x01000000  RESERVED_2
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A single taxonomy flag bit.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyFlag {
    Stated,
    Inferred,
    Semantic,
    NonDlRel,
    ConceptStatus,
    Reserved1,
    Reserved2,
}

impl TaxonomyFlag {
    /// All flags in ascending bit order.
    pub const ALL: [TaxonomyFlag; 7] = [
        TaxonomyFlag::Reserved2,
        TaxonomyFlag::Reserved1,
        TaxonomyFlag::ConceptStatus,
        TaxonomyFlag::NonDlRel,
        TaxonomyFlag::Stated,
        TaxonomyFlag::Inferred,
        TaxonomyFlag::Semantic,
    ];

    /// Bit value of this flag within the flag word.
    #[inline]
    pub const fn bits(self) -> i32 {
        match self {
            TaxonomyFlag::Stated => 0x1000_0000,
            TaxonomyFlag::Inferred => 0x2000_0000,
            TaxonomyFlag::Semantic => 0x4000_0000,
            TaxonomyFlag::NonDlRel => 0x0800_0000,
            TaxonomyFlag::ConceptStatus => 0x0400_0000,
            TaxonomyFlag::Reserved1 => 0x0200_0000,
            TaxonomyFlag::Reserved2 => 0x0100_0000,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            TaxonomyFlag::Stated => "STATED",
            TaxonomyFlag::Inferred => "INFERRED",
            TaxonomyFlag::Semantic => "SEMANTIC",
            TaxonomyFlag::NonDlRel => "NON_DL_REL",
            TaxonomyFlag::ConceptStatus => "CONCEPT_STATUS",
            TaxonomyFlag::Reserved1 => "RESERVED_1",
            TaxonomyFlag::Reserved2 => "RESERVED_2",
        }
    }
}

impl fmt::Display for TaxonomyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mask of every bit a known flag occupies.
const FLAG_MASK: i32 = 0x7F00_0000;

/// A set of [`TaxonomyFlag`]s, stored as the flag word itself.
///
/// The raw word is kept as-is so that packed records re-encode byte for byte;
/// bits outside the flag byte are ignored when the set is inspected.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
#[repr(transparent)]
pub struct TaxonomyFlags(i32);

/// Wildcard flag set: matches every edge.
pub const ALL_RELS: TaxonomyFlags = TaxonomyFlags::EMPTY;

impl TaxonomyFlags {
    pub const EMPTY: Self = Self(0);
    pub const STATED: Self = Self(TaxonomyFlag::Stated.bits());
    pub const INFERRED: Self = Self(TaxonomyFlag::Inferred.bits());
    pub const SEMANTIC: Self = Self(TaxonomyFlag::Semantic.bits());
    pub const NON_DL_REL: Self = Self(TaxonomyFlag::NonDlRel.bits());
    pub const CONCEPT_STATUS: Self = Self(TaxonomyFlag::ConceptStatus.bits());

    /// Wrap a flag word.
    #[inline]
    pub const fn from_word(word: i32) -> Self {
        Self(word)
    }

    /// The same set with every unknown bit cleared.
    #[inline]
    pub const fn known(self) -> Self {
        Self(self.0 & FLAG_MASK)
    }

    /// The encoded flag word.
    #[inline]
    pub const fn word(self) -> i32 {
        self.0
    }

    /// Encode a collection of flags into one set.
    pub fn from_flags<I: IntoIterator<Item = TaxonomyFlag>>(flags: I) -> Self {
        flags
            .into_iter()
            .fold(Self::EMPTY, |acc, flag| Self(acc.0 | flag.bits()))
    }

    /// True if no known flag is set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 & FLAG_MASK == 0
    }

    /// True if every bit of `other` is present in `self`.
    ///
    /// The empty set is contained in everything, which is what makes
    /// [`ALL_RELS`] a wildcard.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn has(self, flag: TaxonomyFlag) -> bool {
        self.0 & flag.bits() != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn with(self, flag: TaxonomyFlag) -> Self {
        Self(self.0 | flag.bits())
    }

    #[inline]
    pub const fn without(self, flag: TaxonomyFlag) -> Self {
        Self(self.0 & !flag.bits())
    }

    /// Iterate the flags present, in ascending bit order.
    pub fn iter(self) -> impl Iterator<Item = TaxonomyFlag> {
        TaxonomyFlag::ALL
            .into_iter()
            .filter(move |flag| self.has(*flag))
    }
}

impl From<TaxonomyFlag> for TaxonomyFlags {
    fn from(flag: TaxonomyFlag) -> Self {
        Self(flag.bits())
    }
}

impl BitOr for TaxonomyFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOr<TaxonomyFlag> for TaxonomyFlags {
    type Output = Self;
    fn bitor(self, rhs: TaxonomyFlag) -> Self {
        self.with(rhs)
    }
}

impl BitOrAssign for TaxonomyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<TaxonomyFlag> for TaxonomyFlags {
    fn from_iter<I: IntoIterator<Item = TaxonomyFlag>>(iter: I) -> Self {
        Self::from_flags(iter)
    }
}

impl fmt::Display for TaxonomyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("ALL_RELS");
        }
        let mut first = true;
        for flag in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(flag.name())?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for TaxonomyFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaxonomyFlags({:#010x}: {})", self.0, self)
    }
}

// ---------------------------------------------------------------------------
// PremiseType
// ---------------------------------------------------------------------------

/// Selects whether traversal follows stated or inferred relationships.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PremiseType {
    Stated,
    #[default]
    Inferred,
}

impl PremiseType {
    /// The single flag bit selecting this premise.
    pub const fn flag(self) -> TaxonomyFlag {
        match self {
            PremiseType::Stated => TaxonomyFlag::Stated,
            PremiseType::Inferred => TaxonomyFlag::Inferred,
        }
    }

    pub const fn flags(self) -> TaxonomyFlags {
        TaxonomyFlags(self.flag().bits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits_are_distinct_high_byte() {
        let mut seen = 0i32;
        for flag in TaxonomyFlag::ALL {
            let bits = flag.bits();
            assert_eq!(bits.count_ones(), 1, "{flag} must be a single bit");
            assert_eq!(bits & !0x7F00_0000, 0, "{flag} must sit in the high byte");
            assert_eq!(seen & bits, 0, "{flag} overlaps another flag");
            seen |= bits;
        }
    }

    #[test]
    fn test_decode_ignores_unknown_bits() {
        let word = TaxonomyFlag::Stated.bits() | 0x0000_00FF;
        let flags = TaxonomyFlags::from_word(word);
        assert_eq!(flags.word(), word);
        assert_eq!(flags.known(), TaxonomyFlags::STATED);
        assert_eq!(flags.iter().collect::<Vec<_>>(), vec![TaxonomyFlag::Stated]);
        assert_eq!(flags.to_string(), "STATED");
    }

    #[test]
    fn test_encode_decode_set() {
        let flags: TaxonomyFlags = [TaxonomyFlag::Inferred, TaxonomyFlag::Semantic]
            .into_iter()
            .collect();
        assert_eq!(flags.word(), 0x6000_0000);
        assert!(flags.has(TaxonomyFlag::Inferred));
        assert!(!flags.has(TaxonomyFlag::Stated));
        assert_eq!(TaxonomyFlags::from_word(flags.word()), flags);
        assert_eq!(flags.to_string(), "INFERRED|SEMANTIC");
    }

    #[test]
    fn test_contains_semantics() {
        let record = TaxonomyFlags::STATED | TaxonomyFlags::SEMANTIC;
        assert!(record.contains(TaxonomyFlags::STATED));
        assert!(record.contains(ALL_RELS));
        assert!(!record.contains(TaxonomyFlags::STATED | TaxonomyFlags::INFERRED));
        assert_eq!(ALL_RELS.to_string(), "ALL_RELS");
    }

    #[test]
    fn test_premise_flag_mapping() {
        assert_eq!(PremiseType::Stated.flag(), TaxonomyFlag::Stated);
        assert_eq!(PremiseType::Inferred.flags(), TaxonomyFlags::INFERRED);
        assert_eq!(PremiseType::default(), PremiseType::Inferred);
    }

    #[test]
    fn test_with_without() {
        let flags = TaxonomyFlags::EMPTY
            .with(TaxonomyFlag::ConceptStatus)
            .with(TaxonomyFlag::Stated);
        assert!(flags.has(TaxonomyFlag::ConceptStatus));
        assert_eq!(flags.without(TaxonomyFlag::ConceptStatus), TaxonomyFlags::STATED);
    }
}
