//! Typed ID newtypes for taxonomy words.
//!
//! Each type is `#[repr(transparent)]` + `Copy`, so wrapping a raw `i32` word
//! from a packed taxonomy array costs nothing at runtime.
//!
//! Concept and relationship-type identifiers (nids) are always negative.
//! Non-negative words belong to a different identifier space, which the packed
//! format relies on to tell header words from payload words.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest stamp sequence a valid version stamp may carry.
pub const FIRST_STAMP_SEQUENCE: i32 = 1;

/// Raw type word that matches any relationship type.
pub const ANY_TYPE: i32 = i32::MAX;

// ---------------------------------------------------------------------------
// Nid
// ---------------------------------------------------------------------------

/// Concept or relationship-type identifier. Valid nids are negative.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Nid(pub i32);

impl Nid {
    /// Placeholder used by configuration defaults before a real is-a nid is set.
    /// Not a valid nid.
    pub const UNSPECIFIED: Self = Self(0);

    #[inline]
    pub fn as_i32(self) -> i32 {
        self.0
    }
    #[inline]
    pub fn from_i32(v: i32) -> Self {
        Self(v)
    }
    /// Returns `true` if this identifier lies in the nid space (negative).
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 < 0
    }
}

impl From<i32> for Nid {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl fmt::Display for Nid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nid({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// Opaque version stamp. Resolved into (status, time, author, module, path)
/// by a STAMP service; only compared and range-checked here.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct Stamp(pub i32);

impl Stamp {
    #[inline]
    pub fn as_i32(self) -> i32 {
        self.0
    }
    #[inline]
    pub fn from_i32(v: i32) -> Self {
        Self(v)
    }
    /// Returns `true` if the stamp is at or above [`FIRST_STAMP_SEQUENCE`].
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= FIRST_STAMP_SEQUENCE
    }
}

impl From<i32> for Stamp {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stamp({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// TypeFilter
// ---------------------------------------------------------------------------

/// Relationship-type selector for record queries.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeFilter {
    /// Any relationship type. Used for the concept-status pseudo-edge, whose
    /// type word carries no meaning.
    Any,
    /// Exactly this relationship type.
    Is(Nid),
}

impl TypeFilter {
    /// Decode a raw type word, treating [`ANY_TYPE`] as the wildcard.
    pub fn from_word(word: i32) -> Self {
        if word == ANY_TYPE {
            TypeFilter::Any
        } else {
            TypeFilter::Is(Nid(word))
        }
    }

    /// Raw type word for this filter.
    pub fn word(self) -> i32 {
        match self {
            TypeFilter::Any => ANY_TYPE,
            TypeFilter::Is(nid) => nid.0,
        }
    }

    #[inline]
    pub fn matches(self, type_nid: Nid) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Is(wanted) => wanted == type_nid,
        }
    }
}

impl From<Nid> for TypeFilter {
    fn from(nid: Nid) -> Self {
        TypeFilter::Is(nid)
    }
}
