//! Side-effect-free structural check of a packed taxonomy array.

use crate::layout::scan_checked;
use termdb_core::Result;

/// Check every sub-record of `array`.
///
/// - the other-concept nid is negative
/// - the length word is at least 4, frames whole triples and fits the array
/// - every type word is negative
/// - every stamp word is at least [`FIRST_STAMP_SEQUENCE`](termdb_core::FIRST_STAMP_SEQUENCE)
///
/// Ordering is not checked; unsorted arrays are legal input to
/// [`TaxonomyRecord::from_packed`](crate::TaxonomyRecord::from_packed).
pub fn validate(array: &[i32]) -> Result<()> {
    scan_checked(array).map(|_| ())
}
