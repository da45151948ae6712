//! Array-level merge of two packed taxonomy records.
//!
//! Combines two snapshots of the same concept without building the
//! nid -> edge-set map. Three nested sort-merges:
//!
//! 1. index each array's sub-records as (nid, start, len);
//! 2. merge-join the two indexes by nid, copying unmatched sub-records
//!    verbatim and copying identical matched sub-records once;
//! 3. for matched sub-records that differ, merge-join their triples by
//!    (type, stamp), OR-ing the flags of equal keys, then back-patch the
//!    sub-record's length word.
//!
//! The join requires canonical inputs. An input that is not canonical is
//! first rewritten through [`TaxonomyRecord`], so the output always equals
//! unpack -> merge -> pack.

use crate::layout::{is_canonical, scan_checked, scan_sub_records, SubRecordPos, TRIPLE_WORDS};
use crate::record::TaxonomyRecord;
use std::borrow::Cow;
use std::cmp::Ordering;
use termdb_core::{Error, Result};

/// Merge two packed records into one canonical packed record.
pub fn merge_arrays(a: &[i32], b: &[i32]) -> Result<Vec<i32>> {
    let (a, a_index) = canonical_with_index(a)?;
    let (b, b_index) = canonical_with_index(b)?;
    if a_index.is_empty() {
        return Ok(b.into_owned());
    }
    if b_index.is_empty() {
        return Ok(a.into_owned());
    }

    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0usize, 0usize);
    while i < a_index.len() && j < b_index.len() {
        let (pa, pb) = (&a_index[i], &b_index[j]);
        match pa.nid.cmp(&pb.nid) {
            Ordering::Less => {
                out.extend_from_slice(pa.words(&a));
                i += 1;
            }
            Ordering::Greater => {
                out.extend_from_slice(pb.words(&b));
                j += 1;
            }
            Ordering::Equal => {
                let (wa, wb) = (pa.words(&a), pb.words(&b));
                if wa == wb {
                    out.extend_from_slice(wa);
                } else {
                    merge_sub_records(pa.nid, pa.triples(&a), pb.triples(&b), &mut out)?;
                }
                i += 1;
                j += 1;
            }
        }
    }
    for pos in &a_index[i..] {
        out.extend_from_slice(pos.words(&a));
    }
    for pos in &b_index[j..] {
        out.extend_from_slice(pos.words(&b));
    }
    Ok(out)
}

/// Borrow `array` when already canonical, otherwise repack it.
///
/// Both paths reject every array [`validate`](crate::validate()) rejects.
fn canonical_with_index(array: &[i32]) -> Result<(Cow<'_, [i32]>, Vec<SubRecordPos>)> {
    let index = scan_checked(array)?;
    if is_canonical(array, &index) {
        return Ok((Cow::Borrowed(array), index));
    }
    tracing::debug!(
        words = array.len(),
        sub_records = index.len(),
        "canonicalizing unsorted taxonomy array before merge"
    );
    let packed = TaxonomyRecord::from_packed(array)?.pack()?;
    let index = scan_sub_records(&packed)?;
    Ok((Cow::Owned(packed), index))
}

/// Merge two sorted triple runs for `nid` and append the resulting sub-record.
fn merge_sub_records(nid: i32, a: &[i32], b: &[i32], out: &mut Vec<i32>) -> Result<()> {
    out.push(nid);
    let len_at = out.len();
    out.push(0);

    let mut ta = a.chunks_exact(TRIPLE_WORDS).peekable();
    let mut tb = b.chunks_exact(TRIPLE_WORDS).peekable();
    loop {
        match (ta.peek().copied(), tb.peek().copied()) {
            (Some(x), Some(y)) => match (x[0], x[1]).cmp(&(y[0], y[1])) {
                Ordering::Less => {
                    out.extend_from_slice(x);
                    ta.next();
                }
                Ordering::Greater => {
                    out.extend_from_slice(y);
                    tb.next();
                }
                Ordering::Equal => {
                    out.extend_from_slice(&[x[0], x[1], x[2] | y[2]]);
                    ta.next();
                    tb.next();
                }
            },
            (Some(x), None) => {
                out.extend_from_slice(x);
                ta.next();
            }
            (None, Some(y)) => {
                out.extend_from_slice(y);
                tb.next();
            }
            (None, None) => break,
        }
    }

    let len = out.len() - len_at;
    out[len_at] = i32::try_from(len).map_err(|_| {
        Error::invalid_record(len_at, "merged sub-record length exceeds the i32 range")
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATED: i32 = 0x1000_0000;
    const INFERRED: i32 = 0x2000_0000;

    #[test]
    fn test_merge_distinct_stamps() {
        let a = [-200, 4, -50, 1001, STATED];
        let b = [-200, 4, -50, 1002, INFERRED];
        assert_eq!(
            merge_arrays(&a, &b).unwrap(),
            vec![-200, 7, -50, 1001, STATED, -50, 1002, INFERRED]
        );
    }

    #[test]
    fn test_merge_same_key_ors_flags() {
        let a = [-200, 4, -50, 1001, STATED];
        let b = [-200, 4, -50, 1001, INFERRED];
        assert_eq!(
            merge_arrays(&a, &b).unwrap(),
            vec![-200, 4, -50, 1001, STATED | INFERRED]
        );
    }

    #[test]
    fn test_merge_disjoint_destinations_interleave() {
        let a = [-400, 4, -50, 1, STATED, -200, 4, -50, 1, STATED];
        let b = [-300, 4, -50, 2, STATED, -100, 4, -50, 2, STATED];
        assert_eq!(
            merge_arrays(&a, &b).unwrap(),
            [
                [-400, 4, -50, 1, STATED],
                [-300, 4, -50, 2, STATED],
                [-200, 4, -50, 1, STATED],
                [-100, 4, -50, 2, STATED],
            ]
            .concat()
        );
    }

    #[test]
    fn test_merge_with_empty() {
        let a = [-200, 4, -50, 1001, STATED];
        assert_eq!(merge_arrays(&a, &[]).unwrap(), a.to_vec());
        assert_eq!(merge_arrays(&[], &a).unwrap(), a.to_vec());
        assert!(merge_arrays(&[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_merge_identical_is_idempotent() {
        let a = [-300, 7, -60, 1, STATED, -50, 9, INFERRED, -200, 4, -50, 1001, STATED];
        assert_eq!(merge_arrays(&a, &a).unwrap(), a.to_vec());
    }

    #[test]
    fn test_merge_tail_triples_after_exhaustion() {
        let a = [-200, 4, -50, 5, STATED];
        let b = [-200, 10, -50, 1, STATED, -50, 7, STATED, -40, 2, INFERRED];
        assert_eq!(
            merge_arrays(&a, &b).unwrap(),
            vec![-200, 13, -50, 1, STATED, -50, 5, STATED, -50, 7, STATED, -40, 2, INFERRED]
        );
    }

    #[test]
    fn test_merge_canonicalizes_unsorted_input() {
        let unsorted = [-200, 4, -50, 1, STATED, -300, 7, -50, 9, STATED, -50, 2, STATED];
        let b = [-300, 4, -50, 2, INFERRED];
        assert_eq!(
            merge_arrays(&unsorted, &b).unwrap(),
            [
                vec![-300, 7, -50, 2, STATED | INFERRED, -50, 9, STATED],
                vec![-200, 4, -50, 1, STATED],
            ]
            .concat()
        );
    }

    #[test]
    fn test_merge_rejects_malformed_input() {
        let bad = [-200, 2, -50];
        let err = merge_arrays(&bad, &[-200, 4, -50, 1, STATED]).unwrap_err();
        assert!(err.is_invalid_record(), "{err}");
    }

    #[test]
    fn test_merge_rejects_invalid_payload_in_sorted_input() {
        let good = [-200, 4, -50, 1, 0];
        let cases: [(&[i32], usize); 3] = [
            (&[-300, 4, 50, 1, 0], 2),
            (&[-300, 4, -50, 0, STATED], 3),
            (&[5, 4, -50, 1, STATED], 0),
        ];
        for (bad, offset) in cases {
            for err in [
                merge_arrays(bad, &good).unwrap_err(),
                merge_arrays(&good, bad).unwrap_err(),
                merge_arrays(bad, &[]).unwrap_err(),
            ] {
                match err {
                    Error::InvalidRecord { offset: at, .. } => assert_eq!(at, offset),
                    other => panic!("expected InvalidRecord, got {other}"),
                }
            }
        }
    }

    #[test]
    fn test_merge_matches_unpacked_merge() {
        let a = [-300, 4, -60, 3, STATED, -200, 7, -50, 1, STATED, -50, 4, INFERRED];
        let b = [-250, 4, -50, 8, STATED, -200, 7, -50, 1, INFERRED, -50, 2, STATED];
        let merged = merge_arrays(&a, &b).unwrap();

        let mut expected = TaxonomyRecord::from_packed(&a).unwrap();
        expected.merge(&TaxonomyRecord::from_packed(&b).unwrap()).unwrap();
        assert_eq!(merged, expected.pack().unwrap());
    }
}
