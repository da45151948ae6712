//! Packed taxonomy array layout.
//!
//! A packed record is a flat `i32` sequence of sub-records, one per other
//! concept, in ascending nid order when canonical:
//!
//! ```text
//! [other_nid, len, (type, stamp, flags) * n] [other_nid, len, ...] ...
//!             ^^^ len = 1 + 3n, counts itself and the triples
//! ```
//!
//! The sub-record occupies `len + 1` words. `len` must be at least 4 (one
//! triple) and the sub-record must end inside the array.

use termdb_core::{Error, Result, Stamp, FIRST_STAMP_SEQUENCE};

/// Words per (type, stamp, flags) triple.
pub const TRIPLE_WORDS: usize = 3;

/// Smallest legal length word: the length word plus one triple.
pub const MIN_SUB_RECORD_LEN: usize = 1 + TRIPLE_WORDS;

/// Location of one sub-record inside a packed array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SubRecordPos {
    /// Other-concept nid (first word of the sub-record).
    pub nid: i32,
    /// Offset of the nid word.
    pub start: usize,
    /// Value of the length word.
    pub len: usize,
}

impl SubRecordPos {
    /// One past the last word of this sub-record.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + 1 + self.len
    }

    /// The whole sub-record, nid word included.
    #[inline]
    pub fn words<'a>(&self, array: &'a [i32]) -> &'a [i32] {
        &array[self.start..self.end()]
    }

    /// The triple words following the length word.
    #[inline]
    pub fn triples<'a>(&self, array: &'a [i32]) -> &'a [i32] {
        &array[self.start + 2..self.end()]
    }

    /// Offset of the first triple word.
    #[inline]
    pub fn triples_offset(&self) -> usize {
        self.start + 2
    }
}

/// Walk the sub-record headers of `array`, checking only the framing
/// (length words and bounds). Payload words are not inspected.
pub(crate) fn scan_sub_records(array: &[i32]) -> Result<Vec<SubRecordPos>> {
    let mut positions = Vec::new();
    let mut cursor = 0usize;
    while cursor < array.len() {
        let len_offset = cursor + 1;
        if len_offset >= array.len() {
            return Err(Error::invalid_record(
                cursor,
                "sub-record header truncated: missing length word",
            ));
        }
        let raw_len = array[len_offset];
        let len = usize::try_from(raw_len).map_err(|_| {
            Error::invalid_record(len_offset, format!("negative sub-record length {raw_len}"))
        })?;
        if len < MIN_SUB_RECORD_LEN {
            return Err(Error::invalid_record(
                len_offset,
                format!("sub-record length {len} is below the minimum {MIN_SUB_RECORD_LEN}"),
            ));
        }
        if (len - 1) % TRIPLE_WORDS != 0 {
            return Err(Error::invalid_record(
                len_offset,
                format!("sub-record length {len} does not frame whole triples"),
            ));
        }
        let end = cursor
            .checked_add(1)
            .and_then(|c| c.checked_add(len))
            .ok_or_else(|| Error::invalid_record(len_offset, "sub-record length overflows"))?;
        if end > array.len() {
            return Err(Error::invalid_record(
                len_offset,
                format!(
                    "sub-record of length {len} runs past the array end ({} words)",
                    array.len()
                ),
            ));
        }
        positions.push(SubRecordPos {
            nid: array[cursor],
            start: cursor,
            len,
        });
        cursor = end;
    }
    Ok(positions)
}

/// Check the payload of one framed sub-record: the other-concept word and
/// every type word must be nids, and every stamp at least
/// [`FIRST_STAMP_SEQUENCE`].
pub(crate) fn check_payload(array: &[i32], pos: &SubRecordPos) -> Result<()> {
    if pos.nid >= 0 {
        return Err(Error::invalid_record(
            pos.start,
            format!("other-concept word {} is not a nid", pos.nid),
        ));
    }
    let base = pos.triples_offset();
    for (i, triple) in pos.triples(array).chunks_exact(TRIPLE_WORDS).enumerate() {
        let offset = base + i * TRIPLE_WORDS;
        if triple[0] >= 0 {
            return Err(Error::invalid_record(
                offset,
                format!("type word {} is not a nid", triple[0]),
            ));
        }
        if !Stamp(triple[1]).is_valid() {
            return Err(Error::invalid_record(
                offset + 1,
                format!(
                    "stamp {} is below the first stamp sequence {FIRST_STAMP_SEQUENCE}",
                    triple[1]
                ),
            ));
        }
    }
    Ok(())
}

/// Framing plus payload check of every sub-record.
pub(crate) fn scan_checked(array: &[i32]) -> Result<Vec<SubRecordPos>> {
    let positions = scan_sub_records(array)?;
    for pos in &positions {
        check_payload(array, pos)?;
    }
    Ok(positions)
}

/// True if the sub-records are in strictly ascending nid order and each one's
/// triples are in strictly ascending (type, stamp) order.
pub(crate) fn is_canonical(array: &[i32], positions: &[SubRecordPos]) -> bool {
    let nids_sorted = positions.windows(2).all(|w| w[0].nid < w[1].nid);
    nids_sorted
        && positions.iter().all(|pos| {
            let mut prev: Option<(i32, i32)> = None;
            pos.triples(array)
                .chunks_exact(TRIPLE_WORDS)
                .all(|t| {
                    let key = (t[0], t[1]);
                    let ascending = prev.map_or(true, |p| p < key);
                    prev = Some(key);
                    ascending
                })
        })
}
