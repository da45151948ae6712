//! Version stamps and an in-memory STAMP catalog.
//!
//! A stamp resolves to (status, time, author, module, path). The catalog here
//! only stores and resolves stamps supplied by the caller; allocating new
//! stamps is the versioning subsystem's job.

use crate::error::{Error, Result};
use crate::ids::{Nid, Stamp, FIRST_STAMP_SEQUENCE};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Activation status recorded on a stamp.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Bootstrap content that predates any real commit.
    Primordial,
    Active,
    Inactive,
    /// Withdrawn uncommitted change; never visible as a state.
    Cancelled,
}

impl Status {
    /// Primordial content counts as active.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Status::Active | Status::Primordial)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Primordial => "primordial",
            Status::Active => "active",
            Status::Inactive => "inactive",
            Status::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The resolved content of one stamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StampRecord {
    pub status: Status,
    /// Commit time, epoch milliseconds.
    pub time: i64,
    pub author: Nid,
    pub module: Nid,
    pub path: Nid,
}

impl StampRecord {
    pub fn new(status: Status, time: i64, author: Nid, module: Nid, path: Nid) -> Self {
        Self {
            status,
            time,
            author,
            module,
            path,
        }
    }
}

/// Thread-safe stamp lookup table.
///
/// Reads take a shared lock and may run from any rayon worker.
#[derive(Debug, Default)]
pub struct StampCatalog {
    stamps: RwLock<FxHashMap<Stamp, StampRecord>>,
}

impl StampCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stamp. Stamps below [`FIRST_STAMP_SEQUENCE`] are rejected.
    ///
    /// Re-registering a stamp replaces its record.
    pub fn insert(&self, stamp: Stamp, record: StampRecord) -> Result<()> {
        if !stamp.is_valid() {
            return Err(Error::invalid_edge(format!(
                "stamp {} is below the first stamp sequence {}",
                stamp.0, FIRST_STAMP_SEQUENCE
            )));
        }
        self.stamps.write().insert(stamp, record);
        Ok(())
    }

    pub fn get(&self, stamp: Stamp) -> Option<StampRecord> {
        self.stamps.read().get(&stamp).copied()
    }

    pub fn status(&self, stamp: Stamp) -> Option<Status> {
        self.get(stamp).map(|r| r.status)
    }

    pub fn len(&self) -> usize {
        self.stamps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.read().is_empty()
    }
}
