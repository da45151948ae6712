//! Injected query behavior: edge/vertex activity and destination ordering.
//!
//! Record queries never resolve stamps themselves. An [`ActivityPolicy`]
//! answers "given these candidate stamps, what is active at this coordinate";
//! a [`VertexActivity`] answers whether a destination concept is itself
//! active; a [`VertexSort`] orders the final destination list. Edge and vertex
//! activity are configured separately, so an edge can be historically active
//! while its target concept is currently retired.

use rustc_hash::FxHashSet;
use std::sync::Arc;
use termdb_core::{Nid, Stamp, StampCatalog, Status, TaxonomyFlags};

/// Resolves candidate stamps against a position (time, path, modules).
pub trait ActivityPolicy: Send + Sync {
    /// True if the latest of `stamps`, by this policy's precedence, is active.
    /// An empty slice is never active.
    fn is_latest_active(&self, stamps: &[Stamp]) -> bool;

    /// The subset of `stamps` considered latest. More than one stamp may be
    /// returned when versions on different paths tie.
    fn latest_stamps(&self, stamps: &[Stamp]) -> Vec<Stamp>;

    /// True if `stamp` lies on the route to this policy's position.
    fn on_route(&self, stamp: Stamp) -> bool;

    /// Status carried by `stamp`, if the stamp is known.
    fn status(&self, stamp: Stamp) -> Option<Status>;
}

impl<P: ActivityPolicy + ?Sized> ActivityPolicy for Arc<P> {
    fn is_latest_active(&self, stamps: &[Stamp]) -> bool {
        (**self).is_latest_active(stamps)
    }
    fn latest_stamps(&self, stamps: &[Stamp]) -> Vec<Stamp> {
        (**self).latest_stamps(stamps)
    }
    fn on_route(&self, stamp: Stamp) -> bool {
        (**self).on_route(stamp)
    }
    fn status(&self, stamp: Stamp) -> Option<Status> {
        (**self).status(stamp)
    }
}

/// Decides whether a destination concept is active in its own right.
pub trait VertexActivity: Send + Sync {
    fn is_vertex_active(&self, nid: Nid) -> bool;
}

impl<F> VertexActivity for F
where
    F: Fn(Nid) -> bool + Send + Sync,
{
    fn is_vertex_active(&self, nid: Nid) -> bool {
        self(nid)
    }
}

/// Treats every destination concept as active.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllVerticesActive;

impl VertexActivity for AllVerticesActive {
    fn is_vertex_active(&self, _nid: Nid) -> bool {
        true
    }
}

/// Puts destination nids into a defined total order.
pub trait VertexSort: Send + Sync {
    fn sort(&self, nids: &mut [Nid]);
}

impl<F> VertexSort for F
where
    F: Fn(&mut [Nid]) + Send + Sync,
{
    fn sort(&self, nids: &mut [Nid]) {
        self(nids)
    }
}

/// Ascending nid order.
#[derive(Clone, Copy, Debug, Default)]
pub struct NidOrder;

impl VertexSort for NidOrder {
    fn sort(&self, nids: &mut [Nid]) {
        nids.sort_unstable();
    }
}

/// Everything a destination query needs besides the record itself.
#[derive(Clone, Copy)]
pub struct TaxonomyQuery<'a> {
    /// Flags every matching edge version must carry (e.g. the premise flag).
    pub flags: TaxonomyFlags,
    pub edges: &'a dyn ActivityPolicy,
    pub vertices: &'a dyn VertexActivity,
    pub sort: &'a dyn VertexSort,
}

impl<'a> TaxonomyQuery<'a> {
    pub fn new(
        flags: TaxonomyFlags,
        edges: &'a dyn ActivityPolicy,
        vertices: &'a dyn VertexActivity,
        sort: &'a dyn VertexSort,
    ) -> Self {
        Self {
            flags,
            edges,
            vertices,
            sort,
        }
    }
}

impl std::fmt::Debug for TaxonomyQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaxonomyQuery")
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// AsOfPolicy
// ---------------------------------------------------------------------------

/// Time-based activity policy over a [`StampCatalog`].
///
/// A stamp is on route when it is known, not cancelled, committed at or before
/// `as_of`, and (when restricted) on the allowed path and modules. The latest
/// stamps are the on-route stamps sharing the greatest time. The latest
/// version is active when any latest stamp carries an active status.
#[derive(Clone, Debug)]
pub struct AsOfPolicy {
    catalog: Arc<StampCatalog>,
    as_of: i64,
    path: Option<Nid>,
    modules: Option<FxHashSet<Nid>>,
}

impl AsOfPolicy {
    /// Policy at `as_of` on every path and module.
    pub fn new(catalog: Arc<StampCatalog>, as_of: i64) -> Self {
        Self {
            catalog,
            as_of,
            path: None,
            modules: None,
        }
    }

    /// Policy at the latest possible time.
    pub fn latest(catalog: Arc<StampCatalog>) -> Self {
        Self::new(catalog, i64::MAX)
    }

    pub fn with_path(mut self, path: Nid) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_modules<I: IntoIterator<Item = Nid>>(mut self, modules: I) -> Self {
        self.modules = Some(modules.into_iter().collect());
        self
    }

    pub fn as_of(&self) -> i64 {
        self.as_of
    }
}

impl ActivityPolicy for AsOfPolicy {
    fn is_latest_active(&self, stamps: &[Stamp]) -> bool {
        self.latest_stamps(stamps)
            .into_iter()
            .any(|s| self.status(s).is_some_and(Status::is_active))
    }

    fn latest_stamps(&self, stamps: &[Stamp]) -> Vec<Stamp> {
        let mut best_time = i64::MIN;
        let mut latest: Vec<Stamp> = Vec::new();
        for &stamp in stamps {
            if !self.on_route(stamp) {
                continue;
            }
            let Some(record) = self.catalog.get(stamp) else {
                continue;
            };
            if record.time > best_time {
                best_time = record.time;
                latest.clear();
                latest.push(stamp);
            } else if record.time == best_time {
                latest.push(stamp);
            }
        }
        latest.sort_unstable();
        latest.dedup();
        latest
    }

    fn on_route(&self, stamp: Stamp) -> bool {
        let Some(record) = self.catalog.get(stamp) else {
            return false;
        };
        record.status != Status::Cancelled
            && record.time <= self.as_of
            && self.path.map_or(true, |p| p == record.path)
            && self
                .modules
                .as_ref()
                .map_or(true, |m| m.contains(&record.module))
    }

    fn status(&self, stamp: Stamp) -> Option<Status> {
        self.catalog.status(stamp)
    }
}
