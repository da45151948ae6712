//! Shared test harness for termdb-graph integration tests.

// Not every test crate uses every helper.
#![allow(dead_code)]

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use termdb_core::{Nid, Stamp, StampCatalog, StampRecord, Status, TaxonomyFlags};
use termdb_graph::MemoryTaxonomyStore;
use termdb_taxonomy::TaxonomyRecord;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

pub const IS_A: Nid = Nid(-1_000);
pub const PATH: Nid = Nid(-2_000);
pub const MODULE: Nid = Nid(-2_001);
pub const AUTHOR: Nid = Nid(-2_002);

/// Install a global fmt subscriber once, filtered by `RUST_LOG`.
pub fn init_tracing() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

// =============================================================================
// Span capture
// =============================================================================

/// A captured span with its fields.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub name: &'static str,
    pub level: tracing::Level,
    pub fields: HashMap<String, String>,
}

/// Thread-safe store of captured spans.
#[derive(Debug, Clone, Default)]
pub struct SpanStore(Arc<Mutex<Vec<CapturedSpan>>>);

impl SpanStore {
    pub fn find_span(&self, name: &str) -> Option<CapturedSpan> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|s| s.name == name).count()
    }
}

struct SpanCaptureLayer {
    store: SpanStore,
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: Context<'_, S>,
    ) {
        let mut fields = FieldVisitor(HashMap::new());
        attrs.record(&mut fields);
        let meta = attrs.metadata();
        self.store.0.lock().unwrap().push(CapturedSpan {
            name: meta.name(),
            level: *meta.level(),
            fields: fields.0,
        });
    }
}

struct FieldVisitor(HashMap<String, String>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }
}

/// Capture spans created on this thread until the guard drops.
pub fn capture_spans() -> (SpanStore, tracing::subscriber::DefaultGuard) {
    let store = SpanStore::default();
    let layer = SpanCaptureLayer {
        store: store.clone(),
    };
    let subscriber = tracing_subscriber::registry::Registry::default().with(layer);
    let guard = tracing::subscriber::set_default(subscriber);
    (store, guard)
}

// =============================================================================
// Random terminologies
// =============================================================================

/// Stamp catalog: odd stamps active, even stamps inactive, later stamps newer.
pub fn catalog(stamps: i32) -> Arc<StampCatalog> {
    let catalog = StampCatalog::new();
    for s in 1..=stamps {
        let status = if s % 2 == 1 { Status::Active } else { Status::Inactive };
        catalog
            .insert(
                Stamp(s),
                StampRecord::new(status, i64::from(s) * 10, AUTHOR, MODULE, PATH),
            )
            .unwrap();
    }
    Arc::new(catalog)
}

/// A random is-a DAG over `concepts` concepts (nids -1 ..= -concepts).
///
/// Every concept gets an active status, up to three candidate parents among
/// lower-numbered concepts with random stamps and premise flags, and is left
/// out of the store with probability `missing`.
pub fn random_store(
    seed: u64,
    concepts: i32,
    stamps: i32,
    missing: f64,
) -> (MemoryTaxonomyStore, Vec<Nid>) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let store = MemoryTaxonomyStore::new();
    let mut all = Vec::with_capacity(concepts as usize);

    for i in 1..=concepts {
        let origin = Nid(-i);
        all.push(origin);
        if rng.gen_bool(missing) {
            continue;
        }
        let mut record = TaxonomyRecord::new();
        record.add_concept_status(origin, Stamp(1)).unwrap();
        if i > 1 {
            for _ in 0..rng.gen_range(0..=3) {
                let parent = Nid(-rng.gen_range(1..i));
                let stamp = Stamp(rng.gen_range(1..=stamps));
                let flags = if rng.gen_bool(0.5) {
                    TaxonomyFlags::STATED
                } else {
                    TaxonomyFlags::INFERRED
                };
                record.add_stamp_record(parent, IS_A, stamp, flags).unwrap();
            }
        }
        store.insert_record(origin, &record).unwrap();
    }
    (store, all)
}
