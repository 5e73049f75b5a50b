use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::session::{ProbeOutcome, ProbeTally, SessionState, TrackingRecord};

/// Leading characters of an identifier that may appear in diagnostics.
const MASK_PREFIX: usize = 8;

/// Probe indices `0..PROBE_WIDTH` are tallied; anything else is served but not kept.
pub const PROBE_WIDTH: u32 = 32;

/// Process-wide map of issued identifiers and observed probe results.
///
/// Each create-or-update runs under the lock, so concurrent requests for the
/// same identifier never lose a sighting. Nothing is persisted; a new process
/// starts empty.
pub struct TrackingRegistry {
    records: Mutex<HashMap<String, TrackingRecord>>,
    probes: Mutex<BTreeMap<u32, ProbeTally>>,
}

impl TrackingRegistry {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            probes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registers a `set` request for `identifier` and returns the updated record.
    ///
    /// `token_matched` is whether the client presented the identifier's ETag.
    pub fn observe_set(&self, identifier: &str, token_matched: bool) -> TrackingRecord {
        let now = Utc::now();
        let mut records = self.records.lock();

        let record = records
            .entry(identifier.to_owned())
            .and_modify(|record| record.revisit(now, token_matched))
            .or_insert_with(|| {
                let mut record = TrackingRecord::issue(identifier, now);
                // Cached before this process started.
                if token_matched {
                    record.confirm();
                }
                record
            });

        record.clone()
    }

    pub fn get(&self, identifier: &str) -> Option<TrackingRecord> {
        self.records.lock().get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Tallies one probe classification. Returns `None` without storing
    /// anything when `index` is outside `0..PROBE_WIDTH`.
    pub fn record_probe(&self, index: u32, outcome: ProbeOutcome) -> Option<ProbeTally> {
        if index >= PROBE_WIDTH {
            return None;
        }

        let mut probes = self.probes.lock();
        let tally = probes
            .entry(index)
            .and_modify(|tally| tally.record(outcome))
            .or_insert_with(|| ProbeTally::new(outcome));
        Some(*tally)
    }

    /// Most recent classification seen for a probe index.
    pub fn probe_outcome(&self, index: u32) -> Option<ProbeOutcome> {
        self.probes.lock().get(&index).map(|tally| tally.last)
    }

    /// Bits for probe indices `0..width`, from the latest classification of each:
    /// `'1'` hit, `'0'` miss, `'?'` not probed yet.
    pub fn reconstruct(&self, width: u32) -> String {
        let probes = self.probes.lock();
        (0..width)
            .map(|index| {
                probes
                    .get(&index)
                    .map_or('?', |tally| tally.last.bit())
            })
            .collect()
    }

    /// Read-only view for the stats endpoint; identifiers are masked.
    pub fn snapshot(&self) -> StatsSnapshot {
        let mut ids: Vec<MaskedRecord> = self
            .records
            .lock()
            .values()
            .map(MaskedRecord::from)
            .collect();
        ids.sort_by_key(|record| record.created_at);

        let probes = self.probes.lock().clone();

        StatsSnapshot {
            tracked_users: ids.len(),
            ids,
            probes,
        }
    }
}

impl Default for TrackingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub tracked_users: usize,
    pub ids: Vec<MaskedRecord>,
    pub probes: BTreeMap<u32, ProbeTally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub hit_count: u64,
    pub state: SessionState,
}

impl From<&TrackingRecord> for MaskedRecord {
    fn from(record: &TrackingRecord) -> Self {
        Self {
            id: mask_identifier(&record.identifier),
            created_at: record.created_at,
            last_seen_at: record.last_seen_at,
            hit_count: record.hit_count,
            state: record.state,
        }
    }
}

/// Shortens an identifier for display: at most 8 leading characters and never
/// more than half of it, followed by `...`.
pub fn mask_identifier(identifier: &str) -> String {
    let keep = MASK_PREFIX.min(identifier.chars().count() / 2);
    let prefix: String = identifier.chars().take(keep).collect();
    format!("{prefix}...")
}

/// Fresh identifier for a client that did not bring one, from the OS CSPRNG.
pub fn generate_identifier() -> String {
    Uuid::new_v4().to_string()
}
