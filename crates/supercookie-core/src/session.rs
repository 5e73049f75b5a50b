use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a tracked identifier. An identifier without a record is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Bitmap served, not yet seen coming back from a cache.
    Issued,
    /// The client presented the identifier's ETag at least once.
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingRecord {
    #[serde(skip)]
    pub identifier: String,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub hit_count: u64,
    pub state: SessionState,
}

impl TrackingRecord {
    pub fn issue(identifier: &str, now: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.to_owned(),
            created_at: now,
            last_seen_at: now,
            hit_count: 1,
            state: SessionState::Issued,
        }
    }

    /// Records another sighting. `Confirmed` is never left once reached.
    pub fn revisit(&mut self, now: DateTime<Utc>, token_matched: bool) {
        self.last_seen_at = now;
        self.hit_count += 1;
        if token_matched {
            self.confirm();
        }
    }

    pub fn confirm(&mut self) {
        self.state = SessionState::Confirmed;
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == SessionState::Confirmed
    }
}

/// Cache status inferred from a probe request; this is the recovered bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    Hit,
    Miss,
}

impl ProbeOutcome {
    /// Any validator on the request means the browser holds a cached copy.
    pub fn classify(has_if_none_match: bool, has_if_modified_since: bool) -> Self {
        if has_if_none_match || has_if_modified_since {
            ProbeOutcome::Hit
        } else {
            ProbeOutcome::Miss
        }
    }

    pub fn bit(self) -> char {
        match self {
            ProbeOutcome::Hit => '1',
            ProbeOutcome::Miss => '0',
        }
    }

    pub fn is_hit(self) -> bool {
        self == ProbeOutcome::Hit
    }
}

/// Running classification counts for one probe index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeTally {
    pub hits: u64,
    pub misses: u64,
    pub last: ProbeOutcome,
}

impl ProbeTally {
    pub fn new(outcome: ProbeOutcome) -> Self {
        let mut tally = Self {
            hits: 0,
            misses: 0,
            last: outcome,
        };
        tally.record(outcome);
        tally
    }

    pub fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Hit => self.hits += 1,
            ProbeOutcome::Miss => self.misses += 1,
        }
        self.last = outcome;
    }
}
