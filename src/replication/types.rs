use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Summary of one completed push to a peer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushReport {
    /// Unique id of this push, present in every log line it emits.
    pub session: String,
    /// Address the state was pushed to.
    pub target: String,
    pub caches: usize,
    /// Number of `(id, flags)` pairs delivered.
    pub entries: u64,
    pub batches: u64,
}

/// How a pull from one peer ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PullStatus {
    /// The peer pushed its full state back to us.
    Completed,
    /// Dial, call or push failure. Earlier batches stay merged.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullOutcome {
    pub peer: String,
    pub status: PullStatus,
    /// Timestamp (ms) when the attempt finished.
    pub finished_at: u64,
}

impl PullOutcome {
    pub fn completed(peer: &str) -> Self {
        Self {
            peer: peer.to_string(),
            status: PullStatus::Completed,
            finished_at: now_ms(),
        }
    }

    pub fn failed(peer: &str, error: impl ToString) -> Self {
        Self {
            peer: peer.to_string(),
            status: PullStatus::Failed {
                error: error.to_string(),
            },
            finished_at: now_ms(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == PullStatus::Completed
    }
}

/// Last pull outcome per peer.
pub struct SyncBoard {
    outcomes: DashMap<String, PullOutcome>,
}

impl SyncBoard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outcomes: DashMap::new(),
        })
    }

    pub fn record(&self, outcome: PullOutcome) {
        self.outcomes.insert(outcome.peer.clone(), outcome);
    }

    pub fn get(&self, peer: &str) -> Option<PullOutcome> {
        self.outcomes.get(peer).map(|entry| entry.value().clone())
    }

    /// All outcomes, sorted by peer address.
    pub fn snapshot(&self) -> Vec<PullOutcome> {
        let mut outcomes: Vec<PullOutcome> = self
            .outcomes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        outcomes.sort_by(|a, b| a.peer.cmp(&b.peer));
        outcomes
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
