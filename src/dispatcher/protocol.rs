//! Cache Network Protocol
//!
//! Defines the API endpoints and Data Transfer Objects (DTOs) used by clients
//! and by peers during reverse sync.
//!
//! These structures are serialized as JSON and sent over HTTP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

// --- API Endpoints ---

/// Endpoint executing one operator against a named cache.
pub const ENDPOINT_REQUEST: &str = "/request";
/// Endpoint asking this node to push its whole state to the caller.
pub const ENDPOINT_REVERSE_SYNC: &str = "/reverse_sync";
/// Administrative listing of every live cache.
pub const ENDPOINT_CACHES: &str = "/caches";
/// Last pull outcome per configured peer.
pub const ENDPOINT_SYNC_STATUS: &str = "/sync/status";

/// Maximum number of `(id, flags)` pairs in one pushed SYNC request.
pub const PUSH_BATCH_SIZE: usize = 1024 * 1024;

// --- Operators ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Read counters.
    Get,
    /// Mark ids present in the current window.
    Set,
    /// OR-merge full counter values.
    Sync,
    /// Age the cache by one window.
    Shift,
    /// Log every live cache.
    Info,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Get => "GET",
            Operator::Set => "SET",
            Operator::Sync => "SYNC",
            Operator::Shift => "SHIFT",
            Operator::Info => "INFO",
        }
    }
}

impl FromStr for Operator {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Operator::Get),
            "SET" => Ok(Operator::Set),
            "SYNC" => Ok(Operator::Sync),
            "SHIFT" => Ok(Operator::Shift),
            // Older clients spell it out in full.
            "INFO" | "INFOMATION" => Ok(Operator::Info),
            other => Err(CacheError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Data Transfer Objects ---

/// One operator invocation against a named cache.
///
/// `width` and `operator` travel as raw values so that unsupported ones,
/// negative widths included, come back as a typed error instead of a body
/// rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRequest {
    /// Counter width in bits, one of 1, 2, 4, 8, 16, 32, 64.
    pub width: i64,
    /// Cache name.
    pub name: String,
    /// `GET`, `SET`, `SYNC`, `SHIFT` or `INFO`.
    pub operator: String,
    #[serde(default)]
    pub ids: Vec<i64>,
    /// Flag values, parallel to `ids`. Only read by `SYNC`.
    #[serde(default)]
    pub flags: Vec<u64>,
}

impl CacheRequest {
    pub fn new(width: u32, name: &str, operator: Operator) -> Self {
        Self {
            width: i64::from(width),
            name: name.to_string(),
            operator: operator.as_str().to_string(),
            ids: Vec::new(),
            flags: Vec::new(),
        }
    }

    pub fn with_ids(mut self, ids: Vec<i64>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_flags(mut self, flags: Vec<u64>) -> Self {
        self.flags = flags;
        self
    }
}

/// Result of a request.
///
/// - `GET`: every in-range id with its counter.
/// - `SET`: ids that were newly marked in the current window; `flags` is empty.
/// - `SYNC`, `SHIFT`, `INFO`: empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheResponse {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(default)]
    pub flags: Vec<u64>,
}

/// Sent by a node that wants to receive a peer's full state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseSyncRequest {
    /// Where the callee should connect back to push data.
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReverseSyncResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
