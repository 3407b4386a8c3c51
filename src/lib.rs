//! Bit-Packed Presence Cache Cluster Library
//!
//! Tracks, for every id of a dense numeric space, a rolling history of
//! "seen in window N" flags stored as bit-packed fixed-width counters. Caches
//! are served over HTTP and kept convergent across nodes by pairwise
//! full-state exchange.
//!
//! ## Architecture Modules
//! - **`storage`**: The bit-width storage engine. Seven layouts of one counter contract,
//!   plus the name -> cache registry.
//! - **`dispatcher`**: Decodes GET / SET / SYNC / SHIFT / INFO requests and applies them
//!   under a single process-wide lock.
//! - **`replication`**: Pull-initiated, push-executed anti-entropy between nodes (OR-merge).
//! - **`app`**: The Axum router tying the handlers together.
//! - **`config`**: Command-line configuration of a node.
//! - **`error`**: The error taxonomy returned to callers.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod replication;
pub mod storage;
