//! Replication Module
//!
//! Best-effort anti-entropy between independent nodes. Replication is
//! pull-initiated and push-executed:
//!
//! 1. **Pull**: shortly after startup a node calls `/reverse_sync` on each configured
//!    peer, passing its own reachable address.
//! 2. **Push**: the peer dials back and streams every nonzero counter as SYNC
//!    requests of at most 1,048,576 entries, which the caller OR-merges.
//!
//! OR-merge is commutative and idempotent, so state converges regardless of how
//! pushes from different peers interleave. There is no rollback and no automatic
//! retry of a failed push; peers are trusted.
//!
//! ## Submodules
//! - **`client`**: HTTP calls to a remote node.
//! - **`pusher`**: batch streaming of local state.
//! - **`puller`**: background pull round over the configured peers.
//! - **`types`**: push reports, pull outcomes and the per-peer status board.
//! - **`handlers`**: HTTP request handlers for the Axum web server.

pub mod client;
pub mod handlers;
pub mod puller;
pub mod pusher;
pub mod types;
