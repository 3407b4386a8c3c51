//! Bit-Width Storage Engine
//!
//! Keeps a fixed-width rolling presence counter for every id of a dense
//! identifier space, bit-packed according to the width.
//!
//! ## Core Concepts
//! - **Window**: bit `k` of a counter means "seen `k` windows ago"; bit 0 is the current window.
//! - **Aging**: shifts every counter left by one, forgetting the oldest window.
//! - **Occupancy**: number of ids with a nonzero counter, kept exact without scans
//!   except while aging.
//! - **Registry**: `CacheRegistry` binds cache names to engines of a fixed width.

pub mod cache;
pub mod layout;
pub mod registry;
pub mod types;
