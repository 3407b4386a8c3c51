use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CacheError;

/// Number of identifiers in one capacity unit ("billion" = 2^30).
pub const BILLION: u64 = 1 << 30;

/// Counter width of a cache. Fixed for the lifetime of a cache name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitWidth {
    Bits1,
    Bits2,
    Bits4,
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl BitWidth {
    pub const ALL: [BitWidth; 7] = [
        BitWidth::Bits1,
        BitWidth::Bits2,
        BitWidth::Bits4,
        BitWidth::Bits8,
        BitWidth::Bits16,
        BitWidth::Bits32,
        BitWidth::Bits64,
    ];

    pub fn bits(self) -> u32 {
        match self {
            BitWidth::Bits1 => 1,
            BitWidth::Bits2 => 2,
            BitWidth::Bits4 => 4,
            BitWidth::Bits8 => 8,
            BitWidth::Bits16 => 16,
            BitWidth::Bits32 => 32,
            BitWidth::Bits64 => 64,
        }
    }

    /// All-ones value of this width.
    pub fn mask(self) -> u64 {
        match self {
            BitWidth::Bits64 => u64::MAX,
            other => (1u64 << other.bits()) - 1,
        }
    }
}

impl TryFrom<i64> for BitWidth {
    type Error = CacheError;

    fn try_from(bits: i64) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(BitWidth::Bits1),
            2 => Ok(BitWidth::Bits2),
            4 => Ok(BitWidth::Bits4),
            8 => Ok(BitWidth::Bits8),
            16 => Ok(BitWidth::Bits16),
            32 => Ok(BitWidth::Bits32),
            64 => Ok(BitWidth::Bits64),
            other => Err(CacheError::UnsupportedWidth(other)),
        }
    }
}

impl fmt::Display for BitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Bookkeeping shared by every layout.
///
/// `occupancy` is maintained incrementally by writes and recomputed only
/// when the whole cache ages.
#[derive(Debug, Clone)]
pub struct CacheCommon {
    capacity: u64,
    max_seen: u64,
    occupancy: u64,
}

impl CacheCommon {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            max_seen: 0,
            occupancy: 0,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn occupancy(&self) -> u64 {
        self.occupancy
    }

    pub fn max_seen_id(&self) -> u64 {
        self.max_seen.min(self.capacity.saturating_sub(1))
    }

    pub fn check_id(&self, id: u64) -> Result<(), CacheError> {
        if id >= self.capacity {
            return Err(CacheError::OutOfRange {
                id,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    pub fn touch(&mut self, id: u64) {
        if id > self.max_seen {
            self.max_seen = id;
        }
    }

    /// Adjusts occupancy for one counter going from `before` to `after`.
    pub fn track_transition(&mut self, before: u64, after: u64) {
        match (before == 0, after == 0) {
            (true, false) => self.occupancy += 1,
            (false, true) => self.occupancy -= 1,
            _ => {}
        }
    }

    pub fn reset_occupancy(&mut self, occupancy: u64) {
        self.occupancy = occupancy;
    }
}

/// Administrative snapshot of one named cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub name: String,
    pub width: u32,
    pub capacity: u64,
    pub max_seen_id: u64,
    pub occupancy: u64,
}
