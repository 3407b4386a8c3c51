use super::layout::Layout;
use super::types::{BitWidth, CacheCommon};
use crate::error::CacheError;

/// A rolling presence history of fixed width for every id in `[0, capacity)`.
///
/// Bit 0 of a counter is the current window, bit `k` is `k` windows ago.
pub struct BitMapCache {
    common: CacheCommon,
    layout: Layout,
}

/// One run of nonzero counters collected for replication.
#[derive(Debug, Default)]
pub struct NonzeroRun {
    pub ids: Vec<i64>,
    pub flags: Vec<u64>,
    /// Where the next scan should start, `None` once `max_seen_id` was passed.
    pub resume_at: Option<u64>,
}

impl BitMapCache {
    pub fn new(width: BitWidth, capacity: u64) -> Self {
        Self {
            common: CacheCommon::new(capacity),
            layout: Layout::new(width, capacity),
        }
    }

    pub fn capacity(&self) -> u64 {
        self.common.capacity()
    }

    pub fn width(&self) -> BitWidth {
        self.layout.width()
    }

    pub fn bits(&self) -> u32 {
        self.width().bits()
    }

    /// Number of ids holding a nonzero counter.
    pub fn occupancy(&self) -> u64 {
        self.common.occupancy()
    }

    pub fn max_seen_id(&self) -> u64 {
        self.common.max_seen_id()
    }

    /// Marks `id` present in the current window.
    ///
    /// Returns `true` when bit 0 was clear, i.e. this is the first mark since
    /// the last aging step.
    pub fn set_last_window_flag(&mut self, id: u64) -> Result<bool, CacheError> {
        self.common.check_id(id)?;
        self.common.touch(id);

        let before = self.layout.get(id);
        if before & 1 == 1 {
            return Ok(false);
        }

        self.layout.put(id, before | 1);
        self.common.track_transition(before, before | 1);
        Ok(true)
    }

    pub fn get_flags(&self, id: u64) -> Result<u64, CacheError> {
        self.common.check_id(id)?;
        Ok(self.layout.get(id))
    }

    /// Overwrites the whole counter; bits above the cache width are dropped.
    pub fn set_flags(&mut self, id: u64, value: u64) -> Result<(), CacheError> {
        self.common.check_id(id)?;
        self.common.touch(id);

        let value = value & self.width().mask();
        let before = self.layout.get(id);
        self.layout.put(id, value);
        self.common.track_transition(before, value);
        Ok(())
    }

    /// Ages every counter by one window: the oldest bit is forgotten and the
    /// current window starts empty.
    pub fn age_by_one_window(&mut self) {
        let occupied = self.layout.age();
        self.common.reset_occupancy(occupied);
    }

    /// Collects nonzero counters starting at `from`.
    ///
    /// Stops after `max_entries` pairs or after inspecting `scan_limit` ids,
    /// whichever comes first.
    pub fn collect_nonzero(&self, from: u64, max_entries: usize, scan_limit: u64) -> NonzeroRun {
        let mut run = NonzeroRun::default();
        if self.occupancy() == 0 {
            return run;
        }

        let last = self.max_seen_id();
        let end = last.min(from.saturating_add(scan_limit.max(1)) - 1);
        let mut id = from;
        while id <= end {
            let flags = self.layout.get(id);
            if flags != 0 {
                run.ids.push(id as i64);
                run.flags.push(flags);
                if run.ids.len() >= max_entries {
                    id += 1;
                    break;
                }
            }
            id += 1;
        }

        run.resume_at = (id <= last).then_some(id);
        run
    }
}
