//! Physical counter layouts.
//!
//! One closed enumeration of storage shapes, selected by [`BitWidth`]:
//!
//! - `Bits1`: one bit per id packed into `u64` words.
//! - `Bits2`: two parallel bit-planes; `current` holds bit 0, `previous` bit 1.
//! - `Bits4`: two ids per byte, even id in the low nibble, odd id in the high nibble.
//! - `Bits8..Bits64`: one unsigned integer per id, indexed directly.
//!
//! Callers validate ids against capacity before reaching this module.

use super::types::BitWidth;

const WORD_BITS: u64 = 64;

pub enum Layout {
    Bits1 { words: Vec<u64> },
    Bits2 { current: Vec<u64>, previous: Vec<u64> },
    Bits4 { nibbles: Vec<u8> },
    Bits8(Vec<u8>),
    Bits16(Vec<u16>),
    Bits32(Vec<u32>),
    Bits64(Vec<u64>),
}

impl Layout {
    pub fn new(width: BitWidth, capacity: u64) -> Self {
        let words = capacity.div_ceil(WORD_BITS) as usize;
        let slots = capacity as usize;
        match width {
            BitWidth::Bits1 => Layout::Bits1 {
                words: vec![0; words],
            },
            BitWidth::Bits2 => Layout::Bits2 {
                current: vec![0; words],
                previous: vec![0; words],
            },
            BitWidth::Bits4 => Layout::Bits4 {
                nibbles: vec![0; capacity.div_ceil(2) as usize],
            },
            BitWidth::Bits8 => Layout::Bits8(vec![0; slots]),
            BitWidth::Bits16 => Layout::Bits16(vec![0; slots]),
            BitWidth::Bits32 => Layout::Bits32(vec![0; slots]),
            BitWidth::Bits64 => Layout::Bits64(vec![0; slots]),
        }
    }

    pub fn width(&self) -> BitWidth {
        match self {
            Layout::Bits1 { .. } => BitWidth::Bits1,
            Layout::Bits2 { .. } => BitWidth::Bits2,
            Layout::Bits4 { .. } => BitWidth::Bits4,
            Layout::Bits8(_) => BitWidth::Bits8,
            Layout::Bits16(_) => BitWidth::Bits16,
            Layout::Bits32(_) => BitWidth::Bits32,
            Layout::Bits64(_) => BitWidth::Bits64,
        }
    }

    pub fn get(&self, id: u64) -> u64 {
        match self {
            Layout::Bits1 { words } => {
                let (word, bit) = word_bit(id);
                (words[word] >> bit) & 1
            }
            Layout::Bits2 { current, previous } => {
                let (word, bit) = word_bit(id);
                let low = (current[word] >> bit) & 1;
                let high = (previous[word] >> bit) & 1;
                (high << 1) | low
            }
            Layout::Bits4 { nibbles } => {
                let (byte, shift) = nibble_slot(id);
                u64::from((nibbles[byte] >> shift) & 0x0F)
            }
            Layout::Bits8(cells) => cells[id as usize].widen(),
            Layout::Bits16(cells) => cells[id as usize].widen(),
            Layout::Bits32(cells) => cells[id as usize].widen(),
            Layout::Bits64(cells) => cells[id as usize].widen(),
        }
    }

    /// Overwrites the counter. `value` must already be masked to the width.
    pub fn put(&mut self, id: u64, value: u64) {
        match self {
            Layout::Bits1 { words } => {
                let (word, bit) = word_bit(id);
                assign_bit(&mut words[word], bit, value & 1 != 0);
            }
            Layout::Bits2 { current, previous } => {
                let (word, bit) = word_bit(id);
                assign_bit(&mut current[word], bit, value & 1 != 0);
                assign_bit(&mut previous[word], bit, value & 2 != 0);
            }
            Layout::Bits4 { nibbles } => {
                let (byte, shift) = nibble_slot(id);
                let cleared = nibbles[byte] & !(0x0F << shift);
                nibbles[byte] = cleared | (((value & 0x0F) as u8) << shift);
            }
            Layout::Bits8(cells) => cells[id as usize] = Cell::narrow(value),
            Layout::Bits16(cells) => cells[id as usize] = Cell::narrow(value),
            Layout::Bits32(cells) => cells[id as usize] = Cell::narrow(value),
            Layout::Bits64(cells) => cells[id as usize] = Cell::narrow(value),
        }
    }

    /// Shifts every counter one window older and returns the new number of
    /// nonzero counters.
    pub fn age(&mut self) -> u64 {
        match self {
            Layout::Bits1 { words } => {
                words.fill(0);
                0
            }
            Layout::Bits2 { current, previous } => {
                previous.copy_from_slice(current);
                current.fill(0);
                previous.iter().map(|w| u64::from(w.count_ones())).sum()
            }
            Layout::Bits4 { nibbles } => {
                let mut occupied = 0;
                for byte in nibbles.iter_mut() {
                    // Carry out of the low nibble must not leak into the high one.
                    *byte = (*byte << 1) & 0xEE;
                    occupied += u64::from(*byte & 0x0F != 0) + u64::from(*byte & 0xF0 != 0);
                }
                occupied
            }
            Layout::Bits8(cells) => age_cells(cells),
            Layout::Bits16(cells) => age_cells(cells),
            Layout::Bits32(cells) => age_cells(cells),
            Layout::Bits64(cells) => age_cells(cells),
        }
    }
}

fn word_bit(id: u64) -> (usize, u64) {
    ((id / WORD_BITS) as usize, id % WORD_BITS)
}

fn nibble_slot(id: u64) -> (usize, u32) {
    ((id >> 1) as usize, ((id & 1) * 4) as u32)
}

fn assign_bit(word: &mut u64, bit: u64, on: bool) {
    if on {
        *word |= 1 << bit;
    } else {
        *word &= !(1 << bit);
    }
}

/// Fixed-width unsigned element of a flat layout.
trait Cell: Copy {
    fn widen(self) -> u64;
    fn narrow(value: u64) -> Self;
    fn is_zero(self) -> bool;
    fn aged(self) -> Self;
}

macro_rules! impl_cell {
    ($($ty:ty),*) => {
        $(
            impl Cell for $ty {
                fn widen(self) -> u64 {
                    self as u64
                }

                fn narrow(value: u64) -> Self {
                    value as $ty
                }

                fn is_zero(self) -> bool {
                    self == 0
                }

                fn aged(self) -> Self {
                    self << 1
                }
            }
        )*
    };
}

impl_cell!(u8, u16, u32, u64);

fn age_cells<T: Cell>(cells: &mut [T]) -> u64 {
    let mut occupied = 0;
    for cell in cells.iter_mut() {
        *cell = cell.aged();
        if !cell.is_zero() {
            occupied += 1;
        }
    }
    occupied
}
