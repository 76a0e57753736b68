// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Program skeletons: block sizes, markers between blocks, and the jump table.
//!
//! A program with `n` blocks has `n - 1` marker slots; slot `i` sits between
//! block `i` and block `i + 1`. A program's length is the sum of its block
//! sizes plus one symbol per marker.

mod cursor;

pub use cursor::SkeletonCursor;

use crate::errors::CapacityError;

/// Symbol between two blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// Not yet assigned.
    Empty,
    Left,
    Right,
    Output,
}

impl Marker {
    pub fn symbol(self) -> Option<char> {
        match self {
            Marker::Empty => None,
            Marker::Left => Some('['),
            Marker::Right => Some(']'),
            Marker::Output => Some('.'),
        }
    }
}

/// A marker with the bracket depth after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub marker: Marker,
    pub depth: usize,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        marker: Marker::Empty,
        depth: 0,
    };
}

/// Where control goes after a block, by whether the current cell is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jump {
    pub zero: usize,
    pub nonzero: usize,
}

impl Jump {
    fn straight(block: usize) -> Self {
        Jump {
            zero: block + 1,
            nonzero: block + 1,
        }
    }
}

/// A lane's share of the skeleton space: compositions `offset`,
/// `offset + count`, `offset + 2·count`, …
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    offset: usize,
    count: usize,
}

impl Lane {
    pub const SINGLE: Lane = Lane {
        offset: 0,
        count: 1,
    };

    /// # Panics
    ///
    /// Panics unless `offset < count`.
    pub fn new(offset: usize, count: usize) -> Self {
        assert!(offset < count, "lane offset {} out of {}", offset, count);
        Lane { offset, count }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Block sizes, marker slots and jumps of one program shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    block_sizes: Vec<usize>,
    slots: Vec<Slot>,
    jumps: Vec<Jump>,
}

impl Skeleton {
    pub fn with_capacity(capacity: usize) -> Self {
        Skeleton {
            block_sizes: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            jumps: Vec::with_capacity(capacity),
        }
    }

    /// Build a skeleton from properly nested markers.
    ///
    /// # Panics
    ///
    /// Panics if `markers.len() + 1 != block_sizes.len()`, or in debug builds if
    /// the brackets do not nest.
    pub fn from_markers(block_sizes: Vec<usize>, markers: &[Marker]) -> Self {
        assert_eq!(markers.len() + 1, block_sizes.len());
        let mut depth = 0usize;
        let slots = markers
            .iter()
            .map(|&marker| {
                match marker {
                    Marker::Left => depth += 1,
                    Marker::Right => {
                        debug_assert!(depth > 0, "unbalanced markers");
                        depth = depth.saturating_sub(1);
                    }
                    Marker::Empty | Marker::Output => {}
                }
                Slot { marker, depth }
            })
            .collect();
        debug_assert_eq!(depth, 0, "unbalanced markers");
        let mut skeleton = Skeleton {
            block_sizes,
            slots,
            jumps: Vec::new(),
        };
        skeleton.build_jumps(&mut Vec::new());
        skeleton
    }

    pub(crate) fn reset(&mut self, block_count: usize) {
        debug_assert!(block_count >= 1);
        self.block_sizes.clear();
        self.block_sizes.resize(block_count, 0);
        self.slots.clear();
        self.slots.resize(block_count - 1, Slot::EMPTY);
        self.jumps.clear();
        self.jumps.extend((0..block_count).map(Jump::straight));
    }

    /// Fill the jump table with one scan, `open` holding unmatched `Left` slots.
    pub(crate) fn build_jumps(&mut self, open: &mut Vec<usize>) {
        let block_count = self.block_sizes.len();
        open.clear();
        self.jumps.clear();
        self.jumps.extend((0..block_count).map(Jump::straight));
        for (i, slot) in self.slots.iter().enumerate() {
            match slot.marker {
                Marker::Left => open.push(i),
                Marker::Right => {
                    debug_assert!(!open.is_empty(), "unmatched right marker");
                    if let Some(left) = open.pop() {
                        let jump = Jump {
                            zero: i + 1,
                            nonzero: left + 1,
                        };
                        self.jumps[i] = jump;
                        self.jumps[left] = jump;
                    }
                }
                Marker::Empty | Marker::Output => {}
            }
        }
    }

    pub fn block_count(&self) -> usize {
        self.block_sizes.len()
    }

    #[inline]
    pub fn block_size(&self, block: usize) -> usize {
        self.block_sizes[block]
    }

    pub fn block_sizes(&self) -> &[usize] {
        &self.block_sizes
    }

    pub(crate) fn block_sizes_mut(&mut self) -> &mut [usize] {
        &mut self.block_sizes
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    /// The marker after `block`; `Empty` after the last block.
    #[inline]
    pub fn marker_after(&self, block: usize) -> Marker {
        self.slots.get(block).map_or(Marker::Empty, |slot| slot.marker)
    }

    /// The marker before `block`; `Empty` before the first block.
    #[inline]
    pub fn marker_before(&self, block: usize) -> Marker {
        block
            .checked_sub(1)
            .map_or(Marker::Empty, |slot| self.marker_after(slot))
    }

    #[inline]
    pub fn jump(&self, block: usize) -> Jump {
        self.jumps[block]
    }

    /// Total source length.
    pub fn length(&self) -> usize {
        self.block_sizes.iter().sum::<usize>() + self.slots.len()
    }

    pub fn output_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.marker == Marker::Output)
            .count()
    }

    /// True when `block` is the body of a loop with no marker inside it.
    pub fn is_self_loop(&self, block: usize) -> bool {
        self.marker_before(block) == Marker::Left && self.marker_after(block) == Marker::Right
    }
}

/// Check that a program of `length` fits `capacity` block slots.
pub(crate) fn check_capacity(length: usize, capacity: usize) -> Result<(), CapacityError> {
    if length + 1 > capacity {
        Err(CapacityError { length, capacity })
    } else {
        Ok(())
    }
}
