// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The skeleton state machine: block-size compositions × marker assignments.
//!
//! # Algorithm
//!
//! Compositions are numbered in a fixed order. Composition 0 is one block
//! covering the whole length. When a block count runs out of compositions the
//! count grows by [`Dialect::growth_step`], and the new count starts from
//! `[min_first, 0, …, 0, rest]`. Within a count the non-last blocks behave as an
//! odometer whose rightmost digit moves first; the last block takes what is
//! left. A lane visits compositions `offset, offset + count, …` only.
//!
//! For each composition the marker slots are filled depth-first, each slot
//! trying `Left`, `Right`, `Output` in turn and backtracking when none is left.
//! A choice must be structurally possible (enough slots remain to close every
//! open bracket) and locally admissible (see [`SkeletonCursor::admissible`]).

use crate::dialect::Dialect;
use crate::errors::CapacityError;

use super::{check_capacity, Lane, Marker, Skeleton, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Running,
    Exhausted,
}

const MARKER_ORDER: [Marker; 3] = [Marker::Left, Marker::Right, Marker::Output];

/// Steps through every admissible skeleton of one length, for one lane.
#[derive(Debug, Clone)]
pub struct SkeletonCursor {
    dialect: Dialect,
    capacity: usize,
    length: usize,
    lane: Lane,
    skeleton: Skeleton,
    /// Length left over for the last block.
    remaining: usize,
    fresh_composition: bool,
    marker_cursor: Option<usize>,
    linear_pending: bool,
    open: Vec<usize>,
    phase: Phase,
}

impl SkeletonCursor {
    pub fn new(dialect: Dialect, capacity: usize) -> Self {
        SkeletonCursor {
            dialect,
            capacity,
            length: 0,
            lane: Lane::SINGLE,
            skeleton: Skeleton::with_capacity(capacity),
            remaining: 0,
            fresh_composition: false,
            marker_cursor: None,
            linear_pending: false,
            open: Vec::with_capacity(capacity),
            phase: Phase::Exhausted,
        }
    }

    /// Position before the first skeleton of `length` in `lane`.
    pub fn start(&mut self, length: usize, lane: Lane) -> Result<(), CapacityError> {
        check_capacity(length, self.capacity)?;
        self.length = length;
        self.lane = lane;
        self.skeleton.reset(1);
        self.skeleton.block_sizes_mut()[0] = length;
        self.remaining = 0;
        self.fresh_composition = false;
        self.phase = Phase::Fresh;
        Ok(())
    }

    /// Move to the next skeleton; `false` once the lane's share is exhausted.
    pub fn advance(&mut self) -> bool {
        match self.phase {
            Phase::Exhausted => return false,
            Phase::Fresh => {
                self.phase = Phase::Running;
                if !self.advance_compositions(self.lane.offset()) {
                    self.phase = Phase::Exhausted;
                    return false;
                }
                self.reset_markers();
            }
            Phase::Running => {}
        }
        while !self.next_markers() {
            if !self.advance_compositions(self.lane.count()) {
                self.phase = Phase::Exhausted;
                return false;
            }
            self.reset_markers();
        }
        true
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn advance_compositions(&mut self, steps: usize) -> bool {
        for _ in 0..steps {
            while !self.next_composition() {
                if !self.grow() {
                    return false;
                }
            }
        }
        true
    }

    fn grow(&mut self) -> bool {
        let block_count = self.skeleton.block_count() + self.dialect.growth_step();
        if block_count > self.length {
            return false;
        }
        let free = self.length - (block_count - 1);
        let min_first = self.dialect.min_first_block_size();
        if min_first > free {
            return false;
        }
        self.skeleton.reset(block_count);
        self.skeleton.block_sizes_mut()[0] = min_first;
        self.remaining = free - min_first;
        self.fresh_composition = true;
        true
    }

    fn next_composition(&mut self) -> bool {
        let block_count = self.skeleton.block_count();
        if block_count < 2 {
            return false;
        }
        loop {
            if !self.step_composition() {
                return false;
            }
            if self.dialect.no_trailing_linear_block && self.remaining != 0 {
                continue;
            }
            self.skeleton.block_sizes_mut()[block_count - 1] = self.remaining;
            return true;
        }
    }

    fn step_composition(&mut self) -> bool {
        if self.fresh_composition {
            self.fresh_composition = false;
            return true;
        }
        let max_first = self.dialect.max_first_block_size;
        let sizes = self.skeleton.block_sizes_mut();
        let mut i = sizes.len() - 2;
        loop {
            if self.remaining == 0 {
                self.remaining += sizes[i];
                sizes[i] = 0;
                if i == 0 {
                    return false;
                }
                i -= 1;
            } else {
                if i == 0 && max_first.is_some_and(|max| sizes[0] >= max) {
                    return false;
                }
                sizes[i] += 1;
                self.remaining -= 1;
                return true;
            }
        }
    }

    fn reset_markers(&mut self) {
        let slot_count = self.skeleton.slots().len();
        for slot in self.skeleton.slots_mut() {
            *slot = Slot::EMPTY;
        }
        self.marker_cursor = (slot_count > 0).then_some(0);
        self.linear_pending = slot_count == 0;
    }

    fn next_markers(&mut self) -> bool {
        let slot_count = self.skeleton.slots().len();
        if slot_count == 0 {
            let pending = std::mem::take(&mut self.linear_pending);
            if pending && self.passes_filters() {
                self.skeleton.build_jumps(&mut self.open);
                return true;
            }
            return false;
        }
        while let Some(i) = self.marker_cursor {
            match self.next_choice(i) {
                None => {
                    self.skeleton.slots_mut()[i] = Slot::EMPTY;
                    self.marker_cursor = i.checked_sub(1);
                }
                Some(slot) => {
                    self.skeleton.slots_mut()[i] = slot;
                    if !self.admissible(i) {
                        continue;
                    }
                    if i + 1 == slot_count {
                        if self.passes_filters() {
                            self.skeleton.build_jumps(&mut self.open);
                            return true;
                        }
                        continue;
                    }
                    self.marker_cursor = Some(i + 1);
                }
            }
        }
        false
    }

    fn previous_depth(&self, i: usize) -> usize {
        i.checked_sub(1)
            .map_or(0, |previous| self.skeleton.slots()[previous].depth)
    }

    /// The next structurally possible marker for slot `i` after its current one.
    fn next_choice(&self, i: usize) -> Option<Slot> {
        let remaining = self.skeleton.slots().len() - i;
        let depth = self.previous_depth(i);
        let first = match self.skeleton.slots()[i].marker {
            Marker::Empty => 0,
            Marker::Left => 1,
            Marker::Right => 2,
            Marker::Output => 3,
        };
        MARKER_ORDER[first..]
            .iter()
            .find_map(|&marker| match marker {
                Marker::Left if remaining >= depth + 2 => Some(Slot {
                    marker,
                    depth: depth + 1,
                }),
                Marker::Right if depth > 0 => Some(Slot {
                    marker,
                    depth: depth - 1,
                }),
                Marker::Output if self.dialect.allows_output() && remaining > depth => {
                    Some(Slot { marker, depth })
                }
                _ => None,
            })
    }

    /// Local rules for the marker just placed in slot `i`.
    ///
    /// - `Left` after an empty block must not directly follow `Right` (`][`),
    ///   and respects the depth limit and single hierarchy.
    /// - `Right` needs a non-empty block before it (no `[]`).
    /// - `Output` after an empty block must not follow `Right`, nor another
    ///   `Output` when repeats are disallowed, nor open the program.
    fn admissible(&self, i: usize) -> bool {
        let slots = self.skeleton.slots();
        let slot = slots[i];
        let block_filled = self.skeleton.block_size(i) > 0;
        let previous = i.checked_sub(1).map(|p| slots[p].marker);
        match slot.marker {
            Marker::Left => {
                (block_filled || previous != Some(Marker::Right))
                    && self
                        .dialect
                        .max_bracket_depth
                        .map_or(true, |max| slot.depth <= max)
                    && (!self.dialect.single_bracket_hierarchy
                        || i == 0
                        || self.previous_depth(i) > 0)
            }
            Marker::Right => block_filled,
            Marker::Output => {
                block_filled
                    || match previous {
                        None | Some(Marker::Right) => false,
                        Some(Marker::Output) => !self.dialect.no_repeated_output,
                        Some(_) => true,
                    }
            }
            Marker::Empty => false,
        }
    }

    fn passes_filters(&self) -> bool {
        let outputs = self.skeleton.output_count();
        let zero_depth_outputs = self
            .skeleton
            .slots()
            .iter()
            .filter(|slot| slot.marker == Marker::Output && slot.depth == 0)
            .count();
        self.dialect.min_output_count.map_or(true, |min| outputs >= min)
            && self.dialect.max_output_count.map_or(true, |max| outputs <= max)
            && self
                .dialect
                .max_zero_depth_output_count
                .map_or(true, |max| zero_depth_outputs <= max)
    }
}
