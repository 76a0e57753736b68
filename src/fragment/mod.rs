// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Net effect of loop-free instruction sequences.
//!
//! A [`Fragment`] records, for a run of `+ - < >`, the total change to every
//! cell within [`FRAGMENT_WINDOW`] of the starting pointer and the net pointer
//! displacement. Two sequences with the same fragment are interchangeable in
//! any program, which is what lets the cache keep a single representative.
//!
//! # Composition
//!
//! `a.compose(&b)` is the effect of running `a` then `b`: `b`'s cells are
//! shifted by `a`'s pointer delta and added cell-wise (mod 256). The result
//! is rejected when the combined pointer delta leaves the window or when a
//! non-zero change of `b` would land outside it.

mod instruction;

pub use instruction::Instruction;

use std::fmt;
use std::ops::Range;

use crate::constants::{FRAGMENT_WINDOW, WINDOW_HALF, WINDOW_HIGH, WINDOW_LOW};
use crate::errors::FragmentError;

/// Net effect of a loop-free sequence, relative to the starting pointer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fragment {
    cells: [u8; FRAGMENT_WINDOW],
    pointer_delta: i32,
    /// Tight bounds of the non-zero cells, as offsets; `start == end` when none.
    start: i32,
    end: i32,
}

#[inline]
fn index_of(offset: i32) -> usize {
    debug_assert!((WINDOW_LOW..WINDOW_HIGH).contains(&offset));
    (offset - WINDOW_LOW) as usize
}

#[inline]
fn in_window(offset: i32) -> bool {
    (WINDOW_LOW..WINDOW_HIGH).contains(&offset)
}

impl Fragment {
    /// The empty sequence.
    pub const IDENTITY: Fragment = Fragment {
        cells: [0; FRAGMENT_WINDOW],
        pointer_delta: 0,
        start: 0,
        end: 0,
    };

    fn with_cells(cells: [u8; FRAGMENT_WINDOW], pointer_delta: i32) -> Self {
        let first = cells.iter().position(|&c| c != 0);
        let last = cells.iter().rposition(|&c| c != 0);
        let (start, end) = match (first, last) {
            (Some(first), Some(last)) => (first as i32 + WINDOW_LOW, last as i32 + 1 + WINDOW_LOW),
            _ => (0, 0),
        };
        Fragment {
            cells,
            pointer_delta,
            start,
            end,
        }
    }

    pub fn from_instruction(instruction: Instruction) -> Self {
        let mut cells = [0; FRAGMENT_WINDOW];
        let pointer_delta = match instruction {
            Instruction::Increment => {
                cells[WINDOW_HALF] = 1;
                0
            }
            Instruction::Decrement => {
                cells[WINDOW_HALF] = u8::MAX;
                0
            }
            Instruction::Right => 1,
            Instruction::Left => -1,
        };
        Fragment::with_cells(cells, pointer_delta)
    }

    /// Compute the fragment of a source string made only of `+ - < >`.
    pub fn from_source(source: &str) -> Result<Fragment, FragmentError> {
        source
            .chars()
            .enumerate()
            .try_fold(Fragment::IDENTITY, |acc, (position, symbol)| {
                let instruction = Instruction::from_symbol(symbol)
                    .ok_or(FragmentError::UnknownSymbol { position, symbol })?;
                acc.compose(&Fragment::from_instruction(instruction))
                    .ok_or(FragmentError::OutsideWindow { position })
            })
    }

    /// The effect of running `self` and then `next`, or `None` when it does not
    /// fit the window.
    pub fn compose(&self, next: &Fragment) -> Option<Fragment> {
        let pointer_delta = self.pointer_delta + next.pointer_delta;
        if !in_window(pointer_delta) {
            return None;
        }
        let mut cells = self.cells;
        for (offset, value) in next.changes() {
            let shifted = offset + self.pointer_delta;
            if !in_window(shifted) {
                return None;
            }
            let cell = &mut cells[index_of(shifted)];
            *cell = cell.wrapping_add(value);
        }
        Some(Fragment::with_cells(cells, pointer_delta))
    }

    pub fn pointer_delta(&self) -> i32 {
        self.pointer_delta
    }

    /// A balanced fragment leaves the pointer where it started.
    pub fn is_balanced(&self) -> bool {
        self.pointer_delta == 0
    }

    pub fn is_identity(&self) -> bool {
        self.pointer_delta == 0 && self.start == self.end
    }

    /// The change applied to the starting cell.
    pub fn center(&self) -> u8 {
        self.cells[WINDOW_HALF]
    }

    /// The change applied at `offset` from the starting cell (0 outside the window).
    pub fn cell(&self, offset: i32) -> u8 {
        if in_window(offset) {
            self.cells[index_of(offset)]
        } else {
            0
        }
    }

    /// The change applied to the cell under the pointer once the fragment finished.
    pub fn final_cell(&self) -> u8 {
        self.cell(self.pointer_delta)
    }

    /// Offsets of the non-zero region.
    pub fn span(&self) -> Range<i32> {
        self.start..self.end
    }

    /// True when the only change is to the starting cell.
    pub fn touches_only_center(&self) -> bool {
        self.start >= 0 && self.end <= 1
    }

    /// Non-zero changes as `(offset, value)`, left to right.
    pub fn changes(&self) -> impl Iterator<Item = (i32, u8)> + '_ {
        self.span()
            .map(move |offset| (offset, self.cells[index_of(offset)]))
            .filter(|&(_, value)| value != 0)
    }

    /// Add this fragment to `tape` with the starting cell at `pointer`.
    ///
    /// # Panics
    ///
    /// Panics if the window around `pointer` is not inside `tape`.
    #[inline]
    pub fn add_to(&self, tape: &mut [u8], pointer: usize) {
        let base = pointer - WINDOW_HALF;
        let window = &mut tape[base..base + FRAGMENT_WINDOW];
        for offset in self.span() {
            let index = index_of(offset);
            window[index] = window[index].wrapping_add(self.cells[index]);
        }
    }

    /// Add this fragment `times` times to `tape` with the starting cell at `pointer`.
    ///
    /// # Panics
    ///
    /// Panics if the window around `pointer` is not inside `tape`.
    #[inline]
    pub fn add_scaled_to(&self, tape: &mut [u8], pointer: usize, times: u8) {
        let base = pointer - WINDOW_HALF;
        let window = &mut tape[base..base + FRAGMENT_WINDOW];
        for offset in self.span() {
            let index = index_of(offset);
            window[index] = window[index].wrapping_add(self.cells[index].wrapping_mul(times));
        }
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Fragment::IDENTITY
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fragment(delta {}, {{", self.pointer_delta)?;
        for (i, (offset, value)) in self.changes().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", offset, value as i8)?;
        }
        write!(f, "}})")
    }
}
