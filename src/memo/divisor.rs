// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Iteration counts for self-looped balanced blocks.
//!
//! A loop `[B]` whose body `B` is balanced changes its own cell by the same
//! `k` on every iteration. Starting from `d`, the loop exits after the minimal
//! `n` with `d + n·k ≡ 0 (mod 256)`, and never exits when no such `n` exists.
//! The table answers that question in one lookup.
//!
//! # Algorithm
//!
//! For every step `k` of `1..=255`, walk `mult = k, 2k, 3k, …` until it wraps
//! back to 0. At count `n`, the cell value `mult = n·k` reaches zero after `n`
//! iterations of a body adding `256 - k`, so `table[mult][256 - k] = n`. Within
//! one walk every `mult` is visited once, so the first count recorded is the
//! minimal one.

const SIZE: usize = 256;

/// Minimal iteration counts, indexed by (cell value, center delta).
#[derive(Clone)]
pub struct DivisorTable {
    counts: Box<[Option<u8>]>,
}

#[inline]
fn slot(value: u8, step: u8) -> usize {
    value as usize * SIZE + step as usize
}

impl DivisorTable {
    pub fn new() -> Self {
        let mut counts = vec![None; SIZE * SIZE].into_boxed_slice();
        for step in 0..=u8::MAX {
            counts[slot(0, step)] = Some(0);
        }
        for k in 1..=u8::MAX {
            let complement = 0u8.wrapping_sub(k);
            let mut mult = k;
            let mut iterations: u8 = 1;
            while mult != 0 {
                counts[slot(mult, complement)] = Some(iterations);
                iterations = iterations.wrapping_add(1);
                mult = mult.wrapping_add(k);
            }
        }
        DivisorTable { counts }
    }

    /// Minimal `n` with `value + n·step ≡ 0 (mod 256)`; `None` when the loop
    /// never terminates.
    #[inline]
    pub fn get(&self, value: u8, step: u8) -> Option<u8> {
        self.counts[slot(value, step)]
    }
}

impl Default for DivisorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DivisorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let solvable = self.counts.iter().filter(|c| c.is_some()).count();
        write!(f, "DivisorTable({} solvable entries)", solvable)
    }
}
