// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Candidate programs: every skeleton of a length crossed with every
//! assignment of cache fragments to its blocks.
//!
//! # Algorithm
//!
//! The [`SkeletonCursor`] supplies skeletons. For each one a [`FragmentWalker`]
//! per block visits the loop-free texts of that block's size, as an odometer
//! whose last block moves fastest. A block value is skipped as soon as it is
//! placed when it cannot lead to an interesting program:
//!
//! - its composite does not fit the fragment window;
//! - mirror symmetry: the first block that moves the pointer must move it right;
//! - on a zero tape the first block must change the start cell, and leave a
//!   non-zero cell under the pointer when more blocks follow;
//! - a loop body that only decrements once, or that is a plain run of `+` or
//!   `-`, is redundant with `[+]`.
//!
//! After a failed [`execute`](ProgramEnumerator::execute) the blocks beyond
//! the furthest one the run reached cannot have influenced the failure, so the
//! next [`advance`](ProgramEnumerator::advance) moves the walker of that block
//! directly.

use tracing::debug;

use crate::constants::DEFAULT_SLOT_CAPACITY;
use crate::dialect::Dialect;
use crate::errors::{CapacityError, Rejection};
use crate::fragment::Fragment;
use crate::machine::{MachineLimits, OutputCursor, Program, TapeMachine};
use crate::memo::MemoizedData;
use crate::skeleton::{Lane, Skeleton, SkeletonCursor};
use crate::walker::FragmentWalker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumeratorOptions {
    /// Block slots; bounds the longest program.
    pub capacity: usize,
    pub skip_unreached: bool,
    pub machine: MachineLimits,
}

impl Default for EnumeratorOptions {
    fn default() -> Self {
        EnumeratorOptions {
            capacity: DEFAULT_SLOT_CAPACITY,
            skip_unreached: true,
            machine: MachineLimits::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Fresh,
    Running,
    Exhausted,
}

/// The program the enumerator currently points at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    skeleton: &'a Skeleton,
    walkers: &'a [FragmentWalker<'a>],
}

impl Program for Candidate<'_> {
    fn skeleton(&self) -> &Skeleton {
        self.skeleton
    }

    #[inline]
    fn block(&self, index: usize) -> Option<&Fragment> {
        self.walkers.get(index).and_then(FragmentWalker::current)
    }

    fn render(&self) -> String {
        let mut out = String::with_capacity(self.skeleton.length());
        for block in 0..self.skeleton.block_count() {
            self.walkers[block].render_into(&mut out);
            if let Some(symbol) = self.skeleton.marker_after(block).symbol() {
                out.push(symbol);
            }
        }
        out
    }
}

/// Number of block-value tuples of `skeleton`, before pruning.
fn skeleton_estimate(memo: &MemoizedData, skeleton: &Skeleton) -> u64 {
    skeleton
        .block_sizes()
        .iter()
        .map(|&size| FragmentWalker::tuple_count(&memo.cache, size))
        .fold(1u64, u64::saturating_mul)
}

/// One lane's generator of candidate programs, with its own tape machine.
#[derive(Debug)]
pub struct ProgramEnumerator<'m> {
    memo: &'m MemoizedData,
    dialect: Dialect,
    options: EnumeratorOptions,
    cursor: SkeletonCursor,
    walkers: Vec<FragmentWalker<'m>>,
    machine: TapeMachine,
    phase: Phase,
    /// Lowest furthest block of the failed runs of the current candidate.
    skip_from: Option<usize>,
    current_estimate: u64,
    completed_estimate: u64,
    pruned: u64,
}

impl<'m> ProgramEnumerator<'m> {
    pub fn new(memo: &'m MemoizedData, dialect: Dialect, options: EnumeratorOptions) -> Self {
        ProgramEnumerator {
            memo,
            dialect,
            options,
            cursor: SkeletonCursor::new(dialect, options.capacity),
            walkers: (0..options.capacity)
                .map(|_| FragmentWalker::new(&memo.cache))
                .collect(),
            machine: TapeMachine::new(options.machine, &dialect),
            phase: Phase::Exhausted,
            skip_from: None,
            current_estimate: 0,
            completed_estimate: 0,
            pruned: 0,
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn options(&self) -> &EnumeratorOptions {
        &self.options
    }

    /// Position before the first candidate of `length` in `lane`.
    pub fn start(&mut self, length: usize, lane: Lane) -> Result<(), CapacityError> {
        self.cursor.start(length, lane)?;
        self.phase = Phase::Fresh;
        self.skip_from = None;
        self.current_estimate = 0;
        self.completed_estimate = 0;
        self.pruned = 0;
        debug!(length, lane = lane.offset(), lanes = lane.count(), "enumerator started");
        Ok(())
    }

    /// Move to the next candidate; `false` once the lane is exhausted.
    pub fn advance(&mut self) -> bool {
        let block_count = self.cursor.skeleton().block_count();
        let skip_from = self.skip_from.take();
        let mut from = match self.phase {
            Phase::Exhausted => return false,
            Phase::Fresh => None,
            Phase::Running => Some(match skip_from {
                Some(reach) if self.options.skip_unreached => reach.min(block_count - 1),
                _ => block_count - 1,
            }),
        };
        self.phase = Phase::Running;
        loop {
            if let Some(block) = from {
                if self.next_values(block) {
                    return true;
                }
                self.completed_estimate = self
                    .completed_estimate
                    .saturating_add(self.current_estimate);
            }
            if !self.cursor.advance() {
                self.phase = Phase::Exhausted;
                return false;
            }
            let skeleton = self.cursor.skeleton();
            self.current_estimate = skeleton_estimate(self.memo, skeleton);
            self.walkers[0].start(skeleton.block_size(0));
            from = Some(0);
        }
    }

    /// [`advance`](Self::advance), returning the new candidate.
    pub fn step(&mut self) -> Option<Candidate<'_>> {
        if self.advance() {
            Some(self.candidate())
        } else {
            None
        }
    }

    /// The current candidate; only meaningful after a successful advance.
    pub fn candidate(&self) -> Candidate<'_> {
        Candidate {
            skeleton: self.cursor.skeleton(),
            walkers: &self.walkers,
        }
    }

    pub fn render_program(&self) -> String {
        self.candidate().render()
    }

    /// Run the current candidate on one input.
    pub fn execute(
        &mut self,
        input: &[u8],
        input_offset: isize,
        output: Option<&mut OutputCursor<'_>>,
    ) -> Result<(), Rejection> {
        let candidate = Candidate {
            skeleton: self.cursor.skeleton(),
            walkers: &self.walkers,
        };
        let result = self
            .machine
            .run(&candidate, &self.memo.divisors, input, input_offset, output);
        if result.is_err() {
            let reach = self.machine.furthest_block();
            self.skip_from = Some(self.skip_from.map_or(reach, |from| from.min(reach)));
        }
        result
    }

    /// The tape machine, holding the state left by the last run.
    pub fn machine(&self) -> &TapeMachine {
        &self.machine
    }

    /// Candidates of `length` over all lanes, ignoring value pruning.
    pub fn estimate_total_candidates(&self, length: usize) -> Result<u64, CapacityError> {
        let mut cursor = SkeletonCursor::new(self.dialect, self.options.capacity);
        cursor.start(length, Lane::SINGLE)?;
        let mut total = 0u64;
        while cursor.advance() {
            total = total.saturating_add(skeleton_estimate(self.memo, cursor.skeleton()));
        }
        Ok(total)
    }

    /// Estimated candidates of the skeletons this lane has finished.
    pub fn completed_estimate(&self) -> u64 {
        self.completed_estimate
    }

    /// Block values skipped by pruning since [`start`](Self::start).
    pub fn pruned(&self) -> u64 {
        self.pruned
    }

    /// Advance the walker of block `from`, restarting every later block, until
    /// all blocks hold acceptable values.
    fn next_values(&mut self, from: usize) -> bool {
        let block_count = self.cursor.skeleton().block_count();
        let mut block = from;
        loop {
            if self.walkers[block].advance() {
                if !self.acceptable(block) {
                    self.pruned += 1;
                    continue;
                }
                if block + 1 == block_count {
                    return true;
                }
                block += 1;
                let size = self.cursor.skeleton().block_size(block);
                self.walkers[block].start(size);
            } else if block == 0 {
                return false;
            } else {
                block -= 1;
            }
        }
    }

    fn acceptable(&self, block: usize) -> bool {
        let Some(fragment) = self.walkers[block].current() else {
            return false;
        };
        let skeleton = self.cursor.skeleton();

        if self.dialect.mirror_symmetric()
            && fragment.pointer_delta() < 0
            && self.walkers[..block]
                .iter()
                .all(|walker| walker.current().is_some_and(Fragment::is_balanced))
        {
            return false;
        }

        if self.dialect.initial_zero
            && block == 0
            && (fragment.center() == 0
                || (skeleton.block_count() > 1 && fragment.final_cell() == 0))
        {
            return false;
        }

        if self.dialect.reject_redundant_clear && skeleton.is_self_loop(block) {
            let size = skeleton.block_size(block);
            let center = fragment.center() as usize;
            let redundant = if size == 1 {
                center == 255
            } else {
                fragment.touches_only_center() && (center == size % 256 || center == 256 - size % 256)
            };
            if redundant {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::CacheLimits;
    use std::collections::HashSet;

    fn memo(max_fragment_length: usize) -> MemoizedData {
        MemoizedData::new(&CacheLimits {
            max_fragment_length,
            max_entries: None,
        })
        .unwrap()
    }

    fn programs(memo: &MemoizedData, dialect: Dialect, length: usize) -> Vec<String> {
        let mut enumerator = ProgramEnumerator::new(memo, dialect, EnumeratorOptions::default());
        enumerator.start(length, Lane::SINGLE).unwrap();
        let mut out = Vec::new();
        while let Some(candidate) = enumerator.step() {
            out.push(candidate.render());
        }
        out
    }

    #[test]
    fn test_canonical_clear_only() {
        let memo = memo(4);
        let found = programs(&memo, Dialect::data(), 3);
        assert_eq!(found.iter().filter(|p| *p == "[+]").count(), 1);
        assert!(!found.iter().any(|p| p == "[-]"));
        assert!(found.iter().any(|p| p == "[>]"));
        assert!(found.iter().all(|p| p.len() == 3));
    }

    #[test]
    fn test_zero_tape_pruning() {
        let memo = memo(4);
        let dialect = Dialect {
            initial_zero: true,
            ..Dialect::data()
        };
        let found: HashSet<_> = programs(&memo, dialect, 2).into_iter().collect();
        let expected: HashSet<String> = ["++", "--", "+>", "->"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_symmetric_start_keeps_right_movers() {
        let memo = memo(4);
        let symmetric = Dialect {
            initial_data_symmetric: true,
            ..Dialect::data()
        };
        let found = programs(&memo, symmetric, 3);
        for program in &found {
            let first_move = program
                .split(['[', ']'])
                .map(|block| block.matches('>').count() as i32 - block.matches('<').count() as i32)
                .find(|&delta| delta != 0);
            assert!(first_move.map_or(true, |delta| delta > 0), "{}", program);
        }
        let leftish: HashSet<_> = found.iter().filter(|p| p.contains('<')).cloned().collect();
        let expected: HashSet<String> = [">+<", ">-<", "<+>", "<->"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(leftish, expected);

        let unrestricted = programs(&memo, Dialect::data(), 3);
        assert!(unrestricted.iter().any(|p| p == "[<]"));
        assert!(!found.iter().any(|p| p == "[<]"));
        assert!(found.iter().all(|p| unrestricted.contains(p)));
    }

    #[test]
    fn test_estimate_matches_unpruned_count() {
        let memo = memo(6);
        let dialect = Dialect {
            reject_redundant_clear: false,
            ..Dialect::data()
        };
        let mut enumerator = ProgramEnumerator::new(&memo, dialect, EnumeratorOptions::default());
        for length in 1..=6 {
            let estimate = enumerator.estimate_total_candidates(length).unwrap();
            enumerator.start(length, Lane::SINGLE).unwrap();
            let mut count = 0u64;
            while enumerator.advance() {
                count += 1;
            }
            assert_eq!(count, estimate, "length {}", length);
            assert_eq!(enumerator.completed_estimate(), estimate);
            assert_eq!(enumerator.pruned(), 0);
        }
    }

    #[test]
    fn test_exhausted_enumerator_stays_exhausted() {
        let memo = memo(3);
        let mut enumerator =
            ProgramEnumerator::new(&memo, Dialect::data(), EnumeratorOptions::default());
        assert!(!enumerator.advance());
        enumerator.start(1, Lane::SINGLE).unwrap();
        let mut count = 0;
        while enumerator.advance() {
            count += 1;
        }
        assert_eq!(count, 4);
        assert!(!enumerator.advance());
        assert!(enumerator.step().is_none());
    }

    #[test]
    fn test_execute_runs_current_candidate() {
        let memo = memo(4);
        let mut enumerator =
            ProgramEnumerator::new(&memo, Dialect::data(), EnumeratorOptions::default());
        enumerator.start(3, Lane::SINGLE).unwrap();
        while enumerator.advance() {
            if enumerator.render_program() == "+++" {
                assert_eq!(enumerator.execute(&[], 0, None), Ok(()));
                assert_eq!(enumerator.machine().cells_at(0, 1), Some(&[3u8][..]));
                return;
            }
        }
        panic!("+++ not enumerated");
    }

    #[test]
    fn test_capacity_error() {
        let memo = memo(3);
        let options = EnumeratorOptions {
            capacity: 8,
            ..EnumeratorOptions::default()
        };
        let mut enumerator = ProgramEnumerator::new(&memo, Dialect::data(), options);
        assert!(enumerator.start(8, Lane::SINGLE).is_err());
        assert!(enumerator.estimate_total_candidates(8).is_err());
    }
}
