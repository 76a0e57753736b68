// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Statistics
//!
//! Each lane counts into its own [`LaneStatistics`] without synchronisation and
//! periodically publishes the counts into the shared [`Progress`], which holds
//! atomics only and can be read from any thread while a search runs.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use strum::{EnumCount, IntoEnumIterator};
use strum_macros::EnumCount as EnumCountMacro;

use crate::errors::Rejection;

#[derive(Debug, EnumCountMacro, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Counters {
    Candidates,
    /// Block values skipped before a candidate was formed.
    Pruned,
    Matches,
}

const REJECTIONS: usize = Rejection::COUNT;
const COUNT: usize = Counters::COUNT + REJECTIONS;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LaneStatistics {
    stats: [u64; COUNT],
}

impl LaneStatistics {
    pub fn new() -> Self {
        LaneStatistics::default()
    }

    pub fn increment(&mut self, counter: Counters) {
        self.stats[counter as usize] += 1;
    }

    pub fn add(&mut self, counter: Counters, amount: u64) {
        self.stats[counter as usize] += amount;
    }

    pub fn reject(&mut self, rejection: Rejection) {
        self.stats[Counters::COUNT + rejection as usize] += 1;
    }

    pub fn get(&self, counter: Counters) -> u64 {
        self.stats[counter as usize]
    }

    pub fn rejections(&self, rejection: Rejection) -> u64 {
        self.stats[Counters::COUNT + rejection as usize]
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &LaneStatistics) {
        for (mine, theirs) in self.stats.iter_mut().zip(other.stats.iter()) {
            *mine += theirs;
        }
    }

    /// Return the counts so far and reset to zero.
    pub fn take(&mut self) -> LaneStatistics {
        std::mem::take(self)
    }
}

/// Shared search progress.
#[derive(Debug)]
pub struct Progress {
    candidates: AtomicU64,
    pruned: AtomicU64,
    matches: AtomicU64,
    rejections: [AtomicU64; REJECTIONS],
    length: AtomicUsize,
    estimated_total: AtomicU64,
    estimated_done: AtomicU64,
    cancelled: AtomicBool,
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}

/// A consistent-enough copy of [`Progress`] for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub length: usize,
    pub candidates: u64,
    pub matches: u64,
    pub estimated_total: u64,
    pub estimated_done: u64,
}

impl ProgressSnapshot {
    /// Fraction of the current length's estimate that is finished.
    pub fn completion(&self) -> f64 {
        if self.estimated_total == 0 {
            0.0
        } else {
            self.estimated_done as f64 / self.estimated_total as f64
        }
    }
}

impl Progress {
    pub fn new() -> Self {
        Progress {
            candidates: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            rejections: std::array::from_fn(|_| AtomicU64::new(0)),
            length: AtomicUsize::new(0),
            estimated_total: AtomicU64::new(0),
            estimated_done: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    pub(crate) fn begin_length(&self, length: usize, estimated_total: u64) {
        self.length.store(length, Ordering::Relaxed);
        self.estimated_total.store(estimated_total, Ordering::Relaxed);
        self.estimated_done.store(0, Ordering::Relaxed);
    }

    /// Add a lane's unpublished counts and finished estimate.
    pub fn publish(&self, delta: &LaneStatistics, estimated_done: u64) {
        self.candidates
            .fetch_add(delta.get(Counters::Candidates), Ordering::Relaxed);
        self.pruned
            .fetch_add(delta.get(Counters::Pruned), Ordering::Relaxed);
        self.matches
            .fetch_add(delta.get(Counters::Matches), Ordering::Relaxed);
        for rejection in Rejection::iter() {
            self.rejections[rejection as usize]
                .fetch_add(delta.rejections(rejection), Ordering::Relaxed);
        }
        self.estimated_done
            .fetch_add(estimated_done, Ordering::Relaxed);
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn candidates(&self) -> u64 {
        self.candidates.load(Ordering::Relaxed)
    }

    pub fn pruned(&self) -> u64 {
        self.pruned.load(Ordering::Relaxed)
    }

    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn rejections(&self, rejection: Rejection) -> u64 {
        self.rejections[rejection as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            length: self.length.load(Ordering::Relaxed),
            candidates: self.candidates(),
            matches: self.matches(),
            estimated_total: self.estimated_total.load(Ordering::Relaxed),
            estimated_done: self.estimated_done.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_counters() {
        let mut stats = LaneStatistics::new();
        stats.increment(Counters::Candidates);
        stats.increment(Counters::Candidates);
        stats.reject(Rejection::OutputMismatch);
        stats.add(Counters::Pruned, 5);
        assert_eq!(stats.get(Counters::Candidates), 2);
        assert_eq!(stats.get(Counters::Pruned), 5);
        assert_eq!(stats.rejections(Rejection::OutputMismatch), 1);
        assert_eq!(stats.rejections(Rejection::TargetMismatch), 0);

        let taken = stats.take();
        assert_eq!(taken.get(Counters::Candidates), 2);
        assert_eq!(stats, LaneStatistics::new());

        stats.merge(&taken);
        stats.merge(&taken);
        assert_eq!(stats.get(Counters::Pruned), 10);
    }

    #[test]
    fn test_publish() {
        let progress = Progress::new();
        progress.begin_length(7, 100);
        let mut stats = LaneStatistics::new();
        stats.increment(Counters::Candidates);
        stats.increment(Counters::Matches);
        stats.reject(Rejection::StepBudgetExceeded);
        progress.publish(&stats, 25);
        progress.publish(&stats, 25);

        let snapshot = progress.snapshot();
        assert_eq!(snapshot.length, 7);
        assert_eq!(snapshot.candidates, 2);
        assert_eq!(snapshot.matches, 2);
        assert!((snapshot.completion() - 0.5).abs() < 1e-9);
        assert_eq!(progress.rejections(Rejection::StepBudgetExceeded), 2);
        assert!(!progress.is_cancelled());
        progress.cancel();
        assert!(progress.is_cancelled());
    }
}
