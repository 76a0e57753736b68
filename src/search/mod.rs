// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Multi-lane search for programs reproducing a set of input/output pairs.
//!
//! Lengths are searched in increasing order. Every length is split over
//! `lanes` threads, each owning a [`ProgramEnumerator`] over the shared
//! [`MemoizedData`]; all lanes of a length are joined before the next length
//! starts. Lanes publish counts to [`Progress`] every `progress_interval`
//! candidates and stop early once it is cancelled.

pub mod progress;

pub use progress::{Counters, LaneStatistics, Progress, ProgressSnapshot};

use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_PROGRESS_INTERVAL, VERIFY_STEP_BUDGET};
use crate::dialect::{Dialect, Mode};
use crate::enumerator::{EnumeratorOptions, ProgramEnumerator};
use crate::errors::{CapacityError, Rejection};
use crate::interpreter::Interpreter;
use crate::machine::OutputCursor;
use crate::memo::MemoizedData;
use crate::skeleton::Lane;

/// How the final tape is compared with an expected output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMatch {
    #[default]
    Exact,
    /// Only whether each cell is zero matters.
    ZeroNonzero,
    /// Cells equal the expected bytes times one multiplier shared by every
    /// pair (any of 1..=255 except 128).
    AnyMultiple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Cells at `final pointer + output_offset` after the program halts.
    Data(DataMatch),
    /// Bytes written by output markers.
    Output,
}

impl Target {
    pub fn for_mode(mode: Mode, data_match: DataMatch) -> Self {
        match mode {
            Mode::Data => Target::Data(data_match),
            Mode::Output => Target::Output,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoPair {
    pub input: Vec<u8>,
    /// Where the input starts, relative to the initial pointer.
    pub input_offset: isize,
    pub output: Vec<u8>,
    /// Where the expected data starts, relative to the final pointer.
    pub output_offset: isize,
}

impl IoPair {
    pub fn new(input: impl Into<Vec<u8>>, output: impl Into<Vec<u8>>) -> Self {
        IoPair {
            input: input.into(),
            output: output.into(),
            ..IoPair::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub pairs: Vec<IoPair>,
    pub target: Target,
    pub dialect: Dialect,
    pub enumerator: EnumeratorOptions,
    pub lanes: usize,
    pub min_length: usize,
    pub max_length: usize,
    /// Stop after the first length that has a match.
    pub stop_at_first: bool,
    pub progress_interval: u64,
    /// Re-run every match on the reference interpreter.
    pub verify: bool,
}

impl SearchPlan {
    /// One lane over lengths `1..=max_length`, matching data exactly or output.
    pub fn new(pairs: Vec<IoPair>, dialect: Dialect, max_length: usize) -> Self {
        SearchPlan {
            pairs,
            target: Target::for_mode(dialect.mode, DataMatch::Exact),
            dialect,
            enumerator: EnumeratorOptions::default(),
            lanes: 1,
            min_length: 1,
            max_length,
            stop_at_first: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            verify: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub length: usize,
    pub program: String,
    /// The multiplier found by [`DataMatch::AnyMultiple`].
    pub multiple: Option<u8>,
}

/// Compare `cells` with `expected`; for `AnyMultiple` an unset `multiple` is
/// chosen here and then shared by later pairs.
fn data_matches(kind: DataMatch, cells: &[u8], expected: &[u8], multiple: &mut Option<u8>) -> bool {
    let scaled = |m: u8| {
        cells
            .iter()
            .zip(expected)
            .all(|(&cell, &byte)| cell == byte.wrapping_mul(m))
    };
    match kind {
        DataMatch::Exact => cells == expected,
        DataMatch::ZeroNonzero => cells
            .iter()
            .zip(expected)
            .all(|(&cell, &byte)| (cell == 0) == (byte == 0)),
        DataMatch::AnyMultiple => match *multiple {
            Some(m) => scaled(m),
            None => {
                *multiple = (1..=255u8).filter(|&m| m != 128).find(|&m| scaled(m));
                multiple.is_some()
            }
        },
    }
}

fn output_matches(produced: &[u8], expected: &[u8], case_insensitive: bool) -> bool {
    if case_insensitive {
        produced.eq_ignore_ascii_case(expected)
    } else {
        produced == expected
    }
}

/// Run the enumerator's current candidate on every pair.
fn evaluate(
    enumerator: &mut ProgramEnumerator<'_>,
    plan: &SearchPlan,
) -> Result<Option<u8>, Rejection> {
    let mut multiple = None;
    for pair in &plan.pairs {
        match plan.target {
            Target::Output => {
                let mut cursor = OutputCursor::new(&pair.output);
                enumerator.execute(&pair.input, pair.input_offset, Some(&mut cursor))?;
                if !cursor.is_complete() {
                    return Err(Rejection::TargetMismatch);
                }
            }
            Target::Data(kind) => {
                enumerator.execute(&pair.input, pair.input_offset, None)?;
                let cells = enumerator
                    .machine()
                    .cells_at(pair.output_offset, pair.output.len())
                    .ok_or(Rejection::TargetMismatch)?;
                if !data_matches(kind, cells, &pair.output, &mut multiple) {
                    return Err(Rejection::TargetMismatch);
                }
            }
        }
    }
    Ok(multiple)
}

/// Check a match with the reference interpreter.
pub fn verify(plan: &SearchPlan, program: &str, multiple: Option<u8>) -> bool {
    plan.pairs.iter().all(|pair| {
        let mut interpreter = Interpreter::for_machine(plan.enumerator.machine, VERIFY_STEP_BUDGET);
        if plan.target == Target::Output && plan.dialect.after_output_irrelevant {
            interpreter = interpreter.stop_after_outputs(pair.output.len());
        }
        let Ok(execution) = interpreter.run(program, &pair.input, pair.input_offset) else {
            return false;
        };
        match plan.target {
            Target::Output => {
                output_matches(&execution.output, &pair.output, plan.dialect.case_insensitive)
            }
            Target::Data(kind) => {
                let mut multiple = multiple;
                execution
                    .cells_at(pair.output_offset, pair.output.len())
                    .is_some_and(|cells| data_matches(kind, cells, &pair.output, &mut multiple))
            }
        }
    })
}

struct Shared<'a, F> {
    memo: &'a MemoizedData,
    plan: &'a SearchPlan,
    progress: &'a Progress,
    found: Mutex<Vec<Match>>,
    on_match: Mutex<F>,
}

/// Counts of one lane, split into what is already in [`Progress`] and what is not.
#[derive(Default)]
struct LaneCounters {
    totals: LaneStatistics,
    unpublished: LaneStatistics,
    published_estimate: u64,
    published_pruned: u64,
}

impl LaneCounters {
    fn publish(&mut self, progress: &Progress, enumerator: &ProgramEnumerator<'_>) {
        let pruned = enumerator.pruned();
        self.unpublished
            .add(Counters::Pruned, pruned - self.published_pruned);
        self.published_pruned = pruned;
        let done = enumerator.completed_estimate();
        let delta = self.unpublished.take();
        progress.publish(&delta, done - self.published_estimate);
        self.published_estimate = done;
        self.totals.merge(&delta);
    }
}

fn run_lane<F: FnMut(&Match)>(
    shared: &Shared<'_, F>,
    length: usize,
    lane: Lane,
) -> Result<LaneStatistics, CapacityError> {
    let plan = shared.plan;
    let mut enumerator = ProgramEnumerator::new(shared.memo, plan.dialect, plan.enumerator);
    enumerator.start(length, lane)?;

    let mut counters = LaneCounters::default();
    let mut since_publish = 0u64;
    while enumerator.advance() {
        counters.unpublished.increment(Counters::Candidates);
        since_publish += 1;
        if since_publish >= plan.progress_interval {
            since_publish = 0;
            counters.publish(shared.progress, &enumerator);
            if shared.progress.is_cancelled() {
                debug!(length, lane = lane.offset(), "lane cancelled");
                break;
            }
        }

        let multiple = match evaluate(&mut enumerator, plan) {
            Ok(multiple) => multiple,
            Err(rejection) => {
                counters.unpublished.reject(rejection);
                continue;
            }
        };
        let program = enumerator.render_program();
        if plan.verify && !verify(plan, &program, multiple) {
            warn!(%program, "reference interpreter disagrees with tape machine");
            continue;
        }
        counters.unpublished.increment(Counters::Matches);
        let found = Match {
            length,
            program,
            multiple,
        };
        (&mut *shared.on_match.lock())(&found);
        shared.found.lock().push(found);
        if plan.stop_at_first {
            shared.progress.cancel();
        }
    }
    counters.publish(shared.progress, &enumerator);
    Ok(counters.totals)
}

/// Search every length of `plan`, calling `on_match` as matches are found.
///
/// Returns all matches sorted by length, then program text.
pub fn search<F>(
    memo: &MemoizedData,
    plan: &SearchPlan,
    progress: &Progress,
    on_match: F,
) -> Result<Vec<Match>, CapacityError>
where
    F: FnMut(&Match) + Send,
{
    let lanes = plan.lanes.max(1);
    let shared = Shared {
        memo,
        plan,
        progress,
        found: Mutex::new(Vec::new()),
        on_match: Mutex::new(on_match),
    };
    let sizer = ProgramEnumerator::new(memo, plan.dialect, plan.enumerator);

    for length in plan.min_length..=plan.max_length {
        if progress.is_cancelled() {
            break;
        }
        let started = Instant::now();
        let estimate = sizer.estimate_total_candidates(length)?;
        progress.begin_length(length, estimate);
        info!(length, estimate, lanes, "searching length");

        let results: Vec<Result<LaneStatistics, CapacityError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..lanes)
                .map(|offset| {
                    let shared = &shared;
                    scope.spawn(move || run_lane(shared, length, Lane::new(offset, lanes)))
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });
        let mut statistics = LaneStatistics::new();
        for result in results {
            statistics.merge(&result?);
        }

        let matches = statistics.get(Counters::Matches);
        info!(
            length,
            candidates = statistics.get(Counters::Candidates),
            pruned = statistics.get(Counters::Pruned),
            matches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "length finished"
        );
        for rejection in Rejection::iter() {
            debug!(length, %rejection, count = statistics.rejections(rejection), "rejections");
        }
        if plan.stop_at_first && matches > 0 {
            break;
        }
    }

    let mut found = shared.found.into_inner();
    found.sort_by(|a, b| (a.length, &a.program).cmp(&(b.length, &b.program)));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_matches() {
        let mut multiple = None;
        assert!(data_matches(DataMatch::Exact, &[1, 2], &[1, 2], &mut multiple));
        assert!(!data_matches(DataMatch::Exact, &[1, 3], &[1, 2], &mut multiple));
        assert!(data_matches(DataMatch::ZeroNonzero, &[0, 9], &[0, 2], &mut multiple));
        assert!(!data_matches(DataMatch::ZeroNonzero, &[1, 9], &[0, 2], &mut multiple));
        assert_eq!(multiple, None);

        assert!(data_matches(DataMatch::AnyMultiple, &[3, 6], &[1, 2], &mut multiple));
        assert_eq!(multiple, Some(3));
        assert!(!data_matches(DataMatch::AnyMultiple, &[2, 4], &[1, 2], &mut multiple));
        let mut fresh = None;
        // 128 is never used as a multiplier.
        assert!(!data_matches(DataMatch::AnyMultiple, &[128], &[1], &mut fresh));
    }

    #[test]
    fn test_output_matches() {
        assert!(output_matches(b"Hi", b"Hi", false));
        assert!(!output_matches(b"hi", b"Hi", false));
        assert!(output_matches(b"hi", b"Hi", true));
        assert!(!output_matches(b"H", b"Hi", true));
    }

    #[test]
    fn test_target_for_mode() {
        assert_eq!(
            Target::for_mode(Mode::Data, DataMatch::ZeroNonzero),
            Target::Data(DataMatch::ZeroNonzero)
        );
        assert_eq!(Target::for_mode(Mode::Output, DataMatch::Exact), Target::Output);
    }

    #[test]
    fn test_verify_rejects_wrong_program() {
        let plan = SearchPlan::new(vec![IoPair::new(vec![2], vec![4])], Dialect::data(), 4);
        assert!(verify(&plan, "++", None));
        assert!(!verify(&plan, "+", None));
        assert!(!verify(&plan, "+[-]", None));
    }
}
