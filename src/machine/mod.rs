// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Executing programs block by block.
//!
//! The tape machine never interprets single instructions: each block is one
//! precomputed [`Fragment`] added to the tape in a single step, followed by a
//! jump chosen by the current cell.
//!
//! # Loop shortcut
//!
//! A block that jumps back to itself (`[B]` with `B` loop-free) and is balanced
//! changes its own cell by the same amount `k` on every iteration. The number of
//! iterations is looked up in the [`DivisorTable`] and the body is applied that
//! many times at once; a cell that never reaches zero makes the candidate fail
//! with [`Rejection::LoopNonterminating`] instead of spinning until the budget
//! runs out.

mod image;

pub use image::ProgramImage;

use serde::{Deserialize, Serialize};

use crate::constants::{tape_origin, DEFAULT_DATA_WIDTH, DEFAULT_STEP_BUDGET, TAPE_MARGIN};
use crate::dialect::Dialect;
use crate::errors::Rejection;
use crate::fragment::Fragment;
use crate::memo::DivisorTable;
use crate::skeleton::{Marker, Skeleton};

/// Something the tape machine can run.
pub trait Program {
    fn skeleton(&self) -> &Skeleton;

    /// The effect of block `index`; `None` when it does not fit the window.
    fn block(&self, index: usize) -> Option<&Fragment>;

    /// Source text.
    fn render(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineLimits {
    /// Cells the pointer may visit.
    pub data_width: usize,
    /// Block executions before a run is abandoned.
    pub step_budget: usize,
}

impl Default for MachineLimits {
    fn default() -> Self {
        MachineLimits {
            data_width: DEFAULT_DATA_WIDTH,
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }
}

/// Progress through an expected output.
#[derive(Debug, Clone)]
pub struct OutputCursor<'a> {
    expected: &'a [u8],
    position: usize,
}

impl<'a> OutputCursor<'a> {
    pub fn new(expected: &'a [u8]) -> Self {
        OutputCursor {
            expected,
            position: 0,
        }
    }

    /// Number of expected bytes produced so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn expected(&self) -> &'a [u8] {
        self.expected
    }

    pub fn is_complete(&self) -> bool {
        self.position == self.expected.len()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    fn accept(&mut self, byte: u8, case_insensitive: bool) -> Result<(), Rejection> {
        let Some(&wanted) = self.expected.get(self.position) else {
            return Err(Rejection::OutputMismatch);
        };
        let matches = if case_insensitive {
            byte.eq_ignore_ascii_case(&wanted)
        } else {
            byte == wanted
        };
        if !matches {
            return Err(Rejection::OutputMismatch);
        }
        self.position += 1;
        Ok(())
    }
}

/// A bounded tape with guard margins, reused across runs.
#[derive(Debug, Clone)]
pub struct TapeMachine {
    limits: MachineLimits,
    after_output_irrelevant: bool,
    case_insensitive: bool,
    tape: Vec<u8>,
    pointer: usize,
    furthest_block: usize,
    steps: usize,
}

impl TapeMachine {
    pub fn new(limits: MachineLimits, dialect: &Dialect) -> Self {
        TapeMachine {
            limits,
            after_output_irrelevant: dialect.after_output_irrelevant,
            case_insensitive: dialect.case_insensitive,
            tape: vec![0; limits.data_width + 2 * TAPE_MARGIN],
            pointer: tape_origin(limits.data_width),
            furthest_block: 0,
            steps: 0,
        }
    }

    pub fn limits(&self) -> MachineLimits {
        self.limits
    }

    /// Where the pointer starts, as an index into [`tape`](Self::tape).
    pub fn origin(&self) -> usize {
        tape_origin(self.limits.data_width)
    }

    /// Run `program` on a fresh tape holding `input` at `origin + input_offset`.
    ///
    /// Output markers are checked against `output` when it is given.
    pub fn run<P: Program + ?Sized>(
        &mut self,
        program: &P,
        divisors: &DivisorTable,
        input: &[u8],
        input_offset: isize,
        mut output: Option<&mut OutputCursor<'_>>,
    ) -> Result<(), Rejection> {
        self.tape.fill(0);
        self.pointer = self.origin();
        self.furthest_block = 0;
        self.steps = 0;
        if let Some(cursor) = output.as_deref_mut() {
            cursor.reset();
        }
        let input_start = self
            .origin()
            .checked_add_signed(input_offset)
            .filter(|start| start + input.len() <= self.tape.len())
            .ok_or(Rejection::CandidateInfeasible)?;
        self.tape[input_start..input_start + input.len()].copy_from_slice(input);

        let skeleton = program.skeleton();
        let block_count = skeleton.block_count();
        let low = TAPE_MARGIN as isize;
        let high = (TAPE_MARGIN + self.limits.data_width) as isize;
        let mut block = 0;
        loop {
            if block >= block_count {
                return Ok(());
            }
            if self.steps == self.limits.step_budget {
                return Err(Rejection::StepBudgetExceeded);
            }
            self.steps += 1;
            let fragment = program.block(block).ok_or(Rejection::FragmentRejected)?;
            let jump = skeleton.jump(block);

            if jump.nonzero == block && fragment.is_balanced() {
                let value = self.tape[self.pointer];
                if value != 0 {
                    let step = fragment.center();
                    let times = divisors
                        .get(value, step)
                        .ok_or(Rejection::LoopNonterminating)?;
                    let size = skeleton.block_size(block);
                    if size == step as usize || size == 256 - step as usize {
                        self.tape[self.pointer] = 0;
                    } else {
                        fragment.add_scaled_to(&mut self.tape, self.pointer, times);
                    }
                }
                block = jump.zero;
                self.furthest_block = self.furthest_block.max(block);
                continue;
            }

            let next = self.pointer as isize + fragment.pointer_delta() as isize;
            if next < low || next >= high {
                return Err(Rejection::CandidateInfeasible);
            }
            fragment.add_to(&mut self.tape, self.pointer);
            self.pointer = next as usize;

            if skeleton.marker_after(block) == Marker::Output {
                if let Some(cursor) = output.as_deref_mut() {
                    cursor.accept(self.tape[self.pointer], self.case_insensitive)?;
                    if self.after_output_irrelevant && cursor.is_complete() {
                        return Ok(());
                    }
                }
            }

            block = if self.tape[self.pointer] == 0 {
                jump.zero
            } else {
                jump.nonzero
            };
            self.furthest_block = self.furthest_block.max(block);
        }
    }

    /// Highest block index reached by the last run.
    pub fn furthest_block(&self) -> usize {
        self.furthest_block
    }

    /// Blocks executed by the last run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// The whole buffer, margins included.
    pub fn tape(&self) -> &[u8] {
        &self.tape
    }

    /// The cells the pointer may visit.
    pub fn data_window(&self) -> &[u8] {
        &self.tape[TAPE_MARGIN..TAPE_MARGIN + self.limits.data_width]
    }

    /// `len` cells starting `offset` cells from the pointer.
    pub fn cells_at(&self, offset: isize, len: usize) -> Option<&[u8]> {
        let start = self.pointer.checked_add_signed(offset)?;
        self.tape.get(start..start.checked_add(len)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(source: &str, input: &[u8], limits: MachineLimits) -> (Result<(), Rejection>, TapeMachine) {
        let program = ProgramImage::parse(source).unwrap();
        let divisors = DivisorTable::new();
        let mut machine = TapeMachine::new(limits, &Dialect::data());
        let result = machine.run(&program, &divisors, input, 0, None);
        (result, machine)
    }

    #[test]
    fn test_linear_program() {
        let (result, machine) = run("+++>--", &[], MachineLimits::default());
        assert_eq!(result, Ok(()));
        assert_eq!(machine.pointer(), machine.origin() + 1);
        assert_eq!(machine.cells_at(-1, 2), Some(&[3u8, 254][..]));
        assert_eq!(machine.steps(), 1);
    }

    #[test]
    fn test_self_loop_uses_divisor_table() {
        let (result, machine) = run("-[------->+<]>-", &[], MachineLimits::default());
        assert_eq!(result, Ok(()));
        assert_eq!(machine.cells_at(0, 1), Some(&[72u8][..]));
        assert_eq!(machine.cells_at(-1, 1), Some(&[0u8][..]));
        assert_eq!(machine.steps(), 3);
    }

    #[test]
    fn test_shortcut_beats_step_budget() {
        // 73 iterations, far beyond a budget of 4.
        let limits = MachineLimits {
            step_budget: 4,
            ..MachineLimits::default()
        };
        let (result, machine) = run("-[------->+<]>-", &[], limits);
        assert_eq!(result, Ok(()));
        assert_eq!(machine.cells_at(0, 1), Some(&[72u8][..]));
    }

    #[test]
    fn test_exact_clear() {
        let (result, machine) = run("[+]>+", &[200], MachineLimits::default());
        assert_eq!(result, Ok(()));
        assert_eq!(machine.cells_at(-1, 2), Some(&[0u8, 1][..]));
    }

    #[test]
    fn test_nonterminating_loop() {
        let (result, _) = run("+[--]", &[], MachineLimits::default());
        assert_eq!(result, Err(Rejection::LoopNonterminating));
        let (result, _) = run("+[>+<]", &[], MachineLimits::default());
        assert_eq!(result, Err(Rejection::LoopNonterminating));
    }

    #[test]
    fn test_zero_cell_skips_loop() {
        let (result, machine) = run("[--]+", &[], MachineLimits::default());
        assert_eq!(result, Ok(()));
        assert_eq!(machine.cells_at(0, 1), Some(&[1u8][..]));
    }

    #[test]
    fn test_step_budget() {
        let limits = MachineLimits {
            step_budget: 10,
            ..MachineLimits::default()
        };
        let (result, machine) = run("+[>+]", &[], limits);
        assert_eq!(result, Err(Rejection::StepBudgetExceeded));
        assert_eq!(machine.steps(), 10);
    }

    #[test]
    fn test_pointer_leaves_tape() {
        let limits = MachineLimits {
            data_width: 4,
            ..MachineLimits::default()
        };
        let (result, _) = run("<<", &[], limits);
        assert_eq!(result, Err(Rejection::CandidateInfeasible));
        let (result, _) = run("<", &[], limits);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_even_width_leaves_more_room_to_the_right() {
        let limits = MachineLimits {
            data_width: 6,
            ..MachineLimits::default()
        };
        for (source, fits) in [("<<", true), ("<<<", false), (">>>", true), (">>>>", false)] {
            let (result, _) = run(source, &[], limits);
            assert_eq!(result.is_ok(), fits, "{}", source);
        }
        let (result, machine) = run(">>>", &[], limits);
        assert_eq!(result, Ok(()));
        assert_eq!(machine.pointer(), TAPE_MARGIN + 5);
    }

    #[test]
    fn test_input_must_fit() {
        let program = ProgramImage::parse("+").unwrap();
        let divisors = DivisorTable::new();
        let limits = MachineLimits {
            data_width: 4,
            ..MachineLimits::default()
        };
        let mut machine = TapeMachine::new(limits, &Dialect::data());
        let input = [1u8; 64];
        assert_eq!(
            machine.run(&program, &divisors, &input, 0, None),
            Err(Rejection::CandidateInfeasible)
        );
        assert_eq!(
            machine.run(&program, &divisors, &[5], -1, None),
            Ok(())
        );
        assert_eq!(machine.cells_at(-1, 2), Some(&[5u8, 1][..]));
    }

    #[test]
    fn test_output_markers() {
        let program = ProgramImage::parse("++++++++[>+++++++++<-]>.").unwrap();
        let divisors = DivisorTable::new();
        let mut machine = TapeMachine::new(MachineLimits::default(), &Dialect::output());

        let mut cursor = OutputCursor::new(b"H");
        assert_eq!(machine.run(&program, &divisors, &[], 0, Some(&mut cursor)), Ok(()));
        assert!(cursor.is_complete());

        let mut cursor = OutputCursor::new(b"I");
        assert_eq!(
            machine.run(&program, &divisors, &[], 0, Some(&mut cursor)),
            Err(Rejection::OutputMismatch)
        );
        assert_eq!(cursor.position(), 0);

        let mut cursor = OutputCursor::new(b"");
        assert_eq!(
            machine.run(&program, &divisors, &[], 0, Some(&mut cursor)),
            Err(Rejection::OutputMismatch)
        );
    }

    #[test]
    fn test_after_output_irrelevant() {
        let program = ProgramImage::parse("+.+[>+]").unwrap();
        let divisors = DivisorTable::new();
        let mut cursor = OutputCursor::new(&[1]);

        let mut machine = TapeMachine::new(MachineLimits::default(), &Dialect::output());
        assert_eq!(machine.run(&program, &divisors, &[], 0, Some(&mut cursor)), Ok(()));

        let strict = Dialect {
            after_output_irrelevant: false,
            ..Dialect::output()
        };
        let mut machine = TapeMachine::new(MachineLimits::default(), &strict);
        assert!(machine.run(&program, &divisors, &[], 0, Some(&mut cursor)).is_err());
        assert!(cursor.is_complete());
    }

    #[test]
    fn test_case_insensitive_output() {
        let source = format!("{}.", "+".repeat(65));
        let program = ProgramImage::parse(&source).unwrap();
        let divisors = DivisorTable::new();
        let mut cursor = OutputCursor::new(b"a");

        let mut machine = TapeMachine::new(MachineLimits::default(), &Dialect::output());
        assert_eq!(
            machine.run(&program, &divisors, &[], 0, Some(&mut cursor)),
            Err(Rejection::OutputMismatch)
        );

        let relaxed = Dialect {
            case_insensitive: true,
            ..Dialect::output()
        };
        let mut machine = TapeMachine::new(MachineLimits::default(), &relaxed);
        assert_eq!(machine.run(&program, &divisors, &[], 0, Some(&mut cursor)), Ok(()));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let program = ProgramImage::parse(">[<++>-]<[>+++<-]>").unwrap();
        let divisors = DivisorTable::new();
        let mut first = TapeMachine::new(MachineLimits::default(), &Dialect::data());
        let mut second = TapeMachine::new(MachineLimits::default(), &Dialect::data());
        let a = first.run(&program, &divisors, &[3, 4], 0, None);
        let b = second.run(&program, &divisors, &[3, 4], 0, None);
        let c = first.run(&program, &divisors, &[3, 4], 0, None);
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(first.tape(), second.tape());
        assert_eq!(first.pointer(), second.pointer());
        assert_eq!(first.cells_at(0, 1), Some(&[33u8][..]));
    }

    #[test]
    fn test_furthest_block() {
        let program = ProgramImage::parse("+[>+]<<").unwrap();
        let divisors = DivisorTable::new();
        let limits = MachineLimits {
            step_budget: 5,
            ..MachineLimits::default()
        };
        let mut machine = TapeMachine::new(limits, &Dialect::data());
        assert!(machine.run(&program, &divisors, &[], 0, None).is_err());
        assert_eq!(machine.furthest_block(), 1);
    }
}
