// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Literal, instruction-at-a-time interpreter.
//!
//! Used to double-check matches found by the tape machine, and by tests to
//! confirm that the loop shortcut agrees with plain execution. The tape has the
//! same geometry as a [`TapeMachine`](crate::TapeMachine) with the same limits,
//! so final tapes can be compared index for index.

use std::error::Error;
use std::fmt;

use crate::constants::{tape_origin, TAPE_MARGIN};
use crate::errors::ParseError;
use crate::machine::MachineLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Increment,
    Decrement,
    Right,
    Left,
    /// Jump past the matching `Close` when the cell is zero.
    Open(usize),
    /// Jump back after the matching `Open` when the cell is non-zero.
    Close(usize),
    Output,
}

fn compile(source: &str) -> Result<Vec<Op>, ParseError> {
    let mut ops = Vec::with_capacity(source.len());
    let mut open = Vec::new();
    for (position, symbol) in source.char_indices() {
        let op = match symbol {
            '+' => Op::Increment,
            '-' => Op::Decrement,
            '>' => Op::Right,
            '<' => Op::Left,
            '.' => Op::Output,
            '[' => {
                open.push((ops.len(), position));
                Op::Open(0)
            }
            ']' => {
                let (start, _) = open
                    .pop()
                    .ok_or(ParseError::UnmatchedRight { position })?;
                ops[start] = Op::Open(ops.len() + 1);
                Op::Close(start + 1)
            }
            _ => return Err(ParseError::UnknownSymbol { position, symbol }),
        };
        ops.push(op);
    }
    if let Some(&(_, position)) = open.last() {
        return Err(ParseError::UnclosedLeft { position });
    }
    Ok(ops)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    Parse(ParseError),
    PointerOutOfTape { step: usize },
    StepBudgetExceeded,
    InputDoesNotFit,
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpretError::Parse(error) => write!(f, "parse error: {}", error),
            InterpretError::PointerOutOfTape { step } => {
                write!(f, "pointer left the tape at step {}", step)
            }
            InterpretError::StepBudgetExceeded => write!(f, "step budget exceeded"),
            InterpretError::InputDoesNotFit => write!(f, "input does not fit the tape"),
        }
    }
}

impl Error for InterpretError {}

impl From<ParseError> for InterpretError {
    fn from(error: ParseError) -> Self {
        InterpretError::Parse(error)
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub tape: Vec<u8>,
    pub pointer: usize,
    pub output: Vec<u8>,
    pub steps: usize,
}

impl Execution {
    /// `len` cells starting `offset` cells from the final pointer.
    pub fn cells_at(&self, offset: isize, len: usize) -> Option<&[u8]> {
        let start = self.pointer.checked_add_signed(offset)?;
        self.tape.get(start..start.checked_add(len)?)
    }
}

#[derive(Debug, Clone)]
pub struct Interpreter {
    data_width: usize,
    step_budget: usize,
    stop_after_outputs: Option<usize>,
}

impl Interpreter {
    /// `step_budget` counts single instructions.
    pub fn new(data_width: usize, step_budget: usize) -> Self {
        Interpreter {
            data_width,
            step_budget,
            stop_after_outputs: None,
        }
    }

    /// Same tape geometry as a tape machine with `limits`.
    pub fn for_machine(limits: MachineLimits, step_budget: usize) -> Self {
        Interpreter::new(limits.data_width, step_budget)
    }

    /// Finish as soon as `count` bytes have been written.
    pub fn stop_after_outputs(mut self, count: usize) -> Self {
        self.stop_after_outputs = Some(count);
        self
    }

    pub fn origin(&self) -> usize {
        tape_origin(self.data_width)
    }

    pub fn run(
        &self,
        source: &str,
        input: &[u8],
        input_offset: isize,
    ) -> Result<Execution, InterpretError> {
        let ops = compile(source)?;
        let mut tape = vec![0u8; self.data_width + 2 * TAPE_MARGIN];
        let start = self
            .origin()
            .checked_add_signed(input_offset)
            .filter(|start| start + input.len() <= tape.len())
            .ok_or(InterpretError::InputDoesNotFit)?;
        tape[start..start + input.len()].copy_from_slice(input);

        let mut pointer = self.origin();
        let mut output = Vec::new();
        let mut pc = 0;
        let mut steps = 0;
        while pc < ops.len() {
            if self.stop_after_outputs.is_some_and(|count| output.len() >= count) {
                break;
            }
            if steps == self.step_budget {
                return Err(InterpretError::StepBudgetExceeded);
            }
            steps += 1;
            pc = match ops[pc] {
                Op::Increment => {
                    tape[pointer] = tape[pointer].wrapping_add(1);
                    pc + 1
                }
                Op::Decrement => {
                    tape[pointer] = tape[pointer].wrapping_sub(1);
                    pc + 1
                }
                Op::Right => {
                    pointer += 1;
                    if pointer >= tape.len() {
                        return Err(InterpretError::PointerOutOfTape { step: steps });
                    }
                    pc + 1
                }
                Op::Left => {
                    pointer = pointer
                        .checked_sub(1)
                        .ok_or(InterpretError::PointerOutOfTape { step: steps })?;
                    pc + 1
                }
                Op::Open(after) => {
                    if tape[pointer] == 0 {
                        after
                    } else {
                        pc + 1
                    }
                }
                Op::Close(body) => {
                    if tape[pointer] != 0 {
                        body
                    } else {
                        pc + 1
                    }
                }
                Op::Output => {
                    output.push(tape[pointer]);
                    pc + 1
                }
            };
        }
        Ok(Execution {
            tape,
            pointer,
            output,
            steps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpreter() -> Interpreter {
        Interpreter::new(400, 100_000)
    }

    #[test]
    fn test_hello_letter() {
        let execution = interpreter()
            .run("++++++++[>+++++++++<-]>.", &[], 0)
            .unwrap();
        assert_eq!(execution.output, b"H");
        assert_eq!(execution.cells_at(0, 1), Some(&[72u8][..]));
    }

    #[test]
    fn test_input_and_nested_loops() {
        let execution = interpreter().run(">[<++>-]<[>+++<-]>", &[3, 4], 0).unwrap();
        assert_eq!(execution.cells_at(0, 1), Some(&[33u8][..]));
        assert_eq!(execution.cells_at(-1, 1), Some(&[0u8][..]));
    }

    #[test]
    fn test_budget_and_bounds() {
        assert_eq!(
            interpreter().run("+[]", &[], 0),
            Err(InterpretError::StepBudgetExceeded)
        );
        let tiny = Interpreter::new(0, 1_000);
        assert!(matches!(
            tiny.run("+[<+]", &[], 0),
            Err(InterpretError::PointerOutOfTape { .. })
        ));
    }

    #[test]
    fn test_origin_matches_tape_machine() {
        for width in [0, 1, 6, 7, 400] {
            let limits = crate::MachineLimits {
                data_width: width,
                ..crate::MachineLimits::default()
            };
            let machine = crate::TapeMachine::new(limits, &crate::Dialect::data());
            assert_eq!(Interpreter::for_machine(limits, 10).origin(), machine.origin());
        }
        assert_eq!(Interpreter::new(400, 10).origin(), TAPE_MARGIN + 199);
    }

    #[test]
    fn test_stop_after_outputs() {
        let execution = interpreter()
            .stop_after_outputs(1)
            .run("+.+[>+]", &[], 0)
            .unwrap();
        assert_eq!(execution.output, vec![1]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            interpreter().run("]", &[], 0),
            Err(InterpretError::Parse(ParseError::UnmatchedRight { position: 0 }))
        );
    }
}
