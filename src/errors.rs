// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Error types.
//!
//! [`Rejection`] is the pruning taxonomy: every way a candidate program can fail
//! is a value, never a panic. The remaining types are fatal configuration
//! errors reported once, before or outside the search loop.

use std::error::Error;
use std::fmt;
use strum_macros::{EnumCount as EnumCountMacro, EnumIter};

/// Why a candidate (or a composition while building the cache) was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCountMacro, EnumIter)]
#[repr(u8)]
pub enum Rejection {
    /// A composition left the fragment window.
    FragmentRejected,

    /// The pointer left the data region of the tape, or the input did not fit.
    CandidateInfeasible,

    /// A self-looped balanced block can never bring its cell to zero.
    LoopNonterminating,

    /// The step budget ran out.
    StepBudgetExceeded,

    /// An output marker produced the wrong byte, or more bytes than expected.
    OutputMismatch,

    /// The program finished, but the tape or the output does not match the target.
    TargetMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rejection::FragmentRejected => "fragment outside window",
            Rejection::CandidateInfeasible => "pointer outside tape",
            Rejection::LoopNonterminating => "loop never terminates",
            Rejection::StepBudgetExceeded => "step budget exceeded",
            Rejection::OutputMismatch => "output mismatch",
            Rejection::TargetMismatch => "target mismatch",
        };
        f.write_str(text)
    }
}

impl Error for Rejection {}

/// A source string could not be turned into a [`Fragment`](crate::Fragment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentError {
    UnknownSymbol { position: usize, symbol: char },
    OutsideWindow { position: usize },
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentError::UnknownSymbol { position, symbol } => {
                write!(f, "unknown symbol {:?} at position {}", symbol, position)
            }
            FragmentError::OutsideWindow { position } => {
                write!(f, "fragment leaves the window at position {}", position)
            }
        }
    }
}

impl Error for FragmentError {}

/// The fragment cache outgrew its configured entry limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    CapacityExceeded { limit: usize, length: usize },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::CapacityExceeded { limit, length } => write!(
                f,
                "fragment cache exceeded {} entries while building length {}",
                limit, length
            ),
        }
    }
}

impl Error for CacheError {}

/// A program length needs more block slots than the enumerator was sized for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError {
    pub length: usize,
    pub capacity: usize,
}

impl fmt::Display for CapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "program length {} needs {} block slots, capacity is {}",
            self.length,
            self.length + 1,
            self.capacity
        )
    }
}

impl Error for CapacityError {}

/// A program text could not be parsed into an executable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownSymbol { position: usize, symbol: char },
    UnmatchedRight { position: usize },
    UnclosedLeft { position: usize },
    BlockOutsideWindow { block: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnknownSymbol { position, symbol } => {
                write!(f, "unknown symbol {:?} at position {}", symbol, position)
            }
            ParseError::UnmatchedRight { position } => {
                write!(f, "']' at position {} has no matching '['", position)
            }
            ParseError::UnclosedLeft { position } => {
                write!(f, "'[' at position {} is never closed", position)
            }
            ParseError::BlockOutsideWindow { block } => {
                write!(f, "block {} does not fit the fragment window", block)
            }
        }
    }
}

impl Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::{EnumCount, IntoEnumIterator};

    #[test]
    fn test_rejection_indices_are_dense() {
        for (i, rejection) in Rejection::iter().enumerate() {
            assert_eq!(rejection as usize, i);
        }
        assert_eq!(Rejection::iter().count(), Rejection::COUNT);
    }

    #[test]
    fn test_capacity_error_message() {
        let error = CapacityError {
            length: 70,
            capacity: 64,
        };
        assert_eq!(
            error.to_string(),
            "program length 70 needs 71 block slots, capacity is 64"
        );
    }
}
