// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Brute-force synthesis of programs for a byte tape language.
//!
//! The language has 8-bit wrapping cells, a movable pointer, the primitives
//! `+ - > <`, bracket loops `[ ]` and, in the output dialect, an output marker
//! `.`. Given input/expected-output pairs, every program of a length is
//! enumerated and run, shortest lengths first.
//!
//! # Architecture
//!
//! The implementation uses a two-tier memory model:
//!
//! ## Tier 1: MEMO Data (Immutable)
//!
//! Precomputed once, single-threaded, then shared by reference by every lane:
//! - [`FragmentCache`] - every minimal loop-free effect up to a length,
//!   deduplicated, split into Balanced and Unbalanced classes
//! - [`DivisorTable`] - iteration counts for self-looped balanced blocks
//!
//! ## Tier 2: Lane Data (Mutable)
//!
//! Owned by one lane and mutated in place:
//! - [`SkeletonCursor`] - block-size compositions and marker assignments
//! - [`FragmentWalker`] - one per block, stepping through cache tuples
//! - [`TapeMachine`] - the tape the current candidate runs on
//!
//! # Search Algorithm
//!
//! A program is a skeleton (block sizes separated by `[`, `]`, `.`) whose
//! blocks are filled with loop-free fragments. Each block executes as a single
//! precomputed tape delta, and a loop whose body is one balanced block is
//! resolved with a table lookup instead of iterating. Blocks that were never
//! reached by a failed run are skipped over wholesale.
//!
//! # Parallelization
//!
//! Each length is split into lanes that take every `n`th block-size
//! composition. Lanes share nothing mutable except the atomics of
//! [`search::Progress`] and the list of matches.

pub mod config;
pub mod constants;
pub mod dialect;
pub mod enumerator;
pub mod errors;
pub mod fragment;
pub mod interpreter;
pub mod logging;
pub mod machine;
pub mod memo;
pub mod search;
pub mod skeleton;
pub mod walker;

// Re-export commonly used types
pub use dialect::{Dialect, Mode};
pub use enumerator::{Candidate, EnumeratorOptions, ProgramEnumerator};
pub use errors::{CacheError, CapacityError, FragmentError, ParseError, Rejection};
pub use fragment::{Fragment, Instruction};
pub use interpreter::{Execution, InterpretError, Interpreter};
pub use machine::{MachineLimits, OutputCursor, Program, ProgramImage, TapeMachine};
pub use memo::{CacheLimits, DivisorTable, FragmentCache, MemoizedData};
pub use skeleton::{Lane, Marker, Skeleton, SkeletonCursor};
pub use walker::FragmentWalker;
