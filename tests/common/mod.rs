// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use bf_brute::{
    CacheLimits, Dialect, EnumeratorOptions, Lane, MemoizedData, Program, ProgramEnumerator,
};

/// Memo data with a small cache, cheap enough for every test to build.
pub fn memo(max_fragment_length: usize) -> MemoizedData {
    MemoizedData::new(&CacheLimits {
        max_fragment_length,
        max_entries: None,
    })
    .expect("cache build")
}

/// Every program one lane yields for `length`.
pub fn programs(
    memo: &MemoizedData,
    dialect: Dialect,
    options: EnumeratorOptions,
    length: usize,
    lane: Lane,
) -> Vec<String> {
    let mut enumerator = ProgramEnumerator::new(memo, dialect, options);
    enumerator.start(length, lane).expect("capacity");
    let mut out = Vec::new();
    while let Some(candidate) = enumerator.step() {
        out.push(candidate.render());
    }
    out
}

/// Programs of `length` that run to completion on `input`, with the cell under
/// the final pointer.
pub fn successful_runs(
    memo: &MemoizedData,
    dialect: Dialect,
    options: EnumeratorOptions,
    length: usize,
    input: &[u8],
) -> Vec<(String, u8)> {
    let mut enumerator = ProgramEnumerator::new(memo, dialect, options);
    enumerator.start(length, Lane::SINGLE).expect("capacity");
    let mut out = Vec::new();
    while enumerator.advance() {
        if enumerator.execute(input, 0, None).is_ok() {
            let cell = enumerator.machine().cells_at(0, 1).expect("pointer on tape")[0];
            out.push((enumerator.render_program(), cell));
        }
    }
    out
}

/// Bracket nesting check for rendered programs.
pub fn well_formed(program: &str) -> bool {
    let mut depth = 0usize;
    for symbol in program.chars() {
        match symbol {
            '[' => depth += 1,
            ']' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0 && !program.contains("[]")
}
