// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Compile-time constants for fragments and the tape.
//!
//! The fragment window is fixed at compile time so that a [`Fragment`](crate::Fragment)
//! is a plain `Copy` value. Everything else (tape width, step budget, cache depth)
//! is a runtime setting with the defaults below.

/// Number of cells a fragment can describe.
///
/// Cell index `i` of a fragment holds the change applied at offset
/// `i - WINDOW_HALF` from the pointer position before the fragment ran.
pub const FRAGMENT_WINDOW: usize = 32;

/// Offset of the center cell inside the window.
pub const WINDOW_HALF: usize = FRAGMENT_WINDOW / 2;

/// Smallest offset a fragment can touch (inclusive).
pub const WINDOW_LOW: i32 = -(WINDOW_HALF as i32);

/// Largest offset a fragment can touch (exclusive).
pub const WINDOW_HIGH: i32 = (FRAGMENT_WINDOW - WINDOW_HALF) as i32;

/// Guard cells on either side of the data region of a tape.
///
/// A fragment applied anywhere inside the data region stays inside the buffer.
pub const TAPE_MARGIN: usize = WINDOW_HALF;

/// Buffer index where the pointer starts on a tape with `data_width` data cells.
///
/// For an even width the extra cell lies to the right of the start.
pub const fn tape_origin(data_width: usize) -> usize {
    TAPE_MARGIN + data_width.saturating_sub(1) / 2
}

/// Default width of the data region of a tape.
pub const DEFAULT_DATA_WIDTH: usize = 400;

/// Default number of block executions before a candidate is abandoned.
pub const DEFAULT_STEP_BUDGET: usize = 10_000;

/// Default longest fragment stored in the cache.
pub const DEFAULT_MAX_FRAGMENT_LENGTH: usize = 12;

/// Default number of block slots a skeleton may use.
///
/// A program of length `L` can need up to `L + 1` blocks.
pub const DEFAULT_SLOT_CAPACITY: usize = 64;

/// Default number of candidates between progress publications.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// Instruction budget of the reference interpreter when it re-checks a match.
pub const VERIFY_STEP_BUDGET: usize = 50_000_000;
