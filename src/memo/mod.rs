// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Tier 1: MEMO data (immutable, precomputed).
//!
//! Built once, single-threaded, before any search lane starts, then shared by
//! reference across all lanes:
//! - [`FragmentCache`]: all minimal loop-free effects up to a length
//! - [`DivisorTable`]: iteration counts for self-looped balanced blocks

pub mod cache;
pub mod divisor;

pub use cache::{CacheEntry, CacheLimits, CacheStatistics, FragmentCache, SizeClass};
pub use divisor::DivisorTable;

use tracing::info;

use crate::errors::CacheError;

/// Immutable precomputed data shared by every search lane.
#[derive(Debug, Clone)]
pub struct MemoizedData {
    pub cache: FragmentCache,
    pub divisors: DivisorTable,
}

impl MemoizedData {
    pub fn new(limits: &CacheLimits) -> Result<Self, CacheError> {
        info!(
            max_fragment_length = limits.max_fragment_length,
            "initializing memo data"
        );
        let cache = FragmentCache::build(limits)?;
        let divisors = DivisorTable::new();
        Ok(MemoizedData { cache, divisors })
    }
}
