// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The fragment cache: every distinct loop-free effect up to a maximum length.
//!
//! Entries are grouped by source length and by [`SizeClass`]. An effect is
//! stored once, at the shortest length that produces it, so the entries of
//! length `n` are exactly the effects whose minimal program has length `n`.
//!
//! # Algorithm
//!
//! - Length 0 holds the identity; length 1 holds `+ - > <`.
//! - Length `n ≥ 2` is built from shorter entries only: for each split
//!   `left + right = n` and each pair of classes, every left entry is composed
//!   with every right entry. Composites outside the window are dropped, and a
//!   composite already seen at any length is a duplicate.
//!
//! Any minimal sequence of length `n` splits into minimal prefix and suffix, so
//! no effect is missed.

use std::collections::HashSet;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::DEFAULT_MAX_FRAGMENT_LENGTH;
use crate::errors::CacheError;
use crate::fragment::{Fragment, Instruction};

/// Whether a fragment leaves the pointer where it started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Balanced,
    Unbalanced,
}

impl SizeClass {
    pub const ALL: [SizeClass; 2] = [SizeClass::Balanced, SizeClass::Unbalanced];

    pub fn of(fragment: &Fragment) -> Self {
        if fragment.is_balanced() {
            SizeClass::Balanced
        } else {
            SizeClass::Unbalanced
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// How large a cache to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheLimits {
    /// Longest source length stored.
    pub max_fragment_length: usize,
    /// Abort the build when the cache grows past this many entries.
    pub max_entries: Option<usize>,
}

impl Default for CacheLimits {
    fn default() -> Self {
        CacheLimits {
            max_fragment_length: DEFAULT_MAX_FRAGMENT_LENGTH,
            max_entries: None,
        }
    }
}

/// Counts gathered while building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    pub composed: u64,
    pub rejected: u64,
    pub duplicates: u64,
}

/// A view of one cache entry.
#[derive(Debug, Clone, Copy)]
pub struct CacheEntry<'c> {
    pub fragment: &'c Fragment,
    pub source: &'c str,
    pub class: SizeClass,
}

/// Entries of one class, in construction order.
#[derive(Debug, Clone)]
struct ClassTable {
    fragments: Vec<Fragment>,
    text: String,
    /// Entry `i` spans `text[text_offsets[i]..text_offsets[i + 1]]`.
    text_offsets: Vec<usize>,
    /// Entries of length `len` are `borders[len]..borders[len + 1]`.
    borders: Vec<usize>,
}

impl ClassTable {
    fn new() -> Self {
        ClassTable {
            fragments: Vec::new(),
            text: String::new(),
            text_offsets: vec![0],
            borders: vec![0],
        }
    }

    fn push(&mut self, fragment: Fragment, left: &str, right: &str) {
        self.fragments.push(fragment);
        self.text.push_str(left);
        self.text.push_str(right);
        self.text_offsets.push(self.text.len());
    }

    fn append(&mut self, other: ClassTable) {
        for (i, fragment) in other.fragments.iter().enumerate() {
            let source = &other.text[other.text_offsets[i]..other.text_offsets[i + 1]];
            self.push(*fragment, source, "");
        }
    }

    fn range(&self, length: usize) -> Range<usize> {
        match (self.borders.get(length), self.borders.get(length + 1)) {
            (Some(&start), Some(&end)) => start..end,
            _ => 0..0,
        }
    }

    fn source(&self, index: usize) -> &str {
        &self.text[self.text_offsets[index]..self.text_offsets[index + 1]]
    }
}

/// Deduplicated fragments indexed by length and class.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    max_fragment_length: usize,
    classes: [ClassTable; 2],
    statistics: CacheStatistics,
}

impl FragmentCache {
    /// Build the cache for all lengths up to `limits.max_fragment_length`.
    pub fn build(limits: &CacheLimits) -> Result<Self, CacheError> {
        let mut cache = FragmentCache {
            max_fragment_length: limits.max_fragment_length,
            classes: [ClassTable::new(), ClassTable::new()],
            statistics: CacheStatistics::default(),
        };
        let mut seen = HashSet::new();

        let mut fresh = [ClassTable::new(), ClassTable::new()];
        fresh[SizeClass::Balanced.index()].push(Fragment::IDENTITY, "", "");
        seen.insert(Fragment::IDENTITY);
        cache.close_length(0, fresh, limits)?;

        if limits.max_fragment_length >= 1 {
            let mut fresh = [ClassTable::new(), ClassTable::new()];
            for instruction in Instruction::ALL {
                let fragment = Fragment::from_instruction(instruction);
                seen.insert(fragment);
                let mut symbol = [0u8; 4];
                fresh[SizeClass::of(&fragment).index()]
                    .push(fragment, instruction.symbol().encode_utf8(&mut symbol), "");
            }
            cache.close_length(1, fresh, limits)?;
        }

        for length in 2..=limits.max_fragment_length {
            let fresh = cache.compose_length(length, &mut seen);
            cache.close_length(length, fresh, limits)?;
        }

        info!(
            entries = cache.len(),
            max_length = cache.max_fragment_length,
            composed = cache.statistics.composed,
            rejected = cache.statistics.rejected,
            duplicates = cache.statistics.duplicates,
            "fragment cache built"
        );
        Ok(cache)
    }

    fn compose_length(&mut self, length: usize, seen: &mut HashSet<Fragment>) -> [ClassTable; 2] {
        let mut fresh = [ClassTable::new(), ClassTable::new()];
        let mut statistics = self.statistics;
        for left_length in 1..length {
            let right_length = length - left_length;
            for left_class in SizeClass::ALL {
                for right_class in SizeClass::ALL {
                    let lefts = &self.classes[left_class.index()];
                    let rights = &self.classes[right_class.index()];
                    for li in lefts.range(left_length) {
                        let left = &lefts.fragments[li];
                        for ri in rights.range(right_length) {
                            statistics.composed += 1;
                            let Some(composite) = left.compose(&rights.fragments[ri]) else {
                                statistics.rejected += 1;
                                continue;
                            };
                            if !seen.insert(composite) {
                                statistics.duplicates += 1;
                                continue;
                            }
                            fresh[SizeClass::of(&composite).index()].push(
                                composite,
                                lefts.source(li),
                                rights.source(ri),
                            );
                        }
                    }
                }
            }
        }
        self.statistics = statistics;
        fresh
    }

    fn close_length(
        &mut self,
        length: usize,
        fresh: [ClassTable; 2],
        limits: &CacheLimits,
    ) -> Result<(), CacheError> {
        for (table, additions) in self.classes.iter_mut().zip(fresh) {
            table.append(additions);
            table.borders.push(table.fragments.len());
        }
        if let Some(limit) = limits.max_entries {
            if self.len() > limit {
                return Err(CacheError::CapacityExceeded { limit, length });
            }
        }
        debug!(
            length,
            balanced = self.count(SizeClass::Balanced, length),
            unbalanced = self.count(SizeClass::Unbalanced, length),
            "cache length complete"
        );
        Ok(())
    }

    pub fn max_fragment_length(&self) -> usize {
        self.max_fragment_length
    }

    /// Number of entries of one class with exactly `length` symbols.
    pub fn count(&self, class: SizeClass, length: usize) -> usize {
        self.classes[class.index()].range(length).len()
    }

    /// Number of entries of both classes with exactly `length` symbols.
    pub fn entry_count(&self, length: usize) -> usize {
        self.count(SizeClass::Balanced, length) + self.count(SizeClass::Unbalanced, length)
    }

    /// The `position`-th entry of `length`, Balanced entries first.
    ///
    /// # Panics
    ///
    /// Panics if `position >= self.entry_count(length)`.
    #[inline]
    pub fn entry(&self, length: usize, position: usize) -> CacheEntry<'_> {
        let balanced = self.count(SizeClass::Balanced, length);
        let (class, position) = if position < balanced {
            (SizeClass::Balanced, position)
        } else {
            (SizeClass::Unbalanced, position - balanced)
        };
        let table = &self.classes[class.index()];
        let range = table.range(length);
        debug_assert!(position < range.len(), "cache position out of range");
        let index = range.start + position;
        CacheEntry {
            fragment: &table.fragments[range][position],
            source: table.source(index),
            class,
        }
    }

    pub fn entries(&self, class: SizeClass, length: usize) -> impl Iterator<Item = CacheEntry<'_>> {
        let table = &self.classes[class.index()];
        table.range(length).map(move |index| CacheEntry {
            fragment: &table.fragments[index],
            source: table.source(index),
            class,
        })
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.classes.iter().map(|t| t.fragments.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_fragment_length: usize) -> FragmentCache {
        FragmentCache::build(&CacheLimits {
            max_fragment_length,
            max_entries: None,
        })
        .unwrap()
    }

    #[test]
    fn test_small_lengths() {
        let cache = cache(3);
        assert_eq!(cache.count(SizeClass::Balanced, 0), 1);
        assert_eq!(cache.count(SizeClass::Unbalanced, 0), 0);
        assert_eq!(cache.count(SizeClass::Balanced, 1), 2);
        assert_eq!(cache.count(SizeClass::Unbalanced, 1), 2);
        assert_eq!(cache.count(SizeClass::Balanced, 2), 2);
        assert_eq!(cache.count(SizeClass::Unbalanced, 2), 10);
        assert_eq!(cache.count(SizeClass::Balanced, 3), 6);
        assert_eq!(cache.count(SizeClass::Balanced, 4), 0);
    }

    #[test]
    fn test_seed_order() {
        let cache = cache(1);
        let sources: Vec<_> = (0..cache.entry_count(1))
            .map(|p| cache.entry(1, p).source)
            .collect();
        assert_eq!(sources, vec!["+", "-", ">", "<"]);
        assert!(cache.entry(0, 0).fragment.is_identity());
    }

    #[test]
    fn test_sources_match_fragments() {
        let cache = cache(5);
        for length in 0..=5 {
            for class in SizeClass::ALL {
                for entry in cache.entries(class, length) {
                    assert_eq!(entry.source.len(), length);
                    assert_eq!(&Fragment::from_source(entry.source).unwrap(), entry.fragment);
                    assert_eq!(SizeClass::of(entry.fragment), class);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_entry_past_length_panics() {
        // Position 4 of length 1 would otherwise land on a length-2 entry.
        let cache = cache(3);
        let _ = cache.entry(1, 4);
    }

    #[test]
    fn test_entry_limit() {
        let result = FragmentCache::build(&CacheLimits {
            max_fragment_length: 6,
            max_entries: Some(100),
        });
        assert!(matches!(result, Err(CacheError::CapacityExceeded { limit: 100, .. })));
    }

    #[test]
    fn test_statistics() {
        let cache = cache(2);
        let statistics = cache.statistics();
        assert_eq!(statistics.composed, 16);
        assert_eq!(statistics.rejected, 0);
        assert_eq!(statistics.duplicates, 4);
    }
}
