// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Walking all loop-free blocks of an exact length.
//!
//! A block longer than the cache's maximum fragment length `M` is split into
//! chunks: the text-last chunk (chunk 0) takes the remainder `(L - 1) % M + 1`
//! and every other chunk has length `M`. The walker is an odometer over the
//! cache entries of each chunk's length, chunk 0 cycling fastest, Balanced
//! entries before Unbalanced ones.
//!
//! `composites[i]` holds the net effect of the text from the first chunk up to
//! and including chunk `i`, so a step that changes chunk `j` only recomposes
//! `composites[j..=0]`.

use crate::fragment::Fragment;
use crate::memo::FragmentCache;

#[derive(Debug, Clone, Copy)]
struct Chunk {
    length: usize,
    position: usize,
    count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkerState {
    Fresh,
    Running,
    Exhausted,
}

/// Number of chunks and length of chunk 0 for a block of `length`.
fn layout(length: usize, max_fragment_length: usize) -> (usize, usize) {
    if length == 0 || max_fragment_length == 0 {
        (1, length)
    } else {
        (
            (length - 1) / max_fragment_length + 1,
            (length - 1) % max_fragment_length + 1,
        )
    }
}

/// Length-exact odometer over tuples of cache entries.
#[derive(Debug, Clone)]
pub struct FragmentWalker<'c> {
    cache: &'c FragmentCache,
    length: usize,
    chunks: Vec<Chunk>,
    composites: Vec<Option<Fragment>>,
    state: WalkerState,
}

impl<'c> FragmentWalker<'c> {
    pub fn new(cache: &'c FragmentCache) -> Self {
        let mut walker = FragmentWalker {
            cache,
            length: 0,
            chunks: Vec::new(),
            composites: Vec::new(),
            state: WalkerState::Fresh,
        };
        walker.start(0);
        walker
    }

    /// Reset to the first tuple of blocks of `length`; the next [`advance`](Self::advance) yields it.
    pub fn start(&mut self, length: usize) {
        let max = self.cache.max_fragment_length();
        let (chunk_count, tail) = layout(length, max);
        self.length = length;
        self.chunks.clear();
        self.composites.clear();
        for i in 0..chunk_count {
            let chunk_length = if i == 0 { tail } else { max };
            self.chunks.push(Chunk {
                length: chunk_length,
                position: 0,
                count: self.cache.entry_count(chunk_length),
            });
            self.composites.push(None);
        }
        self.state = WalkerState::Fresh;
    }

    /// Move to the next tuple; `false` once every tuple has been visited.
    pub fn advance(&mut self) -> bool {
        let changed = match self.state {
            WalkerState::Exhausted => return false,
            WalkerState::Fresh => {
                if self.chunks.iter().any(|chunk| chunk.count == 0) {
                    self.state = WalkerState::Exhausted;
                    return false;
                }
                self.state = WalkerState::Running;
                self.chunks.len() - 1
            }
            WalkerState::Running => {
                let mut changed = None;
                for (i, chunk) in self.chunks.iter_mut().enumerate() {
                    chunk.position += 1;
                    if chunk.position < chunk.count {
                        changed = Some(i);
                        break;
                    }
                    chunk.position = 0;
                }
                match changed {
                    Some(i) => i,
                    None => {
                        self.state = WalkerState::Exhausted;
                        return false;
                    }
                }
            }
        };
        self.recompose(changed);
        true
    }

    fn recompose(&mut self, changed: usize) {
        let top = self.chunks.len() - 1;
        for i in (0..=changed).rev() {
            let chunk = self.chunks[i];
            let fragment = self.cache.entry(chunk.length, chunk.position).fragment;
            self.composites[i] = if i == top {
                Some(*fragment)
            } else {
                self.composites[i + 1].and_then(|prefix| prefix.compose(fragment))
            };
        }
    }

    /// Net effect of the current tuple, `None` if it does not fit the window.
    #[inline]
    pub fn current(&self) -> Option<&Fragment> {
        self.composites.first().and_then(Option::as_ref)
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Append the source text of the current tuple.
    pub fn render_into(&self, out: &mut String) {
        for chunk in self.chunks.iter().rev() {
            out.push_str(self.cache.entry(chunk.length, chunk.position).source);
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.length);
        self.render_into(&mut out);
        out
    }

    /// Number of tuples a walker of `length` visits.
    pub fn tuple_count(cache: &FragmentCache, length: usize) -> u64 {
        let max = cache.max_fragment_length();
        let (chunk_count, tail) = layout(length, max);
        (0..chunk_count)
            .map(|i| cache.entry_count(if i == 0 { tail } else { max }) as u64)
            .fold(1u64, u64::saturating_mul)
    }
}
