// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Search configuration stored as TOML.
//!
//! Every section is optional and falls back to the library defaults; only the
//! `[[pairs]]` list must be given.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::constants::{tape_origin, DEFAULT_PROGRESS_INTERVAL, DEFAULT_SLOT_CAPACITY, TAPE_MARGIN};
use crate::dialect::Dialect;
use crate::enumerator::EnumeratorOptions;
use crate::machine::MachineLimits;
use crate::memo::CacheLimits;
use crate::search::{DataMatch, IoPair, SearchPlan, Target};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub cache: CacheLimits,
    pub machine: MachineLimits,
    pub dialect: Dialect,
    pub search: SearchSection,
    pub pairs: Vec<PairConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Worker threads per length.
    pub lanes: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub stop_at_first: bool,
    /// Candidates a lane checks between progress updates.
    pub progress_interval: u64,
    pub verify: bool,
    pub data_match: DataMatch,
    /// Block slots per skeleton.
    pub capacity: usize,
    pub skip_unreached: bool,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            lanes: std::thread::available_parallelism().map_or(1, |n| n.get()),
            min_length: 1,
            max_length: 40,
            stop_at_first: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            verify: true,
            data_match: DataMatch::Exact,
            capacity: DEFAULT_SLOT_CAPACITY,
            skip_unreached: true,
        }
    }
}

/// A byte string written either as text or as an array of values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Bytes {
    Text(String),
    Values(Vec<u8>),
}

impl Default for Bytes {
    fn default() -> Self {
        Bytes::Values(Vec::new())
    }
}

impl Bytes {
    pub fn to_vec(&self) -> Vec<u8> {
        match self {
            Bytes::Text(text) => text.as_bytes().to_vec(),
            Bytes::Values(values) => values.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PairConfig {
    pub input: Bytes,
    pub input_offset: isize,
    pub output: Bytes,
    pub output_offset: isize,
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        let search = &self.search;
        if search.lanes == 0 {
            bail!("search.lanes must be > 0");
        }
        if search.progress_interval == 0 {
            bail!("search.progress_interval must be > 0");
        }
        if self.machine.data_width == 0 {
            bail!("machine.data_width must be > 0");
        }
        if self.machine.step_budget == 0 {
            bail!("machine.step_budget must be > 0");
        }
        if self.cache.max_fragment_length == 0 {
            bail!("cache.max_fragment_length must be > 0");
        }
        if search.min_length == 0 || search.min_length > search.max_length {
            bail!(
                "search lengths must satisfy 1 <= min_length <= max_length, got {}..={}",
                search.min_length,
                search.max_length
            );
        }
        if search.max_length + 1 > search.capacity {
            bail!(
                "search.max_length {} needs {} block slots, capacity is {}",
                search.max_length,
                search.max_length + 1,
                search.capacity
            );
        }
        if self.dialect.initial_zero && self.dialect.max_first_block_size == Some(0) {
            bail!("dialect.max_first_block_size = 0 contradicts initial_zero");
        }
        if self.pairs.is_empty() {
            bail!("at least one [[pairs]] entry is required");
        }
        let tape_length = self.machine.data_width + 2 * TAPE_MARGIN;
        let origin = tape_origin(self.machine.data_width);
        for (index, pair) in self.pairs.iter().enumerate() {
            let input = pair.input.to_vec();
            let length = input.len();
            let fits = origin
                .checked_add_signed(pair.input_offset)
                .is_some_and(|start| start + length <= tape_length);
            if self.dialect.initial_zero && input.iter().any(|&byte| byte != 0) {
                bail!(
                    "pairs[{}]: dialect.initial_zero needs an all-zero input tape",
                    index
                );
            }
            if !fits {
                bail!(
                    "pairs[{}]: input of {} bytes at offset {} does not fit a tape of width {}",
                    index,
                    length,
                    pair.input_offset,
                    self.machine.data_width
                );
            }
        }
        Ok(())
    }

    pub fn plan(&self) -> SearchPlan {
        let search = &self.search;
        SearchPlan {
            pairs: self
                .pairs
                .iter()
                .map(|pair| IoPair {
                    input: pair.input.to_vec(),
                    input_offset: pair.input_offset,
                    output: pair.output.to_vec(),
                    output_offset: pair.output_offset,
                })
                .collect(),
            target: Target::for_mode(self.dialect.mode, search.data_match),
            dialect: self.dialect,
            enumerator: EnumeratorOptions {
                capacity: search.capacity,
                skip_unreached: search.skip_unreached,
                machine: self.machine,
            },
            lanes: search.lanes,
            min_length: search.min_length,
            max_length: search.max_length,
            stop_at_first: search.stop_at_first,
            progress_interval: search.progress_interval,
            verify: search.verify,
        }
    }
}

/// Load and validate a config from a TOML file.
pub fn load_config(path: &Path) -> Result<SearchConfig> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SearchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
