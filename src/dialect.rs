// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Enumeration dialects.
//!
//! A [`Dialect`] is an immutable value consulted while enumerating and executing
//! candidates. Every flag is a pure filter: turning one off can only add
//! candidates, never change how a candidate behaves.

use serde::{Deserialize, Serialize};

/// What a search is matching against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Tape contents after the program halts; markers are brackets only.
    #[default]
    Data,
    /// Bytes emitted by output markers.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub mode: Mode,
    /// The tape starts all zero: block 0 is non-empty, must change its start
    /// cell, and must leave a non-zero cell for the marker that follows it.
    pub initial_zero: bool,
    /// The starting tape is mirror symmetric, so only programs whose first
    /// moving block moves right are needed.
    pub initial_data_symmetric: bool,
    pub max_bracket_depth: Option<usize>,
    /// Only slot 0 may open a bracket at depth 0.
    pub single_bracket_hierarchy: bool,
    /// Nothing may follow the last marker.
    pub no_trailing_linear_block: bool,
    pub max_first_block_size: Option<usize>,
    pub min_output_count: Option<usize>,
    pub max_output_count: Option<usize>,
    pub max_zero_depth_output_count: Option<usize>,
    /// Reject an output marker directly after another around an empty block.
    pub no_repeated_output: bool,
    /// Stop with success once the whole expected output has been produced.
    pub after_output_irrelevant: bool,
    pub case_insensitive: bool,
    /// Reject loop bodies `-`, `++`, `---`, … that duplicate the `[+]` clear.
    pub reject_redundant_clear: bool,
}

impl Dialect {
    /// Bracket-only programs matched on the final tape.
    pub fn data() -> Self {
        Dialect {
            mode: Mode::Data,
            initial_zero: false,
            initial_data_symmetric: false,
            max_bracket_depth: None,
            single_bracket_hierarchy: false,
            no_trailing_linear_block: false,
            max_first_block_size: None,
            min_output_count: None,
            max_output_count: None,
            max_zero_depth_output_count: None,
            no_repeated_output: false,
            after_output_irrelevant: false,
            case_insensitive: false,
            reject_redundant_clear: true,
        }
    }

    /// Programs printing a string from an all-zero tape.
    pub fn output() -> Self {
        Dialect {
            mode: Mode::Output,
            initial_zero: true,
            no_trailing_linear_block: true,
            max_first_block_size: Some(2),
            min_output_count: Some(1),
            no_repeated_output: true,
            after_output_irrelevant: true,
            ..Dialect::data()
        }
    }

    /// How much the block count grows once a count's compositions run out.
    pub fn growth_step(&self) -> usize {
        match self.mode {
            Mode::Data => 2,
            Mode::Output => 1,
        }
    }

    pub fn allows_output(&self) -> bool {
        self.mode == Mode::Output
    }

    pub fn min_first_block_size(&self) -> usize {
        usize::from(self.initial_zero)
    }

    pub fn mirror_symmetric(&self) -> bool {
        self.initial_zero || self.initial_data_symmetric
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::data()
    }
}
