// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! The four loop-free primitives.

use std::fmt;

/// A single loop-free instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// `+`: add one to the current cell.
    Increment,
    /// `-`: subtract one from the current cell.
    Decrement,
    /// `>`: move the pointer one cell right.
    Right,
    /// `<`: move the pointer one cell left.
    Left,
}

impl Instruction {
    /// All primitives, in the order the cache seeds them.
    pub const ALL: [Instruction; 4] = [
        Instruction::Increment,
        Instruction::Decrement,
        Instruction::Right,
        Instruction::Left,
    ];

    pub fn symbol(self) -> char {
        match self {
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::Right => '>',
            Instruction::Left => '<',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Instruction::Increment),
            '-' => Some(Instruction::Decrement),
            '>' => Some(Instruction::Right),
            '<' => Some(Instruction::Left),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
