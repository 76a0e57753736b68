// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Programs given as source text.

use crate::errors::ParseError;
use crate::fragment::Fragment;
use crate::skeleton::{Marker, Skeleton};

use super::Program;

/// A parsed program: its skeleton plus the fragment of every block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    source: String,
    skeleton: Skeleton,
    blocks: Vec<Fragment>,
}

impl ProgramImage {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut block_texts = Vec::new();
        let mut markers = Vec::new();
        let mut open = Vec::new();
        let mut block_start = 0;
        for (position, symbol) in source.char_indices() {
            let marker = match symbol {
                '+' | '-' | '<' | '>' => continue,
                '[' => {
                    open.push(position);
                    Marker::Left
                }
                ']' => {
                    if open.pop().is_none() {
                        return Err(ParseError::UnmatchedRight { position });
                    }
                    Marker::Right
                }
                '.' => Marker::Output,
                _ => return Err(ParseError::UnknownSymbol { position, symbol }),
            };
            block_texts.push(&source[block_start..position]);
            markers.push(marker);
            block_start = position + 1;
        }
        if let Some(&position) = open.last() {
            return Err(ParseError::UnclosedLeft { position });
        }
        block_texts.push(&source[block_start..]);

        let blocks = block_texts
            .iter()
            .enumerate()
            .map(|(block, text)| {
                Fragment::from_source(text).map_err(|_| ParseError::BlockOutsideWindow { block })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sizes = block_texts.iter().map(|text| text.len()).collect();
        Ok(ProgramImage {
            source: source.to_string(),
            skeleton: Skeleton::from_markers(sizes, &markers),
            blocks,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Program for ProgramImage {
    fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    fn block(&self, index: usize) -> Option<&Fragment> {
        self.blocks.get(index)
    }

    fn render(&self) -> String {
        self.source.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blocks() {
        let image = ProgramImage::parse("+[->+<].").unwrap();
        let skeleton = image.skeleton();
        assert_eq!(skeleton.block_sizes(), &[1, 4, 0, 0]);
        assert_eq!(skeleton.marker_after(0), Marker::Left);
        assert_eq!(skeleton.marker_after(1), Marker::Right);
        assert_eq!(skeleton.marker_after(2), Marker::Output);
        assert_eq!(image.block(1), Some(&Fragment::from_source("->+<").unwrap()));
        assert_eq!(image.render(), "+[->+<].");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ProgramImage::parse("+]"),
            Err(ParseError::UnmatchedRight { position: 1 })
        );
        assert_eq!(
            ProgramImage::parse("[[+]"),
            Err(ParseError::UnclosedLeft { position: 0 })
        );
        assert_eq!(
            ProgramImage::parse("+,"),
            Err(ParseError::UnknownSymbol {
                position: 1,
                symbol: ','
            })
        );
        assert_eq!(
            ProgramImage::parse(&format!("[{}]", ">".repeat(20))),
            Err(ParseError::BlockOutsideWindow { block: 1 })
        );
    }
}
