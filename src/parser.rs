//! Splitting a raw line into pipeline stages.
use crate::lexer::{self, ArgumentVector};

/// Stage separator.
pub const PIPE: char = '|';

/// Split a raw line at every `|`.
///
/// The escape character does not protect a `|`. Leading, trailing and doubled
/// separators produce empty stages, which the executor skips.
pub fn split_stages(raw_line: &str) -> Vec<&str> {
    raw_line.split(PIPE).collect()
}

/// Split a raw line into stages and tokenize each one, preserving stage order.
pub fn parse_line(raw_line: &str) -> Vec<ArgumentVector> {
    split_stages(raw_line)
        .into_iter()
        .map(lexer::tokenize)
        .collect()
}
