//! Reading-order text reconstruction from positioned tokens.
//!
//! Tokens are sorted by `(doctop, x0)`, greedily grouped into lines by
//! their distance from each line's first token, and each line is joined
//! left to right with spaces only where the horizontal gap exceeds the
//! x-tolerance. Kerned or ligature-split words therefore rejoin without
//! a separator.

use crate::model::{Line, Token};
use crate::options::LayoutConfig;

/// Rebuilds plain text from the tokens of one page (or one column).
#[derive(Debug, Clone, Copy)]
pub struct Reconstructor {
    x_tolerance: f64,
    y_tolerance: f64,
    column_split: f64,
}

impl Reconstructor {
    /// Create a reconstructor from layout thresholds.
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            x_tolerance: config.x_tolerance,
            y_tolerance: config.y_tolerance,
            column_split: config.column_split,
        }
    }

    /// Group tokens into lines in reading order.
    pub fn group_lines(&self, tokens: &[Token]) -> Vec<Line> {
        let mut sorted: Vec<Token> = tokens.to_vec();
        sorted.sort_by(|a, b| a.doctop.total_cmp(&b.doctop).then(a.x0.total_cmp(&b.x0)));

        let mut lines: Vec<Line> = Vec::new();
        let mut current: Option<Line> = None;

        for token in sorted {
            let starts_line = match current.as_ref().and_then(Line::anchor_top) {
                Some(anchor) => (token.top - anchor).abs() > self.y_tolerance,
                None => true,
            };

            if starts_line {
                lines.extend(current.replace(Line::starting_with(token)));
            } else if let Some(line) = current.as_mut() {
                line.push(token);
            }
        }
        lines.extend(current);

        lines
    }

    /// Reconstruct a single text block; lines are newline-separated.
    pub fn reconstruct(&self, tokens: &[Token]) -> String {
        if tokens.is_empty() {
            return String::new();
        }

        self.group_lines(tokens)
            .iter()
            .map(|line| line.text(self.x_tolerance))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Split tokens at the column line and reconstruct each side.
    ///
    /// Tokens whose `x0` is strictly left of `page_width * column_split`
    /// form the left column. The left block comes first, then a blank
    /// line, then the right block.
    pub fn reconstruct_columns(&self, tokens: &[Token], page_width: f64) -> String {
        let split_x = page_width * self.column_split;
        let (left, right): (Vec<Token>, Vec<Token>) =
            tokens.iter().cloned().partition(|t| t.x0 < split_x);

        log::debug!(
            "Column split at x={:.1}: {} left, {} right tokens",
            split_x,
            left.len(),
            right.len()
        );

        format!("{}\n\n{}", self.reconstruct(&left), self.reconstruct(&right))
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}
