//! Per-page choice between the decoder's raw text and token reconstruction.

use crate::options::{LayoutConfig, LayoutMode};

/// How a page's text is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Use the decoder's raw text as-is.
    Raw,
    /// Rebuild a single text block from tokens.
    Reconstruct,
    /// Rebuild left and right columns from tokens.
    ReconstructColumns,
}

/// Decides whether raw extracted text can be trusted.
#[derive(Debug, Clone, Copy)]
pub struct ModeSelector {
    layout: LayoutMode,
    long_token_len: usize,
    min_space_ratio: f64,
}

impl ModeSelector {
    /// Create a selector for a layout mode.
    pub fn new(layout: LayoutMode, config: &LayoutConfig) -> Self {
        Self {
            layout,
            long_token_len: config.long_token_len,
            min_space_ratio: config.min_space_ratio,
        }
    }

    /// Pick the strategy for a page given its raw text.
    ///
    /// Dual layout always reconstructs: a single raw stream cannot
    /// represent two columns.
    pub fn select(&self, raw_text: &str) -> ExtractionStrategy {
        match self.layout {
            LayoutMode::Dual => ExtractionStrategy::ReconstructColumns,
            LayoutMode::Single if self.is_space_missing(raw_text) => {
                ExtractionStrategy::Reconstruct
            }
            LayoutMode::Single => ExtractionStrategy::Raw,
        }
    }

    /// Either heuristic firing means the decoder dropped inter-word spaces.
    pub fn is_space_missing(&self, text: &str) -> bool {
        has_long_token(text, self.long_token_len) || space_ratio(text) < self.min_space_ratio
    }
}

/// Check for a contiguous run of ASCII letters at least `threshold` long.
pub fn has_long_token(text: &str, threshold: usize) -> bool {
    let mut run = 0usize;
    for c in text.chars() {
        if c.is_ascii_alphabetic() {
            run += 1;
            if run >= threshold {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Fraction of characters that are spaces; empty text counts as 1.0.
pub fn space_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 1.0;
    }
    let spaces = text.chars().filter(|&c| c == ' ').count();
    spaces as f64 / total as f64
}
