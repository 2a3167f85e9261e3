//! Positioned text tokens and the lines built from them.

use serde::{Deserialize, Serialize};

/// A decoded text fragment with its bounding box on a page.
///
/// Coordinates use a top-left origin: `top` grows downward from the top
/// of the page, `doctop` is `top` plus the heights of all preceding pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The text content
    pub text: String,

    /// Left edge
    pub x0: f64,

    /// Right edge
    pub x1: f64,

    /// Distance from the top of the page
    pub top: f64,

    /// Distance from the top of the document
    pub doctop: f64,

    /// Owning page (1-indexed)
    pub page: u32,
}

impl Token {
    /// Create a token on a single-page document (`doctop == top`).
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            doctop: top,
            page: 1,
        }
    }

    /// Place the token on a page whose top sits `page_offset` units into the document.
    pub fn on_page(mut self, page: u32, page_offset: f64) -> Self {
        self.page = page;
        self.doctop = self.top + page_offset;
        self
    }

    /// Horizontal extent.
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }
}

/// Tokens judged to share a vertical band.
#[derive(Debug, Clone, Default)]
pub struct Line {
    /// Tokens in detection order
    pub tokens: Vec<Token>,
}

impl Line {
    /// Start a line with its anchor token.
    pub fn starting_with(token: Token) -> Self {
        Self {
            tokens: vec![token],
        }
    }

    /// `top` of the first token; the band every later token is measured against.
    pub fn anchor_top(&self) -> Option<f64> {
        self.tokens.first().map(|t| t.top)
    }

    /// Add a token to the line.
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Check if the line has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Concatenate tokens left to right, inserting a space wherever the gap
    /// between one token's right edge and the next token's left edge
    /// exceeds `x_tolerance`.
    pub fn text(&self, x_tolerance: f64) -> String {
        let mut ordered: Vec<&Token> = self.tokens.iter().collect();
        ordered.sort_by(|a, b| a.x0.total_cmp(&b.x0));

        let mut result = String::new();
        let mut prev_x1: Option<f64> = None;
        for token in ordered {
            if let Some(x1) = prev_x1 {
                if token.x0 - x1 > x_tolerance {
                    result.push(' ');
                }
            }
            result.push_str(&token.text);
            prev_x1 = Some(token.x1);
        }
        result
    }
}
