//! Ingestion options and layout heuristics.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Horizontal gap (in PDF units) above which a space is inserted between tokens.
pub const DEFAULT_X_TOLERANCE: f64 = 2.0;
/// Vertical distance (in PDF units) within which tokens share a line.
pub const DEFAULT_Y_TOLERANCE: f64 = 3.0;
/// Letter-run length that signals missing inter-word spaces.
pub const DEFAULT_LONG_TOKEN_LEN: usize = 20;
/// Space-character ratio below which raw text is considered space-starved.
pub const DEFAULT_MIN_SPACE_RATIO: f64 = 0.08;
/// Fraction of the page width where the dual-column split line sits.
pub const DEFAULT_COLUMN_SPLIT: f64 = 0.5;

/// Page layout of the manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// One text column per page.
    #[default]
    Single,
    /// Two text columns per page.
    Dual,
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(LayoutMode::Single),
            "dual" => Ok(LayoutMode::Dual),
            other => Err(Error::Other(format!(
                "Invalid layout mode '{}': expected 'single' or 'dual'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutMode::Single => write!(f, "single"),
            LayoutMode::Dual => write!(f, "dual"),
        }
    }
}

/// Thresholds used by token reconstruction and the extraction-mode selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Gap between token edges that becomes a space
    pub x_tolerance: f64,

    /// Maximum `top` distance from a line's first token
    pub y_tolerance: f64,

    /// Minimum letter-run length for the long-token signal
    pub long_token_len: usize,

    /// Space ratio below which the space-ratio signal fires
    pub min_space_ratio: f64,

    /// Column split as a fraction of page width
    pub column_split: f64,
}

impl LayoutConfig {
    /// Create a config with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal tolerance.
    pub fn with_x_tolerance(mut self, tolerance: f64) -> Self {
        self.x_tolerance = tolerance;
        self
    }

    /// Set the vertical tolerance.
    pub fn with_y_tolerance(mut self, tolerance: f64) -> Self {
        self.y_tolerance = tolerance;
        self
    }

    /// Set the long-token threshold.
    pub fn with_long_token_len(mut self, len: usize) -> Self {
        self.long_token_len = len;
        self
    }

    /// Set the minimum space ratio.
    pub fn with_min_space_ratio(mut self, ratio: f64) -> Self {
        self.min_space_ratio = ratio;
        self
    }

    /// Set the column split fraction.
    pub fn with_column_split(mut self, split: f64) -> Self {
        self.column_split = split;
        self
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            x_tolerance: DEFAULT_X_TOLERANCE,
            y_tolerance: DEFAULT_Y_TOLERANCE,
            long_token_len: DEFAULT_LONG_TOKEN_LEN,
            min_space_ratio: DEFAULT_MIN_SPACE_RATIO,
            column_split: DEFAULT_COLUMN_SPLIT,
        }
    }
}

/// Options for ingesting a document.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Page layout (PDF only)
    pub layout: LayoutMode,

    /// Reconstruction and selector thresholds (PDF only)
    pub layout_config: LayoutConfig,

    /// Directory under which `process/` is created.
    /// Defaults to the input file's parent directory.
    pub output_root: Option<PathBuf>,
}

impl IngestOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the layout mode.
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    /// Treat pages as two-column.
    pub fn dual_column(mut self) -> Self {
        self.layout = LayoutMode::Dual;
        self
    }

    /// Set the layout thresholds.
    pub fn with_layout_config(mut self, config: LayoutConfig) -> Self {
        self.layout_config = config;
        self
    }

    /// Set the output root directory.
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = Some(root.into());
        self
    }
}
