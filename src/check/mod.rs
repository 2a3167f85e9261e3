//! Document checks run against a finished process directory.
//!
//! Checks never look at the original upload. They read what ingestion
//! left behind, normally the summary's `full_text`, and produce a
//! [`CheckReport`]. The [`CheckRegistry`] runs a selection of checks and
//! persists their reports as `check_results.json`.
//!
//! # Example
//!
//! ```no_run
//! use manuscript_ingest::check::{CheckContext, CheckRegistry};
//!
//! fn main() -> manuscript_ingest::Result<()> {
//!     let registry = CheckRegistry::with_defaults();
//!     let ctx = CheckContext::new("uploads/paper.zip", "uploads/process/paper__latex");
//!     for report in registry.run_and_save(&ctx, None)? {
//!         println!("{}: {}", report.check_type, report.status);
//!     }
//!     Ok(())
//! }
//! ```

mod cross_ref;

pub use cross_ref::{CrossRefCheck, CrossRefFindings, CrossRefOutcome, CROSS_REF};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::json;

/// Name of the persisted report list inside a process directory.
pub const CHECK_RESULTS_FILE: &str = "check_results.json";

/// Inputs shared by every check.
#[derive(Debug, Clone)]
pub struct CheckContext {
    /// The uploaded file as the user supplied it
    pub source_path: PathBuf,

    /// Process directory produced by ingestion
    pub process_dir: PathBuf,
}

impl CheckContext {
    /// Create a context.
    pub fn new(source_path: impl Into<PathBuf>, process_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            process_dir: process_dir.into(),
        }
    }

    /// Whether the source file has a `.pdf` extension.
    pub fn is_pdf_source(&self) -> bool {
        self.source_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
    }
}

/// Outcome class of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Every rule held
    Passed,
    /// At least one rule was violated
    Failed,
    /// The check does not apply to this kind of source
    NotApplicable,
    /// A required artifact is missing from the process directory
    NotFound,
    /// The check itself failed to run
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::NotApplicable => "not applicable",
            CheckStatus::NotFound => "not found",
            CheckStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Serializable result of one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Registry name of the check
    pub check_type: String,

    /// Outcome class
    pub status: CheckStatus,

    /// Explanation for non-findings outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Check-specific findings
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl CheckReport {
    /// Create a report carrying findings.
    pub fn new(check_type: impl Into<String>, status: CheckStatus) -> Self {
        Self {
            check_type: check_type.into(),
            status,
            message: None,
            results: Vec::new(),
        }
    }

    /// Create a findings-free report with an explanation.
    pub fn with_message(
        check_type: impl Into<String>,
        status: CheckStatus,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(check_type, status)
        }
    }

    /// Whether the check ran and found nothing wrong.
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// A single document check.
///
/// Implement this trait to plug a new check into the [`CheckRegistry`].
pub trait DocumentCheck: Send + Sync {
    /// Registry name, also written as `check_type`.
    fn name(&self) -> &str;

    /// Run the check.
    ///
    /// Missing preconditions are reported through the returned report;
    /// `Err` is reserved for unexpected failures.
    fn run(&self, ctx: &CheckContext) -> Result<CheckReport>;
}

/// Ordered collection of checks addressable by name.
pub struct CheckRegistry {
    checks: Vec<Arc<dyn DocumentCheck>>,
    by_name: HashMap<String, usize>,
}

impl CheckRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry with the built-in checks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CrossRefCheck::new()));
        registry
    }

    /// Register a check, replacing any check with the same name in place.
    pub fn register(&mut self, check: Arc<dyn DocumentCheck>) {
        let name = check.name().to_lowercase();
        match self.by_name.get(&name) {
            Some(&idx) => self.checks[idx] = check,
            None => {
                self.by_name.insert(name, self.checks.len());
                self.checks.push(check);
            }
        }
    }

    /// Check if a check name is registered.
    pub fn supports(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    /// Registered check names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run the selected checks, or all of them when `selection` is `None`.
    ///
    /// Checks run in registration order. Unknown names are skipped. A
    /// check that returns `Err` yields an error report instead of
    /// aborting the others.
    pub fn run(&self, ctx: &CheckContext, selection: Option<&[String]>) -> Vec<CheckReport> {
        if let Some(names) = selection {
            for name in names.iter().filter(|n| !self.supports(n)) {
                log::warn!("Unknown check '{}' ignored", name);
            }
        }

        self.checks
            .iter()
            .filter(|check| match selection {
                Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(check.name())),
                None => true,
            })
            .map(|check| {
                log::debug!("Running check {}", check.name());
                check.run(ctx).unwrap_or_else(|e| {
                    log::warn!("Check {} failed: {}", check.name(), e);
                    CheckReport::with_message(check.name(), CheckStatus::Error, e.to_string())
                })
            })
            .collect()
    }

    /// Run checks and write the reports to `check_results.json`.
    pub fn run_and_save(
        &self,
        ctx: &CheckContext,
        selection: Option<&[String]>,
    ) -> Result<Vec<CheckReport>> {
        let reports = self.run(ctx, selection);
        save_reports(&ctx.process_dir, &reports)?;
        Ok(reports)
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Write reports as `check_results.json` inside `process_dir`.
pub fn save_reports(process_dir: &Path, reports: &[CheckReport]) -> Result<PathBuf> {
    let path = process_dir.join(CHECK_RESULTS_FILE);
    json::write_json(&path, reports)?;
    log::info!("Wrote {} check reports to {}", reports.len(), path.display());
    Ok(path)
}
