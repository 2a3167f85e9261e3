//! Label/reference consistency of flattened LaTeX text.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use serde_json::json;

use super::{CheckContext, CheckReport, CheckStatus, DocumentCheck};
use crate::error::Result;
use crate::latex::strip_comments;
use crate::model::DocumentSummary;

/// Registry name of the cross-reference check.
pub const CROSS_REF: &str = "cross_ref";

const FIGURE_ENVS: &[&str] = &["figure", "figure*"];
const TABLE_ENVS: &[&str] = &["table", "table*"];

fn ref_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\(?:ref|eqref)\s*\{([^}]+)\}").expect("valid regex"))
}

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\label\s*\{([^}]+)\}").expect("valid regex"))
}

/// Reference targets and label declarations of a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossRefFindings {
    /// References with no matching label, sorted
    pub invalid_refs: Vec<String>,

    /// Figure/table labels never referenced, sorted
    pub unreferenced_fig_table_labels: Vec<String>,

    /// Distinct reference targets
    pub refs_count: usize,

    /// Distinct labels inside figure environments
    pub figure_labels_count: usize,

    /// Distinct labels inside table environments
    pub table_labels_count: usize,
}

impl CrossRefFindings {
    /// Analyse flattened LaTeX text. Comments are stripped first.
    pub fn analyze(text: &str) -> Self {
        let text = strip_comments(text);

        let refs = captures(ref_pattern(), &text);
        let labels = captures(label_pattern(), &text);

        let figure_labels = labels_in_envs(&text, FIGURE_ENVS);
        let table_labels = labels_in_envs(&text, TABLE_ENVS);

        let invalid_refs = refs.difference(&labels).cloned().collect();
        let unreferenced_fig_table_labels = figure_labels
            .union(&table_labels)
            .filter(|label| !refs.contains(*label))
            .cloned()
            .collect();

        Self {
            invalid_refs,
            unreferenced_fig_table_labels,
            refs_count: refs.len(),
            figure_labels_count: figure_labels.len(),
            table_labels_count: table_labels.len(),
        }
    }

    /// Whether both finding lists are empty.
    pub fn passed(&self) -> bool {
        self.invalid_refs.is_empty() && self.unreferenced_fig_table_labels.is_empty()
    }

    fn into_report(self) -> CheckReport {
        let status = if self.passed() {
            CheckStatus::Passed
        } else {
            CheckStatus::Failed
        };

        let mut report = CheckReport::new(CROSS_REF, status);
        report.results = vec![
            json!({
                "invalid_refs": self.invalid_refs,
                "confidence": "high",
            }),
            json!({
                "unreferenced_fig_table_labels": self.unreferenced_fig_table_labels,
                "confidence": "medium",
            }),
            json!({
                "refs_count": self.refs_count,
                "figure_labels_count": self.figure_labels_count,
                "table_labels_count": self.table_labels_count,
                "confidence": "Statistics",
            }),
        ];
        report
    }
}

/// Trimmed first-group captures as a sorted set.
fn captures(re: &Regex, text: &str) -> BTreeSet<String> {
    re.captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Labels declared inside any of the named environments.
fn labels_in_envs(text: &str, envs: &[&str]) -> BTreeSet<String> {
    let mut labels = BTreeSet::new();
    for env in envs {
        let name = regex::escape(env);
        let pattern = format!(r"(?s)\\begin\{{{}\}}(.*?)\\end\{{{}\}}", name, name);
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                log::warn!("Invalid environment pattern for {}: {}", env, e);
                continue;
            }
        };
        for block in re.captures_iter(text).filter_map(|c| c.get(1)) {
            labels.extend(captures(label_pattern(), block.as_str()));
        }
    }
    labels
}

/// What the cross-reference check could establish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossRefOutcome {
    /// The source is a PDF
    NotApplicable { reason: String },
    /// No usable summary or full text in the process directory
    NotFound { reason: String },
    /// The flattened text was analysed
    Checked(CrossRefFindings),
}

impl CrossRefOutcome {
    /// Convert into a serializable report.
    pub fn into_report(self) -> CheckReport {
        match self {
            CrossRefOutcome::NotApplicable { reason } => {
                CheckReport::with_message(CROSS_REF, CheckStatus::NotApplicable, reason)
            }
            CrossRefOutcome::NotFound { reason } => {
                CheckReport::with_message(CROSS_REF, CheckStatus::NotFound, reason)
            }
            CrossRefOutcome::Checked(findings) => findings.into_report(),
        }
    }
}

/// Validates `\ref`/`\eqref` targets against `\label` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossRefCheck;

impl CrossRefCheck {
    /// Create the check.
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a process directory.
    pub fn evaluate(&self, ctx: &CheckContext) -> Result<CrossRefOutcome> {
        if ctx.is_pdf_source() {
            return Ok(CrossRefOutcome::NotApplicable {
                reason: "Input is a PDF file, cross-ref check requires LaTeX source".to_string(),
            });
        }

        let full_text = match DocumentSummary::full_text_path(&ctx.process_dir) {
            Some(path) => path,
            None => {
                return Ok(CrossRefOutcome::NotFound {
                    reason: "summary.json/full_text not found in process directory".to_string(),
                })
            }
        };

        let text = crate::latex::read_text_lossy(&full_text)?;
        let findings = CrossRefFindings::analyze(&text);
        log::debug!(
            "Cross-ref: {} invalid refs, {} unreferenced float labels",
            findings.invalid_refs.len(),
            findings.unreferenced_fig_table_labels.len()
        );
        Ok(CrossRefOutcome::Checked(findings))
    }
}

impl DocumentCheck for CrossRefCheck {
    fn name(&self) -> &str {
        CROSS_REF
    }

    fn run(&self, ctx: &CheckContext) -> Result<CheckReport> {
        Ok(self.evaluate(ctx)?.into_report())
    }
}
