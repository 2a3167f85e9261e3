//! End-to-end tests for checks over ingested documents.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use manuscript_ingest::check::{CheckRegistry, CHECK_RESULTS_FILE};
use manuscript_ingest::json::read_json;
use manuscript_ingest::{
    cross_ref_check, ingest_latex, CheckContext, CheckReport, CheckStatus, DocumentCheck,
    DocumentSummary, Error, IngestOptions, Ingested,
};
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const PAPER: &[u8] = b"\\begin{document}\n\
\\input{body}\n\
\\begin{figure}\\includegraphics{plot}\\caption{Plot}\\label{fig:plot}\\end{figure}\n\
\\begin{figure*}\\caption{Wide}\\label{fig:wide}\\end{figure*}\n\
\\begin{table}\\caption{Numbers}\\label{tab:nums}\\end{table}\n\
\\end{document}\n";

const BODY: &[u8] = b"As Figure~\\ref{fig:plot} and Table~\\ref{tab:nums} show, \
see also Section~\\ref{sec:missing}.\n\
% Figure~\\ref{fig:wide} is only mentioned in a comment\n";

fn ingest_project(dir: &Path, members: &[(&str, &[u8])]) -> Ingested {
    let zip_path = dir.join("paper.zip");
    let mut zip = ZipWriter::new(File::create(&zip_path).unwrap());
    for (name, content) in members {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();

    ingest_latex(
        &zip_path,
        "paper.zip",
        &IngestOptions::new().with_output_root(dir),
    )
    .unwrap()
}

#[test]
fn test_cross_ref_over_flattened_project() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(dir.path(), &[("main.tex", PAPER), ("body.tex", BODY)]);

    let report = cross_ref_check(dir.path().join("paper.zip"), &ingested.process_dir).unwrap();

    assert_eq!(report.check_type, "cross_ref");
    assert_eq!(report.status, CheckStatus::Failed);
    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0]["invalid_refs"], json!(["sec:missing"]));
    assert_eq!(
        report.results[1]["unreferenced_fig_table_labels"],
        json!(["fig:wide"])
    );
    assert_eq!(report.results[2]["refs_count"], 3);
    assert_eq!(report.results[2]["figure_labels_count"], 2);
    assert_eq!(report.results[2]["table_labels_count"], 1);
}

#[test]
fn test_consistent_project_passes() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(
        dir.path(),
        &[(
            "main.tex",
            b"\\begin{document}\\begin{table}\\label{tab:a}\\end{table}See \\ref{tab:a}.\\end{document}",
        )],
    );

    let report = cross_ref_check(dir.path().join("paper.zip"), &ingested.process_dir).unwrap();
    assert!(report.passed());
    assert!(report.message.is_none());
}

#[test]
fn test_pdf_source_is_not_applicable() {
    let dir = tempfile::tempdir().unwrap();
    let report = cross_ref_check(dir.path().join("paper.PDF"), dir.path()).unwrap();

    assert_eq!(report.status, CheckStatus::NotApplicable);
    assert!(report.results.is_empty());
    assert!(report.message.unwrap().contains("requires LaTeX source"));
}

#[test]
fn test_missing_full_text_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(dir.path(), &[("main.tex", PAPER), ("body.tex", BODY)]);
    fs::remove_file(&ingested.summary.full_text).unwrap();

    let report = cross_ref_check(dir.path().join("paper.zip"), &ingested.process_dir).unwrap();
    assert_eq!(report.status, CheckStatus::NotFound);

    let empty = tempfile::tempdir().unwrap();
    let report = cross_ref_check(empty.path().join("paper.zip"), empty.path()).unwrap();
    assert_eq!(report.status, CheckStatus::NotFound);
}

#[test]
fn test_summary_full_text_is_authoritative() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(dir.path(), &[("main.tex", PAPER), ("body.tex", BODY)]);

    // A summary pointing at a different text is what checks must read
    let replacement = ingested.process_dir.join("edited.txt");
    fs::write(&replacement, "\\ref{only}\\label{only}").unwrap();
    let mut summary = DocumentSummary::load(&ingested.process_dir).unwrap();
    summary.full_text = replacement;
    summary.write(&ingested.process_dir).unwrap();

    let report = cross_ref_check(dir.path().join("paper.zip"), &ingested.process_dir).unwrap();
    assert!(report.passed());
}

struct Exploding;

impl DocumentCheck for Exploding {
    fn name(&self) -> &str {
        "exploding"
    }

    fn run(&self, _ctx: &CheckContext) -> manuscript_ingest::Result<CheckReport> {
        Err(Error::Other("boom".to_string()))
    }
}

#[test]
fn test_registry_runs_and_saves_reports() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(dir.path(), &[("main.tex", PAPER), ("body.tex", BODY)]);

    let mut registry = CheckRegistry::with_defaults();
    registry.register(Arc::new(Exploding));
    assert_eq!(registry.names(), vec!["cross_ref", "exploding"]);

    let ctx = CheckContext::new(dir.path().join("paper.zip"), &ingested.process_dir);
    let reports = registry.run_and_save(&ctx, None).unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].status, CheckStatus::Failed);
    assert_eq!(reports[1].status, CheckStatus::Error);
    assert_eq!(reports[1].message.as_deref(), Some("boom"));

    let saved: Vec<CheckReport> =
        read_json(&ingested.process_dir.join(CHECK_RESULTS_FILE)).unwrap();
    assert_eq!(saved, reports);
}

#[test]
fn test_registry_selection_skips_unknown_names() {
    let dir = tempfile::tempdir().unwrap();
    let ingested = ingest_project(dir.path(), &[("main.tex", PAPER), ("body.tex", BODY)]);

    let registry = CheckRegistry::with_defaults();
    let ctx = CheckContext::new(dir.path().join("paper.zip"), &ingested.process_dir);
    let selection = vec!["Cross_Ref".to_string(), "spelling".to_string()];
    let reports = registry.run(&ctx, Some(&selection));

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].check_type, "cross_ref");
}
