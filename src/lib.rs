//! # manuscript-ingest
//!
//! Turns academic manuscripts into reading-order plain text for
//! downstream compliance checks.
//!
//! Two inputs are accepted: a PDF, whose pages are rebuilt from positioned
//! glyph tokens when the decoder's own text is unusable, and a zipped
//! LaTeX project, which is unpacked and flattened by inlining every
//! `\input`/`\include`. Both write their artifacts into a per-document
//! *process directory* ending with a `summary.json` whose `full_text`
//! entry is the only thing checks ever read.
//!
//! ## Quick Start
//!
//! ```no_run
//! use manuscript_ingest::{cross_ref_check, ingest, IngestOptions};
//!
//! fn main() -> manuscript_ingest::Result<()> {
//!     let ingested = ingest("uploads/paper.zip", &IngestOptions::default())?;
//!     println!("Full text: {}", ingested.summary.full_text.display());
//!
//!     let report = cross_ref_check("uploads/paper.zip", &ingested.process_dir)?;
//!     println!("cross_ref: {}", report.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Layout-aware PDF text**: per-page choice between raw text and token
//!   reconstruction, with a fixed-midline dual-column mode
//! - **Safe archive extraction**: members escaping the process directory
//!   are rejected
//! - **Recursive LaTeX flattening**: cycle-safe include expansion with
//!   inline markers for missing inputs
//! - **Cross-reference check**: dangling `\ref`s and unreferenced float
//!   labels

pub mod check;
pub mod detect;
pub mod error;
pub mod json;
pub mod latex;
pub mod model;
pub mod options;
pub mod pdf;
pub mod process_dir;

// Re-export commonly used types
pub use check::{
    CheckContext, CheckRegistry, CheckReport, CheckStatus, CrossRefCheck, CrossRefFindings,
    CrossRefOutcome, DocumentCheck,
};
pub use detect::{detect_format_from_bytes, detect_format_from_path, DocumentKind, InputFormat};
pub use error::{Error, Result};
pub use json::JsonFormat;
pub use latex::ingest_latex;
pub use model::{
    DocumentSummary, GraphicsReference, ImageEntry, Ingested, Line, PageSummary, PdfImage, Token,
};
pub use options::{IngestOptions, LayoutConfig, LayoutMode};
pub use pdf::{ingest_pdf, PdfWalker, Reconstructor};
pub use process_dir::process_dir_for;

use std::path::Path;

/// Ingest a PDF or a zipped LaTeX project.
///
/// The format is detected from the file's magic bytes, falling back to
/// its extension.
///
/// # Example
///
/// ```no_run
/// use manuscript_ingest::{ingest, IngestOptions, LayoutMode};
///
/// let options = IngestOptions::new().with_layout(LayoutMode::Dual);
/// let ingested = ingest("paper.pdf", &options).unwrap();
/// println!("{}", ingested.process_dir.display());
/// ```
pub fn ingest<P: AsRef<Path>>(path: P, options: &IngestOptions) -> Result<Ingested> {
    let path = path.as_ref();
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Other(format!("Invalid file name: {}", path.display())))?;

    match detect_kind(path, filename)? {
        DocumentKind::Pdf => ingest_pdf(path, filename, options),
        DocumentKind::Latex => ingest_latex(path, filename, options),
    }
}

fn detect_kind(path: &Path, filename: &str) -> Result<DocumentKind> {
    match detect_format_from_path(path) {
        Ok(format) => Ok(format.kind()),
        Err(Error::UnknownFormat) => {
            log::debug!("No known magic bytes in {}, using extension", filename);
            DocumentKind::from_filename(filename).ok_or(Error::UnknownFormat)
        }
        Err(e) => Err(e),
    }
}

/// Run the cross-reference check on a finished process directory.
///
/// `source` is the uploaded file; a `.pdf` source yields a
/// not-applicable report.
///
/// # Example
///
/// ```no_run
/// use manuscript_ingest::cross_ref_check;
///
/// let report = cross_ref_check("paper.zip", "process/paper__latex").unwrap();
/// if !report.passed() {
///     println!("{:#?}", report.results);
/// }
/// ```
pub fn cross_ref_check<P, Q>(source: P, process_dir: Q) -> Result<CheckReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let ctx = CheckContext::new(source.as_ref(), process_dir.as_ref());
    CrossRefCheck::new().run(&ctx)
}
