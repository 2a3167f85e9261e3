//! PDF ingestion.
//!
//! Each page is read twice: once as the decoder's raw text and once as
//! positioned word tokens. The [`ModeSelector`] decides per page whether
//! the raw text can be used or the [`Reconstructor`] has to rebuild it.

mod backend;
mod content;
mod images;
mod reconstruct;
mod selector;
mod walker;

pub use backend::{LopdfBackend, PdfBackend};
pub use content::decode_text_simple;
pub use reconstruct::Reconstructor;
pub use selector::{has_long_token, space_ratio, ExtractionStrategy, ModeSelector};
pub use walker::{PdfWalker, PAGE_SEPARATOR};

use std::path::Path;

use crate::detect::DocumentKind;
use crate::error::Result;
use crate::model::Ingested;
use crate::options::IngestOptions;
use crate::process_dir::create_process_dir;

/// Ingest a PDF into its process directory.
///
/// `filename` is the user-facing name used to derive the directory.
pub fn ingest_pdf(path: &Path, filename: &str, options: &IngestOptions) -> Result<Ingested> {
    let process_dir = create_process_dir(
        path,
        filename,
        DocumentKind::Pdf,
        options.output_root.as_deref(),
    )?;
    log::info!(
        "Ingesting PDF {} ({} layout)",
        path.display(),
        options.layout
    );

    let walker = PdfWalker::open(path, options)?;
    let summary = walker.walk(&process_dir)?;

    Ok(Ingested {
        process_dir,
        summary,
    })
}
