//! LaTeX project ingestion.
//!
//! A zipped project is unpacked into its process directory, directory
//! names are normalized, the entry file is located, and every
//! `\input`/`\include` is inlined into a single `full_text.txt`.

mod archive;
mod expand;
mod resolve;
mod source;

pub use archive::{normalize_dir_names, normalize_path, safe_extract};
pub use expand::{discover_tex_files, expand_project, find_main_tex, Expander, Expansion};
pub use resolve::{
    candidate_paths, normalize_ref_dirs, resolve, resolve_ref, RefKind, Resolution,
    GRAPHICS_EXTENSIONS,
};
pub use source::{read_text_lossy, strip_comments};

use std::fs;
use std::path::Path;

use crate::detect::DocumentKind;
use crate::error::Result;
use crate::model::{DocumentSummary, ImageEntry, Ingested, FULL_TEXT_FILE};
use crate::options::IngestOptions;
use crate::process_dir::create_process_dir;

/// Ingest a zipped LaTeX project into its process directory.
///
/// Fails when the archive cannot be read or no `.tex` file declares
/// `\begin{document}`; no summary is written in either case.
pub fn ingest_latex(path: &Path, filename: &str, options: &IngestOptions) -> Result<Ingested> {
    let process_dir = create_process_dir(
        path,
        filename,
        DocumentKind::Latex,
        options.output_root.as_deref(),
    )?;
    log::info!("Ingesting LaTeX project {}", path.display());

    safe_extract(path, &process_dir)?;
    normalize_dir_names(&process_dir)?;

    let summary = flatten_project(&process_dir)?;
    Ok(Ingested {
        process_dir,
        summary,
    })
}

/// Flatten an already-extracted project and write its artifacts.
pub fn flatten_project(process_dir: &Path) -> Result<DocumentSummary> {
    let tex_files = discover_tex_files(process_dir)?;
    let (main_tex, expansion) = expand_project(process_dir, &tex_files)?;

    let full_text = process_dir.join(FULL_TEXT_FILE);
    fs::write(&full_text, &expansion.text)?;

    let mut summary = DocumentSummary::new(full_text);
    summary.text_files = tex_files;
    summary.images = expansion
        .graphics
        .into_iter()
        .map(ImageEntry::Graphic)
        .collect();
    summary.main_tex = Some(main_tex);
    summary.write(process_dir)?;

    Ok(summary)
}
