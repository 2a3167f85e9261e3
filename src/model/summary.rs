//! The per-document summary artifact written at the end of ingestion.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::json;
use crate::latex::read_text_lossy;

/// Name of the summary artifact inside a process directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Name of the concatenated (PDF) or flattened (LaTeX) text artifact.
pub const FULL_TEXT_FILE: &str = "full_text.txt";

/// An image extracted from a PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfImage {
    /// Source page (1-indexed)
    pub page: u32,

    /// Position among the page's images (1-indexed)
    pub img_index: u32,

    /// Absolute path of the written image file
    pub path: PathBuf,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,
}

/// An `\includegraphics` reference found in LaTeX source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsReference {
    /// The argument exactly as written in the source
    pub path: String,

    /// Absolute path of the first existing candidate, if any
    pub resolved_path: Option<PathBuf>,
}

/// One entry of the summary's `images` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageEntry {
    /// Raster image written out of a PDF
    Embedded(PdfImage),
    /// Graphics reference collected from LaTeX source
    Graphic(GraphicsReference),
}

/// Structural summary of one ingested document.
///
/// Written once per ingestion run; checks only ever read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Per-page text files (PDF) or discovered `.tex` files (LaTeX)
    pub text_files: Vec<PathBuf>,

    /// The authoritative text for every check
    pub full_text: PathBuf,

    /// Reserved; always empty
    #[serde(default)]
    pub tables: Vec<serde_json::Value>,

    /// Extracted images or graphics references
    #[serde(default)]
    pub images: Vec<ImageEntry>,

    /// Entry file of a LaTeX project
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_tex: Option<PathBuf>,
}

impl DocumentSummary {
    /// Create a summary pointing at a full-text artifact.
    pub fn new(full_text: impl Into<PathBuf>) -> Self {
        Self {
            text_files: Vec::new(),
            full_text: full_text.into(),
            tables: Vec::new(),
            images: Vec::new(),
            main_tex: None,
        }
    }

    /// Path of the summary artifact for a process directory.
    pub fn path_in(process_dir: &Path) -> PathBuf {
        process_dir.join(SUMMARY_FILE)
    }

    /// Write the summary as pretty JSON into `process_dir`.
    pub fn write(&self, process_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_in(process_dir);
        json::write_json(&path, self)?;
        log::info!("Wrote document summary to {}", path.display());
        Ok(path)
    }

    /// Load the summary stored in `process_dir`.
    pub fn load(process_dir: &Path) -> Result<Self> {
        let path = Self::path_in(process_dir);
        if !path.is_file() {
            return Err(Error::Summary(format!(
                "{} not found in {}",
                SUMMARY_FILE,
                process_dir.display()
            )));
        }
        json::read_json(&path)
    }

    /// Locate the full-text artifact of a process directory.
    ///
    /// Returns `None` when the directory, the summary, or the text file is
    /// missing, or when the summary cannot be parsed.
    pub fn full_text_path(process_dir: &Path) -> Option<PathBuf> {
        if !process_dir.is_dir() {
            return None;
        }
        match Self::load(process_dir) {
            Ok(summary) if summary.full_text.is_file() => Some(summary.full_text),
            Ok(summary) => {
                log::warn!(
                    "Summary points at missing full text {}",
                    summary.full_text.display()
                );
                None
            }
            Err(e) => {
                log::debug!("No usable summary in {}: {}", process_dir.display(), e);
                None
            }
        }
    }

    /// Read the full-text artifact.
    pub fn read_full_text(&self) -> Result<String> {
        read_text_lossy(&self.full_text)
    }

    /// Embedded PDF images in summary order.
    pub fn embedded_images(&self) -> impl Iterator<Item = &PdfImage> {
        self.images.iter().filter_map(|entry| match entry {
            ImageEntry::Embedded(img) => Some(img),
            ImageEntry::Graphic(_) => None,
        })
    }

    /// LaTeX graphics references in summary order.
    pub fn graphics(&self) -> impl Iterator<Item = &GraphicsReference> {
        self.images.iter().filter_map(|entry| match entry {
            ImageEntry::Graphic(g) => Some(g),
            ImageEntry::Embedded(_) => None,
        })
    }
}

/// Outcome of a successful ingestion run.
#[derive(Debug, Clone)]
pub struct Ingested {
    /// Absolute process directory holding every artifact
    pub process_dir: PathBuf,

    /// The summary written into `process_dir`
    pub summary: DocumentSummary,
}
