//! Input format detection: PDF binaries versus zipped LaTeX projects.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// The two document kinds the ingestion pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// A PDF binary.
    Pdf,
    /// A ZIP archive containing a LaTeX source tree.
    Latex,
}

impl DocumentKind {
    /// Suffix used for the process directory name (`<stem>__<suffix>`).
    pub fn dir_suffix(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Latex => "latex",
        }
    }

    /// Guess the kind from a filename extension (case-insensitive).
    pub fn from_filename(name: &str) -> Option<Self> {
        let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "zip" => Some(DocumentKind::Latex),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::Latex => write!(f, "LaTeX archive"),
        }
    }
}

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Detected input format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    /// A PDF with its header version.
    Pdf(PdfFormat),
    /// A ZIP archive.
    Zip,
}

impl InputFormat {
    /// The ingestion path this format takes.
    pub fn kind(&self) -> DocumentKind {
        match self {
            InputFormat::Pdf(_) => DocumentKind::Pdf,
            InputFormat::Zip => DocumentKind::Latex,
        }
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Local file header, empty archive, and spanned archive signatures.
const ZIP_MAGICS: [&[u8]; 3] = [b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];

/// Detect the input format from a file path.
///
/// # Example
/// ```no_run
/// use manuscript_ingest::detect::{detect_format_from_path, DocumentKind};
///
/// let format = detect_format_from_path("paper.zip").unwrap();
/// assert_eq!(format.kind(), DocumentKind::Latex);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(16);
    file.take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the input format from the leading bytes of a file.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<InputFormat> {
    if ZIP_MAGICS.iter().any(|magic| data.starts_with(magic)) {
        return Ok(InputFormat::Zip);
    }

    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(InputFormat::Pdf(PdfFormat { version }))
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if a file is a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_format_from_path(path), Ok(InputFormat::Pdf(_)))
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Pdf(_)))
}
