//! Error types for manuscript ingestion.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while ingesting a manuscript.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a PDF nor a ZIP archive.
    #[error("Unknown file format: expected a PDF or a zipped LaTeX project")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error extracting an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// The source archive could not be opened or read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// No `.tex` file in the project declares `\begin{document}`.
    #[error("No main .tex file with \\begin{{document}} found under {}", .0.display())]
    NoEntryDocument(PathBuf),

    /// The document summary is missing or unreadable.
    #[error("Summary error: {0}")]
    Summary(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::Io(e),
            _ => Error::Archive(err.to_string()),
        }
    }
}
