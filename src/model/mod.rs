//! Data model shared by the PDF walker, the LaTeX expander, and the checks.
//!
//! Tokens and lines are transient reconstruction inputs. The
//! [`DocumentSummary`] is the terminal artifact of ingestion and the only
//! handoff between ingestion and analysis.

mod page;
mod resource;
mod summary;
mod token;

pub use page::PageSummary;
pub use resource::RasterImage;
pub use summary::{
    DocumentSummary, GraphicsReference, ImageEntry, Ingested, PdfImage, FULL_TEXT_FILE,
    SUMMARY_FILE,
};
pub use token::{Line, Token};
