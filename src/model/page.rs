//! Per-page results of a PDF walk.

use std::path::PathBuf;

use super::PdfImage;

/// Reconstructed text and extracted images of one page.
#[derive(Debug, Clone, Default)]
pub struct PageSummary {
    /// Page number (1-indexed)
    pub number: u32,

    /// Reconstructed text
    pub text: String,

    /// Absolute path of the per-page text artifact, once written
    pub text_file: Option<PathBuf>,

    /// Images extracted from this page
    pub images: Vec<PdfImage>,
}

impl PageSummary {
    /// Create a page summary with its text.
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            text_file: None,
            images: Vec::new(),
        }
    }

    /// Filename of the per-page text artifact.
    pub fn file_name(&self) -> String {
        format!("page_{}.txt", self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_summary() {
        let page = PageSummary::new(4, "  \n");
        assert_eq!(page.file_name(), "page_4.txt");
        assert_eq!(page.text, "  \n");
        assert!(page.images.is_empty());
    }
}
