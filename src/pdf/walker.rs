//! Page-by-page PDF ingestion into a process directory.

use std::fs;
use std::path::Path;

use super::backend::{LopdfBackend, PdfBackend};
use super::reconstruct::Reconstructor;
use super::selector::{ExtractionStrategy, ModeSelector};
use crate::error::{Error, Result};
use crate::model::{DocumentSummary, ImageEntry, PageSummary, PdfImage, FULL_TEXT_FILE};
use crate::options::IngestOptions;

/// Separator between pages in the full-text artifact.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Walks every page of a PDF, choosing an extraction strategy per page.
pub struct PdfWalker<B: PdfBackend> {
    backend: B,
    selector: ModeSelector,
    reconstructor: Reconstructor,
}

impl PdfWalker<LopdfBackend> {
    /// Open a PDF file with the lopdf backend.
    pub fn open(path: &Path, options: &IngestOptions) -> Result<Self> {
        let backend = LopdfBackend::load_file(path)?;
        if backend.is_encrypted() {
            log::warn!("{} is encrypted; text may be unreadable", path.display());
        }
        log::debug!("Opened PDF {} (version {})", path.display(), backend.version());
        Ok(Self::new(backend, options))
    }
}

impl<B: PdfBackend> PdfWalker<B> {
    /// Create a walker over any backend.
    pub fn new(backend: B, options: &IngestOptions) -> Self {
        Self {
            backend,
            selector: ModeSelector::new(options.layout, &options.layout_config),
            reconstructor: Reconstructor::new(&options.layout_config),
        }
    }

    /// Produce the text of every page in order.
    pub fn extract_pages(&self) -> Result<Vec<PageSummary>> {
        let mut pages = Vec::new();
        let mut offset = 0.0;

        for number in self.backend.page_numbers() {
            let (width, height) = self.backend.page_size(number)?;
            let text = self.page_text(number, width, offset)?;
            pages.push(PageSummary::new(number, text));
            offset += height;
        }

        Ok(pages)
    }

    fn page_text(&self, page: u32, width: f64, offset: f64) -> Result<String> {
        let raw = self.backend.raw_text(page);

        let strategy = match &raw {
            Ok(text) => self.selector.select(text),
            Err(e) => {
                log::warn!("Raw text extraction failed on page {}: {}", page, e);
                match self.selector.select("") {
                    ExtractionStrategy::Raw => ExtractionStrategy::Reconstruct,
                    other => other,
                }
            }
        };
        log::debug!("Page {}: {:?}", page, strategy);

        if strategy == ExtractionStrategy::Raw {
            return raw;
        }

        let tokens = match self.backend.tokens(page, offset) {
            Ok(tokens) => tokens,
            Err(e) => {
                return match raw {
                    Ok(text) => {
                        log::warn!(
                            "Token extraction failed on page {}, keeping raw text: {}",
                            page,
                            e
                        );
                        Ok(text)
                    }
                    Err(_) => Err(Error::TextExtract(format!("Page {}: {}", page, e))),
                };
            }
        };

        Ok(match strategy {
            ExtractionStrategy::ReconstructColumns => {
                self.reconstructor.reconstruct_columns(&tokens, width)
            }
            _ => self.reconstructor.reconstruct(&tokens),
        })
    }

    /// Write every decodable image into `process_dir`.
    ///
    /// Images that fail to decode are logged and skipped; their index is
    /// not reused.
    pub fn extract_images(&self, process_dir: &Path) -> Result<Vec<PdfImage>> {
        let mut written = Vec::new();

        for page in self.backend.page_numbers() {
            let images = match self.backend.images(page) {
                Ok(images) => images,
                Err(e) => {
                    log::warn!("Cannot enumerate images on page {}: {}", page, e);
                    continue;
                }
            };

            for (i, image) in images.into_iter().enumerate() {
                let img_index = i as u32 + 1;
                let image = match image {
                    Ok(image) => image,
                    Err(e) => {
                        log::warn!("Skipping image {} on page {}: {}", img_index, page, e);
                        continue;
                    }
                };

                let path = process_dir.join(image.file_name(page, img_index));
                fs::write(&path, &image.data)?;
                log::trace!("Wrote {} ({} bytes)", path.display(), image.size());

                written.push(PdfImage {
                    page,
                    img_index,
                    path,
                    width: image.width,
                    height: image.height,
                });
            }
        }

        Ok(written)
    }

    /// Write every page's text and images into `process_dir`.
    ///
    /// Each returned page carries its text file and the images written
    /// for it.
    pub fn write_pages(&self, process_dir: &Path) -> Result<Vec<PageSummary>> {
        let mut pages = self.extract_pages()?;

        for page in &mut pages {
            let path = process_dir.join(page.file_name());
            fs::write(&path, &page.text)?;
            page.text_file = Some(path);
        }

        for image in self.extract_images(process_dir)? {
            match pages.iter_mut().find(|p| p.number == image.page) {
                Some(page) => page.images.push(image),
                None => log::warn!(
                    "Image {} belongs to unknown page {}",
                    image.img_index,
                    image.page
                ),
            }
        }

        Ok(pages)
    }

    /// Walk the whole document and persist every artifact.
    ///
    /// Writes `page_{n}.txt` for every page, `full_text.txt`, the images,
    /// and finally `summary.json`.
    pub fn walk(&self, process_dir: &Path) -> Result<DocumentSummary> {
        let pages = self.write_pages(process_dir)?;

        let full_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);
        let full_text_path = process_dir.join(FULL_TEXT_FILE);
        fs::write(&full_text_path, &full_text)?;

        let mut summary = DocumentSummary::new(full_text_path);
        for page in pages {
            summary.text_files.extend(page.text_file);
            summary
                .images
                .extend(page.images.into_iter().map(ImageEntry::Embedded));
        }
        log::info!(
            "Extracted {} pages and {} images into {}",
            summary.text_files.len(),
            summary.images.len(),
            process_dir.display()
        );
        summary.write(process_dir)?;

        Ok(summary)
    }
}
