//! PDF backend abstraction layer.
//!
//! The walker only needs a handful of per-page queries. Putting them
//! behind [`PdfBackend`] keeps lopdf out of the walker and lets tests
//! drive it with synthetic pages.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::content::TokenExtractor;
use super::images;
use crate::error::{Error, Result};
use crate::model::{RasterImage, Token};

/// US Letter, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f64, f64) = (612.0, 792.0);

/// Page-tree attributes are inherited at most this many levels up.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Abstract interface for per-page PDF access.
pub trait PdfBackend {
    /// Page numbers (1-indexed) in document order.
    fn page_numbers(&self) -> Vec<u32>;

    /// Page width and height in PDF units.
    fn page_size(&self, page: u32) -> Result<(f64, f64)>;

    /// The decoder's own text for a page.
    fn raw_text(&self, page: u32) -> Result<String>;

    /// Positioned word tokens for a page.
    ///
    /// `page_offset` is the summed height of all preceding pages.
    fn tokens(&self, page: u32, page_offset: f64) -> Result<Vec<Token>>;

    /// Every image on a page in order, including the ones that failed.
    fn images(&self, page: u32) -> Result<Vec<Result<RasterImage>>>;
}

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already-parsed document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages();
        Self { doc, pages }
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    /// Look up a page attribute, following `/Parent` links.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    /// Normalized `[llx, lly, urx, ury]` of a page, Letter-sized at the
    /// origin when missing.
    fn media_box(&self, page_id: ObjectId) -> [f64; 4] {
        let values: Vec<f64> = self
            .inherited(page_id, b"MediaBox")
            .and_then(|b| b.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| self.resolve(v).as_float().ok())
                    .map(f64::from)
                    .collect()
            })
            .unwrap_or_default();

        if values.len() < 4 {
            return [0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1];
        }
        [
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ]
    }

    fn resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        self.inherited(page_id, b"Resources")?.as_dict().ok()
    }

    /// Get page content stream, concatenating content arrays.
    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(c) => c,
            Err(_) => return Ok(Vec::new()),
        };

        let mut content = Vec::new();
        match contents {
            Object::Reference(id) => self.append_stream(*id, &mut content)?,
            Object::Array(arr) => {
                for item in arr {
                    if let Ok(id) = item.as_reference() {
                        self.append_stream(id, &mut content)?;
                        content.push(b'\n');
                    }
                }
            }
            _ => {}
        }
        Ok(content)
    }

    fn append_stream(&self, id: ObjectId, out: &mut Vec<u8>) -> Result<()> {
        if let Ok(Object::Stream(stream)) = self.doc.get_object(id) {
            // Unfiltered streams are returned as-is
            let data = if stream.dict.get(b"Filter").is_ok() {
                stream
                    .decompressed_content()
                    .map_err(|e| Error::PdfParse(e.to_string()))?
            } else {
                stream.content.clone()
            };
            out.extend_from_slice(&data);
        }
        Ok(())
    }
}

impl PdfBackend for LopdfBackend {
    fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    fn page_size(&self, page: u32) -> Result<(f64, f64)> {
        let [llx, lly, urx, ury] = self.media_box(self.page_id(page)?);
        Ok((urx - llx, ury - lly))
    }

    fn raw_text(&self, page: u32) -> Result<String> {
        self.doc
            .extract_text(&[page])
            .map_err(|e| Error::TextExtract(format!("Page {}: {}", page, e)))
    }

    fn tokens(&self, page: u32, page_offset: f64) -> Result<Vec<Token>> {
        let page_id = self.page_id(page)?;
        let [llx, lly, _, ury] = self.media_box(page_id);

        let fonts = self
            .doc
            .get_page_fonts(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;
        let content = self.page_content(page_id)?;

        TokenExtractor::new(&self.doc, fonts, page, ury - lly, page_offset)
            .with_origin(llx, lly)
            .extract(&content)
    }

    fn images(&self, page: u32) -> Result<Vec<Result<RasterImage>>> {
        let page_id = self.page_id(page)?;
        Ok(match self.resources(page_id) {
            Some(resources) => images::page_images(&self.doc, resources),
            None => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};

    fn one_page_doc(media_box: Vec<Object>, on_parent: bool) -> LopdfDocument {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 500.into()]),
                Operation::new("Tj", vec![Object::string_literal("Hello backend")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        };
        let mut pages = dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        };
        if on_parent {
            pages.set("MediaBox", media_box);
        } else {
            page.set("MediaBox", media_box);
        }
        let page_id = doc.add_object(page);
        pages.set("Kids", vec![Object::Reference(page_id)]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    #[test]
    fn test_page_size_from_media_box() {
        let doc = one_page_doc(vec![0.into(), 0.into(), 400.into(), 600.into()], false);
        let backend = LopdfBackend::from_document(doc);
        assert_eq!(backend.page_numbers(), vec![1]);
        assert_eq!(backend.page_size(1).unwrap(), (400.0, 600.0));
    }

    #[test]
    fn test_page_size_inherited_from_parent() {
        let doc = one_page_doc(vec![0.into(), 0.into(), 500.into(), 700.into()], true);
        let backend = LopdfBackend::from_document(doc);
        assert_eq!(backend.page_size(1).unwrap(), (500.0, 700.0));
    }

    #[test]
    fn test_page_out_of_range() {
        let doc = one_page_doc(vec![0.into(), 0.into(), 612.into(), 792.into()], false);
        let backend = LopdfBackend::from_document(doc);
        assert!(matches!(
            backend.page_size(3),
            Err(Error::PageOutOfRange(3, 1))
        ));
    }

    #[test]
    fn test_tokens_from_inherited_font() {
        let doc = one_page_doc(vec![0.into(), 0.into(), 612.into(), 792.into()], false);
        let backend = LopdfBackend::from_document(doc);

        let tokens = backend.tokens(1, 0.0).unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello", "backend"]);
        assert!((tokens[0].x0 - 72.0).abs() < 1e-6);
        assert!(tokens[0].x1 < tokens[1].x0);
    }

    #[test]
    fn test_tokens_relative_to_media_box_origin() {
        let doc = one_page_doc(vec![100.into(), 50.into(), 712.into(), 842.into()], false);
        let backend = LopdfBackend::from_document(doc);
        assert_eq!(backend.page_size(1).unwrap(), (612.0, 792.0));

        // Td 72 500 sits 28 units left of the box edge
        let tokens = backend.tokens(1, 0.0).unwrap();
        assert!((tokens[0].x0 + 28.0).abs() < 1e-6);
        assert!((tokens[0].top - (842.0 - 500.0 - 12.0 * 0.8)).abs() < 1e-6);
    }

    #[test]
    fn test_page_without_images() {
        let doc = one_page_doc(vec![0.into(), 0.into(), 612.into(), 792.into()], false);
        let backend = LopdfBackend::from_document(doc);
        assert!(backend.images(1).unwrap().is_empty());
    }
}
