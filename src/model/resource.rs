//! Raster images decoded from a PDF.

/// A decoded embedded image ready to be written to disk.
#[derive(Debug, Clone)]
pub struct RasterImage {
    /// Encoded file bytes
    pub data: Vec<u8>,

    /// File extension without the dot (e.g., "png", "jpg")
    pub extension: String,

    /// Width in pixels
    pub width: Option<u32>,

    /// Height in pixels
    pub height: Option<u32>,
}

impl RasterImage {
    /// Create a new image.
    pub fn new(data: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            data,
            extension: extension.into(),
            width: None,
            height: None,
        }
    }

    /// Set pixel dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Filename used inside the process directory.
    pub fn file_name(&self, page: u32, img_index: u32) -> String {
        format!("page_{}_img_{}.{}", page, img_index, self.extension)
    }

    /// Size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}
