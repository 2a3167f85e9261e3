//! Content-stream interpretation into positioned word tokens.
//!
//! Tracks the graphics and text state closely enough to place each shown
//! string on the page: `q`/`Q`/`cm` for the CTM, the `T*` family for the
//! text matrix, and the font's `Widths` array for advances. Each shown
//! string is then split on whitespace into word tokens.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::Token;

/// Ascender height as a fraction of the font size.
const ASCENT: f64 = 0.8;

/// Glyph width (in 1/1000 em) used when a font declares none.
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// TJ/Tj text state for one page's content stream.
pub struct TokenExtractor<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    page: u32,
    page_height: f64,
    page_offset: f64,
    origin: (f64, f64),
}

impl<'a> TokenExtractor<'a> {
    /// Create an extractor for one page.
    ///
    /// `page_offset` is the summed height of all earlier pages, used to
    /// compute each token's `doctop`.
    pub fn new(
        doc: &'a LopdfDocument,
        fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
        page: u32,
        page_height: f64,
        page_offset: f64,
    ) -> Self {
        Self {
            doc,
            fonts,
            page,
            page_height,
            page_offset,
            origin: (0.0, 0.0),
        }
    }

    /// Set the lower-left corner of the page's MediaBox.
    ///
    /// Token coordinates are relative to this corner.
    pub fn with_origin(mut self, llx: f64, lly: f64) -> Self {
        self.origin = (llx, lly);
        self
    }

    /// Interpret a decoded content stream and return its word tokens.
    pub fn extract(&self, content: &[u8]) -> Result<Vec<Token>> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut state = TextState::default();
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut metrics = FontMetrics::default();
        let mut tokens = Vec::new();

        for op in content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => ctm_stack.push(state.ctm),
                "Q" => {
                    if let Some(ctm) = ctm_stack.pop() {
                        state.ctm = ctm;
                    }
                }
                "cm" => {
                    if let Some(m) = matrix_from(operands) {
                        state.ctm = m.multiply(&state.ctm);
                    }
                }
                "BT" => {
                    state.tm = Matrix::IDENTITY;
                    state.tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    if operands.len() >= 2 {
                        if let Object::Name(name) = &operands[0] {
                            metrics = self
                                .fonts
                                .get(name.as_slice())
                                .map(|dict| FontMetrics::from_dict(self.doc, dict))
                                .unwrap_or_default();
                            state.font = name.clone();
                        }
                        state.font_size = number(&operands[1]).unwrap_or(12.0);
                    }
                }
                "Tc" => state.char_spacing = first_number(operands).unwrap_or(0.0),
                "Tw" => state.word_spacing = first_number(operands).unwrap_or(0.0),
                "Tz" => state.h_scale = first_number(operands).unwrap_or(100.0) / 100.0,
                "TL" => state.leading = first_number(operands).unwrap_or(0.0),
                "Td" | "TD" => {
                    if operands.len() >= 2 {
                        let tx = number(&operands[0]).unwrap_or(0.0);
                        let ty = number(&operands[1]).unwrap_or(0.0);
                        if op.operator == "TD" {
                            state.leading = -ty;
                        }
                        state.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = matrix_from(operands) {
                        state.tm = m;
                        state.tlm = m;
                    }
                }
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&mut state, &metrics, bytes, &mut tokens);
                    }
                }
                "'" => {
                    state.next_line();
                    if let Some(Object::String(bytes, _)) = operands.first() {
                        self.show(&mut state, &metrics, bytes, &mut tokens);
                    }
                }
                "\"" => {
                    if operands.len() >= 3 {
                        state.word_spacing = number(&operands[0]).unwrap_or(0.0);
                        state.char_spacing = number(&operands[1]).unwrap_or(0.0);
                        state.next_line();
                        if let Object::String(bytes, _) = &operands[2] {
                            self.show(&mut state, &metrics, bytes, &mut tokens);
                        }
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        for item in items {
                            match item {
                                Object::String(bytes, _) => {
                                    self.show(&mut state, &metrics, bytes, &mut tokens)
                                }
                                other => {
                                    // Positive adjustments move left, negative move right
                                    if let Some(adjust) = number(other) {
                                        let tx = -adjust / 1000.0 * state.font_size * state.h_scale;
                                        state.tm = Matrix::translation(tx, 0.0).multiply(&state.tm);
                                    }
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(tokens)
    }

    /// Show one string: emit its word tokens and advance the text matrix.
    fn show(&self, state: &mut TextState, metrics: &FontMetrics, bytes: &[u8], out: &mut Vec<Token>) {
        let text = self.decode(&state.font, bytes);
        let advance = metrics.advance(bytes, state);

        let start = state.tm.multiply(&state.ctm);
        state.tm = Matrix::translation(advance, 0.0).multiply(&state.tm);
        let end = state.tm.multiply(&state.ctm);

        if text.trim().is_empty() {
            return;
        }

        let size = state.font_size * start.vertical_scale();
        let (llx, lly) = self.origin;
        let baseline = start.f - lly;
        let top = self.page_height - (baseline + size * ASCENT);
        let (x_start, x_end) = if end.e >= start.e {
            (start.e - llx, end.e - llx)
        } else {
            (end.e - llx, start.e - llx)
        };

        for (text, x0, x1) in split_words(&text, x_start, x_end) {
            out.push(Token::new(text, x0, x1, top).on_page(self.page, self.page_offset));
        }
    }

    /// Decode string bytes with the current font's encoding when available.
    fn decode(&self, font: &[u8], bytes: &[u8]) -> String {
        let encoding = self
            .fonts
            .get(font)
            .and_then(|f| f.get_font_encoding(self.doc).ok());

        if let Some(ref enc) = encoding {
            if let Ok(text) = LopdfDocument::decode_text(enc, bytes) {
                return text;
            }
        }
        decode_text_simple(bytes)
    }
}

/// Split a shown string into whitespace-separated words, distributing the
/// string's horizontal extent uniformly over its characters.
fn split_words(text: &str, x_start: f64, x_end: f64) -> Vec<(String, f64, f64)> {
    let chars: Vec<char> = text.chars().collect();
    let char_width = (x_end - x_start) / chars.len() as f64;

    let mut words = Vec::new();
    let mut begin: Option<usize> = None;
    for (i, c) in chars.iter().enumerate() {
        match (c.is_whitespace(), begin) {
            (false, None) => begin = Some(i),
            (true, Some(b)) => {
                words.push(word(&chars, b, i, x_start, char_width));
                begin = None;
            }
            _ => {}
        }
    }
    if let Some(b) = begin {
        words.push(word(&chars, b, chars.len(), x_start, char_width));
    }
    words
}

fn word(chars: &[char], from: usize, to: usize, x_start: f64, char_width: f64) -> (String, f64, f64) {
    (
        chars[from..to].iter().collect(),
        x_start + from as f64 * char_width,
        x_start + to as f64 * char_width,
    )
}

/// Per-font glyph widths.
#[derive(Debug, Clone)]
struct FontMetrics {
    first_char: i64,
    widths: Vec<f64>,
    two_byte: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            first_char: 0,
            widths: Vec::new(),
            two_byte: false,
        }
    }
}

impl FontMetrics {
    fn from_dict(doc: &LopdfDocument, dict: &Dictionary) -> Self {
        let two_byte = dict
            .get(b"Subtype")
            .ok()
            .and_then(|s| s.as_name().ok())
            .map(|s| s == b"Type0")
            .unwrap_or(false);

        let first_char = dict
            .get(b"FirstChar")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);

        let widths = dict
            .get(b"Widths")
            .ok()
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| number(resolve(doc, w)).unwrap_or(DEFAULT_GLYPH_WIDTH))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            first_char,
            widths,
            two_byte,
        }
    }

    fn glyph_width(&self, code: i64) -> f64 {
        usize::try_from(code - self.first_char)
            .ok()
            .and_then(|i| self.widths.get(i))
            .copied()
            .unwrap_or(DEFAULT_GLYPH_WIDTH)
    }

    /// Horizontal advance in text space for a shown string.
    fn advance(&self, bytes: &[u8], state: &TextState) -> f64 {
        let mut total = 0.0;
        if self.two_byte {
            for _ in bytes.chunks(2) {
                total += DEFAULT_GLYPH_WIDTH / 1000.0 * state.font_size + state.char_spacing;
            }
        } else {
            for &b in bytes {
                total += self.glyph_width(b as i64) / 1000.0 * state.font_size + state.char_spacing;
                if b == b' ' {
                    total += state.word_spacing;
                }
            }
        }
        total * state.h_scale
    }
}

/// Graphics and text state needed for positioning.
#[derive(Debug, Clone)]
struct TextState {
    ctm: Matrix,
    tm: Matrix,
    tlm: Matrix,
    font: Vec<u8>,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    h_scale: f64,
    leading: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            ctm: Matrix::IDENTITY,
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scale: 1.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Matrix::translation(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.leading;
        self.move_line(0.0, -leading);
    }
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f64, ty: f64) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn vertical_scale(&self) -> f64 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

fn matrix_from(operands: &[Object]) -> Option<Matrix> {
    if operands.len() < 6 {
        return None;
    }
    Some(Matrix {
        a: number(&operands[0])?,
        b: number(&operands[1])?,
        c: number(&operands[2])?,
        d: number(&operands[3])?,
        e: number(&operands[4])?,
        f: number(&operands[5])?,
    })
}

/// Follow one level of indirection.
fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Helper to extract number from PDF object.
fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn first_number(operands: &[Object]) -> Option<f64> {
    operands.first().and_then(number)
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with byte order mark
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16(&utf16).unwrap_or_default();
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}
