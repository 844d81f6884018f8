use std::collections::BTreeMap;

use lopdf::{self, content::Content};

use crate::OutlineError;

/// A page identifier mirroring `lopdf::ObjectId`: (object number, generation number).
pub type PageId = (u32, u16);

/// Font information extracted from a page's resource dictionary.
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// The resource-dictionary key (e.g. `b"F1"`).
    pub name: Vec<u8>,
    /// Base font name from the font dictionary, if present.
    pub base_font: Option<String>,
    /// Encoding entry from the font dictionary, if present.
    pub encoding: Option<String>,
}

/// A simplified, lopdf-independent representation of a PDF value.
///
/// Decouples the span collector from the concrete `lopdf::Object` type so
/// the text state machine can be driven by pure data in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
}

impl PdfValue {
    /// Extract a number, accepting both `Integer` and `Real`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfValue::Integer(i) => Some(*i as f64),
            PdfValue::Real(f) => Some(*f),
            _ => None,
        }
    }
}

/// A single content-stream operation (operator + operands).
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

fn convert_object(obj: &lopdf::Object) -> PdfValue {
    match obj {
        lopdf::Object::Boolean(b) => PdfValue::Bool(*b),
        lopdf::Object::Integer(i) => PdfValue::Integer(*i),
        lopdf::Object::Real(f) => PdfValue::Real(*f as f64),
        lopdf::Object::Name(n) => PdfValue::Name(n.clone()),
        lopdf::Object::String(s, _) => PdfValue::Str(s.clone()),
        lopdf::Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Null,
    }
}

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Tries, in order: UTF-16BE with BOM (`\xFE\xFF` prefix), valid UTF-8, and
/// finally Latin-1 with each byte mapped to its code point.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

/// Abstraction over a PDF parsing backend (currently backed by `lopdf`).
///
/// Exists so the span collector can be tested against mock implementations
/// without constructing real PDF byte streams.
pub trait PdfBackend {
    /// Mapping from 1-based page number to [`PageId`].
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Page dimensions `(width, height)` in points.
    fn page_size(&self, page: PageId) -> Result<(f64, f64), OutlineError>;

    /// Font information for every font referenced by the given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>, OutlineError>;

    /// The page's content stream decoded into a sequence of [`ContentOp`]s.
    fn page_ops(&self, page: PageId) -> Result<Vec<ContentOp>, OutlineError>;

    /// Decode raw string bytes from a text-showing operator, using any
    /// font-specific encoding information available for the page.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;
}

/// Concrete [`PdfBackend`] implementation backed by [`lopdf::Document`].
pub struct LopdfBackend {
    doc: lopdf::Document,
}

impl LopdfBackend {
    /// Parse a PDF from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self, OutlineError> {
        let doc =
            lopdf::Document::load_mem(data).map_err(|e| OutlineError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(OutlineError::Encrypted);
        }

        Ok(Self { doc })
    }

    /// Total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Walk up the page tree to find the MediaBox array.
    fn find_media_box(&self, dict: &lopdf::Dictionary) -> Option<Vec<lopdf::Object>> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            match obj {
                lopdf::Object::Array(arr) => return Some(arr.clone()),
                lopdf::Object::Reference(id) => {
                    if let Ok(arr) = self.doc.get_object(*id).and_then(|o| o.as_array()) {
                        return Some(arr.clone());
                    }
                }
                _ => {}
            }
        }

        let parent = dict
            .get(b"Parent")
            .ok()
            .and_then(|o| o.as_reference().ok())
            .and_then(|id| self.doc.get_object(id).ok())
            .and_then(|o| o.as_dict().ok())?;
        self.find_media_box(parent)
    }

    /// Look up the encoding name for a font on a page.
    fn font_encoding_name(&self, page: PageId, font_name: &[u8]) -> Option<String> {
        let fonts = self.doc.get_page_fonts(page).ok()?;
        let font_dict = fonts.get(font_name)?;
        match font_dict.get(b"Encoding").ok()? {
            lopdf::Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            _ => None,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_size(&self, page: PageId) -> Result<(f64, f64), OutlineError> {
        let page_dict = self
            .doc
            .get_object(page)
            .and_then(|o| o.as_dict())
            .map_err(|e| OutlineError::Parse(format!("cannot read page object: {}", e)))?;

        let media_box = self
            .find_media_box(page_dict)
            .ok_or_else(|| OutlineError::Parse("MediaBox not found for page".into()))?;

        let nums: Vec<f64> = media_box
            .iter()
            .filter_map(|obj| match obj {
                lopdf::Object::Integer(i) => Some(*i as f64),
                lopdf::Object::Real(f) => Some(*f as f64),
                _ => None,
            })
            .collect();
        if nums.len() < 4 {
            return Err(OutlineError::Parse(format!(
                "MediaBox has {} numeric elements, expected 4",
                nums.len()
            )));
        }

        Ok((nums[2] - nums[0], nums[3] - nums[1]))
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>, OutlineError> {
        let fonts_map = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| OutlineError::Parse(format!("cannot get page fonts: {}", e)))?;

        let mut result = Vec::with_capacity(fonts_map.len());
        for (name, dict) in &fonts_map {
            let base_font = dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned());

            let encoding = dict.get(b"Encoding").ok().and_then(|o| match o {
                lopdf::Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                _ => None,
            });

            result.push(FontInfo {
                name: name.clone(),
                base_font,
                encoding,
            });
        }

        Ok(result)
    }

    fn page_ops(&self, page: PageId) -> Result<Vec<ContentOp>, OutlineError> {
        let raw = self
            .doc
            .get_page_content(page)
            .map_err(|e| OutlineError::Parse(format!("cannot get page content: {}", e)))?;

        let content = Content::decode(&raw)
            .map_err(|e| OutlineError::Parse(format!("content stream decode error: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        // Identity-H / Identity-V fonts typically use 2-byte CID codes that
        // map to Unicode, so try UTF-16BE first for those.
        if let Some(enc) = self.font_encoding_name(page, font_name) {
            if enc.contains("Identity") && bytes.len() >= 2 && bytes.len() % 2 == 0 {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                let decoded = String::from_utf16_lossy(&units);
                if !decoded.is_empty() && !decoded.chars().all(|c| c == '\u{FFFD}' || c == '\0') {
                    return decoded;
                }
            }
        }

        decode_text_simple(bytes)
    }
}
