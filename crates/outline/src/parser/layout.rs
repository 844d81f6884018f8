//! Span collection: walks page content streams and yields one [`TextLine`]
//! per visually distinct line, in document reading order.
//!
//! The text state machine handles the standard text-positioning and
//! text-showing operators (`BT`/`ET`, `Tf`, `Tm`, `Td`/`TD`/`T*`/`TL`,
//! `Tc`/`Tw`/`Tz`/`Ts`, `Tj`/`TJ`/`'`/`"`). Everything else in the content
//! stream is ignored.

use unicode_normalization::UnicodeNormalization;

use super::backend::{ContentOp, FontInfo, PageId, PdfBackend, PdfValue};
use crate::types::TextLine;
use crate::OutlineError;

/// Spans whose baselines differ by less than this are on the same line.
const Y_TOLERANCE: f64 = 1.0;

/// Approximate character width as a fraction of font size when no glyph
/// metrics are available. 0.5 is a reasonable default for proportional fonts.
const APPROX_CHAR_WIDTH_RATIO: f64 = 0.5;

/// Fraction of the font size above the baseline occupied by ascenders.
const ASCENT_RATIO: f64 = 0.8;

/// Fraction of the font size below the baseline occupied by descenders.
const DESCENT_RATIO: f64 = 0.2;

/// A line whose left edge is within this many points of the horizontal page
/// center counts as centered.
const CENTER_TOLERANCE: f64 = 50.0;

/// A single run of text at a specific position on the page.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    /// Baseline Y in PDF coordinates (origin bottom-left).
    pub y: f64,
    pub font_size: f64,
    pub is_bold: bool,
    pub is_italic: bool,
}

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Mutable state tracked while walking a page's content stream.
#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_size: f64,
    text_matrix: [f64; 6],
    line_matrix: [f64; 6],
    horiz_scale: f64,
    char_spacing: f64,
    word_spacing: f64,
    text_rise: f64,
    leading: f64,
    is_bold: bool,
    is_italic: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
            is_bold: false,
            is_italic: false,
        }
    }
}

impl TextState {
    fn x(&self) -> f64 {
        self.text_matrix[4]
    }

    fn y(&self) -> f64 {
        self.text_matrix[5]
    }

    /// Effective font size accounting for the text matrix vertical scale.
    fn effective_font_size(&self) -> f64 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    fn advance_x(&mut self, dx: f64) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Translate the line matrix (Td / TD / T*) and reset the text matrix.
    fn translate_line(&mut self, tx: f64, ty: f64) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }

    /// Apply `Tf`: set font and size, detect bold/italic from the base-font
    /// name. "Oblique" counts as italic.
    fn set_font(&mut self, key: Vec<u8>, base_font: &str, size: f64) {
        let upper = base_font.to_uppercase();
        self.is_bold = upper.contains("BOLD");
        self.is_italic = upper.contains("ITALIC") || upper.contains("OBLIQUE");
        self.font_key = key;
        self.font_size = size;
    }

    /// Advance the text matrix after showing `text`.
    fn advance_after_show(&mut self, text: &str) {
        let mut dx = 0.0;
        for ch in text.chars() {
            dx += self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale + self.char_spacing;
            if ch == ' ' {
                dx += self.word_spacing;
            }
        }
        self.advance_x(dx);
    }
}

fn first_number(operands: &[PdfValue]) -> Option<f64> {
    operands.first().and_then(PdfValue::as_number)
}

fn decode_operand(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    font_key: &[u8],
) -> String {
    match operand {
        PdfValue::Str(bytes) => {
            let decoded = backend.decode_text(page_id, font_key, bytes);
            if decoded.is_empty() {
                super::backend::decode_text_simple(bytes)
            } else {
                decoded
            }
        }
        _ => String::new(),
    }
}

fn emit_span(text: String, state: &TextState, spans: &mut Vec<TextSpan>) {
    if text.is_empty() {
        return;
    }
    spans.push(TextSpan {
        text: text.nfc().collect(),
        x: state.x(),
        y: state.y() + state.text_rise,
        font_size: state.effective_font_size(),
        is_bold: state.is_bold,
        is_italic: state.is_italic,
    });
}

fn show_string(
    operand: &PdfValue,
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let text = decode_operand(operand, backend, page_id, &state.font_key);
    if text.is_empty() {
        return;
    }
    emit_span(text.clone(), state, spans);
    state.advance_after_show(&text);
}

/// Process a `TJ` array: strings to show interleaved with numeric kerning
/// adjustments (thousandths of a text-space unit). Large rightward
/// adjustments become spaces inside the accumulated run.
fn show_adjusted(
    arr: &[PdfValue],
    backend: &dyn PdfBackend,
    page_id: PageId,
    state: &mut TextState,
    spans: &mut Vec<TextSpan>,
) {
    let mut buf = String::new();
    let mut start_state = state.clone();

    for elem in arr {
        match elem {
            PdfValue::Str(_) => {
                let fragment = decode_operand(elem, backend, page_id, &state.font_key);
                if buf.is_empty() {
                    start_state = state.clone();
                }
                buf.push_str(&fragment);
                state.advance_after_show(&fragment);
            }
            val => {
                if let Some(adj) = val.as_number() {
                    let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                    let gap_threshold =
                        state.font_size * APPROX_CHAR_WIDTH_RATIO * state.horiz_scale * 0.3;
                    if dx > gap_threshold && !buf.is_empty() {
                        buf.push(' ');
                    }
                    state.advance_x(dx);
                }
            }
        }
    }

    emit_span(buf, &start_state, spans);
}

fn resolve_font<'a>(key: &[u8], fonts: &'a [FontInfo]) -> Option<&'a FontInfo> {
    fonts.iter().find(|info| info.name == key)
}

fn handle_tf(operands: &[PdfValue], fonts: &[FontInfo], state: &mut TextState) {
    if operands.len() < 2 {
        return;
    }
    let key = match &operands[0] {
        PdfValue::Name(n) => n.clone(),
        PdfValue::Str(s) => s.clone(),
        _ => return,
    };
    let size = operands[1].as_number().unwrap_or(0.0);
    match resolve_font(&key, fonts) {
        Some(info) => {
            let base = info.base_font.clone().unwrap_or_default();
            state.set_font(key, &base, size);
        }
        None => {
            // Font not in the resource dict; fall back to the key itself so
            // style tokens embedded in the name still register.
            let name = String::from_utf8_lossy(&key).to_string();
            state.set_font(key, &name, size);
        }
    }
}

/// Walk a single page's content stream and produce a flat list of
/// [`TextSpan`]s in stream order.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, OutlineError> {
    let ops = backend.page_ops(page_id)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();

    let mut state = TextState::default();
    let mut spans: Vec<TextSpan> = Vec::new();

    for ContentOp { operator, operands } in &ops {
        match operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            // Font state persists across text objects; some PDFs rely on it.
            "ET" => {}
            "Tf" => handle_tf(operands, &fonts, &mut state),
            "Tm" => {
                let vals: Vec<f64> = operands
                    .iter()
                    .take(6)
                    .filter_map(PdfValue::as_number)
                    .collect();
                if vals.len() == 6 {
                    state.text_matrix = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    state.line_matrix = state.text_matrix;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = operands[0].as_number().unwrap_or(0.0);
                    let ty = operands[1].as_number().unwrap_or(0.0);
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // Equivalent to: -ty TL ; tx ty Td
                if operands.len() >= 2 {
                    let tx = operands[0].as_number().unwrap_or(0.0);
                    let ty = operands[1].as_number().unwrap_or(0.0);
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.translate_line(0.0, -state.leading),
            "TL" => {
                if let Some(v) = first_number(operands) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number(operands) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number(operands) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number(operands) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number(operands) {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    show_adjusted(arr, backend, page_id, &mut state, &mut spans);
                }
            }
            "'" => {
                state.translate_line(0.0, -state.leading);
                if let Some(first) = operands.first() {
                    show_string(first, backend, page_id, &mut state, &mut spans);
                }
            }
            "\"" => {
                // " aw ac string  =>  set Tw, Tc, then T* and Tj.
                if operands.len() >= 3 {
                    if let Some(aw) = operands[0].as_number() {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = operands[1].as_number() {
                        state.char_spacing = ac;
                    }
                    state.translate_line(0.0, -state.leading);
                    show_string(&operands[2], backend, page_id, &mut state, &mut spans);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

/// Group spans sharing a baseline into per-line clusters.
///
/// Spans are sorted top-to-bottom (descending PDF Y), then left-to-right.
fn cluster_by_baseline(mut spans: Vec<TextSpan>) -> Vec<Vec<TextSpan>> {
    if spans.is_empty() {
        return Vec::new();
    }

    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut clusters: Vec<Vec<TextSpan>> = Vec::new();
    let mut current: Vec<TextSpan> = vec![spans.remove(0)];
    let mut current_y = current[0].y;

    for span in spans {
        if (span.y - current_y).abs() <= Y_TOLERANCE {
            current.push(span);
        } else {
            clusters.push(std::mem::take(&mut current));
            current_y = span.y;
            current.push(span);
        }
    }
    clusters.push(current);

    clusters
}

/// Assemble one [`TextLine`] from spans known to share a baseline.
///
/// Returns `None` when the concatenated text is empty after trimming; such
/// lines are dropped entirely and never act as a gap reference.
fn assemble_line(
    mut spans: Vec<TextSpan>,
    page: u32,
    page_width: f64,
    page_height: f64,
) -> Option<(TextLine, f64)> {
    spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));

    let text = spans
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }

    let font_size = spans.iter().map(|s| s.font_size).fold(0.0, f64::max);
    let is_bold = spans.iter().any(|s| s.is_bold);
    let is_italic = spans.iter().any(|s| s.is_italic);
    let x0 = spans
        .iter()
        .map(|s| s.x)
        .fold(f64::INFINITY, f64::min)
        .min(page_width);
    let baseline = spans.iter().map(|s| s.y).fold(f64::NEG_INFINITY, f64::max);

    // Convert to top-down coordinates, approximating the line box from the
    // baseline and font size.
    let y0 = (page_height - baseline - font_size * ASCENT_RATIO).max(0.0);
    let y1 = y0 + font_size * (ASCENT_RATIO + DESCENT_RATIO);

    let line = TextLine {
        text,
        font_size,
        is_bold,
        is_italic,
        is_centered: (x0 - page_width / 2.0).abs() < CENTER_TOLERANCE,
        page,
        x0,
        y0,
        y1,
        gap_above: 0.0,
        page_width,
        page_height,
    };
    Some((line, y1))
}

/// Collect every non-empty text line in the document, in reading order.
///
/// `gap_above` is the distance from the previous non-empty line's bottom
/// edge; the reference point deliberately carries across page boundaries,
/// and the very first line of the document gets 0.
pub fn collect_lines(backend: &dyn PdfBackend) -> Result<Vec<TextLine>, OutlineError> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut prev_bottom: Option<f64> = None;

    for (&page_num, &page_id) in &backend.pages() {
        let (page_width, page_height) = backend.page_size(page_id)?;
        let spans = extract_page_spans(backend, page_id)?;

        for cluster in cluster_by_baseline(spans) {
            if let Some((mut line, bottom)) =
                assemble_line(cluster, page_num, page_width, page_height)
            {
                line.gap_above = match prev_bottom {
                    Some(prev) => line.y0 - prev,
                    None => 0.0,
                };
                prev_bottom = Some(bottom);
                lines.push(line);
            }
        }
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    /// In-memory backend feeding canned content ops to the state machine.
    struct MockBackend {
        pages: BTreeMap<u32, PageId>,
        ops: BTreeMap<PageId, Vec<ContentOp>>,
        fonts: Vec<FontInfo>,
        size: (f64, f64),
    }

    impl MockBackend {
        fn single_page(ops: Vec<ContentOp>, fonts: Vec<FontInfo>) -> Self {
            let mut pages = BTreeMap::new();
            pages.insert(1, (1, 0));
            let mut op_map = BTreeMap::new();
            op_map.insert((1, 0), ops);
            Self {
                pages,
                ops: op_map,
                fonts,
                size: (612.0, 792.0),
            }
        }
    }

    impl PdfBackend for MockBackend {
        fn pages(&self) -> BTreeMap<u32, PageId> {
            self.pages.clone()
        }

        fn page_size(&self, _page: PageId) -> Result<(f64, f64), OutlineError> {
            Ok(self.size)
        }

        fn page_fonts(&self, _page: PageId) -> Result<Vec<FontInfo>, OutlineError> {
            Ok(self.fonts.clone())
        }

        fn page_ops(&self, page: PageId) -> Result<Vec<ContentOp>, OutlineError> {
            Ok(self.ops.get(&page).cloned().unwrap_or_default())
        }

        fn decode_text(&self, _page: PageId, _font: &[u8], bytes: &[u8]) -> String {
            super::super::backend::decode_text_simple(bytes)
        }
    }

    fn op(operator: &str, operands: Vec<PdfValue>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn tf(font: &str, size: f64) -> ContentOp {
        op(
            "Tf",
            vec![
                PdfValue::Name(font.as_bytes().to_vec()),
                PdfValue::Real(size),
            ],
        )
    }

    fn td(x: f64, y: f64) -> ContentOp {
        op("Td", vec![PdfValue::Real(x), PdfValue::Real(y)])
    }

    fn tj(text: &str) -> ContentOp {
        op("Tj", vec![PdfValue::Str(text.as_bytes().to_vec())])
    }

    #[test]
    fn two_lines_in_reading_order() {
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 18.0),
                td(72.0, 700.0),
                tj("Introduction"),
                tf("F1", 10.0),
                td(0.0, -30.0),
                tj("Body text here."),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Introduction");
        assert_eq!(lines[0].font_size, 18.0);
        assert_eq!(lines[0].page, 1);
        assert_eq!(lines[1].text, "Body text here.");
        // First line of the document has no gap reference.
        assert_eq!(lines[0].gap_above, 0.0);
        assert!(lines[1].gap_above > 0.0);
        assert!(lines[1].y0 > lines[0].y0);
    }

    #[test]
    fn spans_on_same_baseline_join_with_spaces() {
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 12.0),
                td(72.0, 700.0),
                tj("Hello"),
                tj("world"),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
    }

    #[test]
    fn whitespace_only_lines_are_dropped() {
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 12.0),
                td(72.0, 700.0),
                tj("   "),
                td(0.0, -20.0),
                tj("Real text"),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Real text");
        // The dropped line must not act as a gap reference either.
        assert_eq!(lines[0].gap_above, 0.0);
    }

    #[test]
    fn bold_italic_from_resource_font_name() {
        let fonts = vec![FontInfo {
            name: b"F1".to_vec(),
            base_font: Some("Helvetica-BoldOblique".to_string()),
            encoding: None,
        }];
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 14.0),
                td(72.0, 700.0),
                tj("Styled"),
                op("ET", vec![]),
            ],
            fonts,
        );

        let lines = collect_lines(&backend).unwrap();
        assert!(lines[0].is_bold);
        assert!(lines[0].is_italic);
    }

    #[test]
    fn line_max_font_size_wins() {
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 10.0),
                td(72.0, 700.0),
                tj("small"),
                tf("F2", 16.0),
                tj("LARGE"),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].font_size, 16.0);
    }

    #[test]
    fn centered_line_detection() {
        // Page width 612 => center 306. x0 = 280 is within tolerance.
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 20.0),
                td(280.0, 700.0),
                tj("Title"),
                td(-208.0, -40.0),
                tj("Left-aligned body"),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert!(lines[0].is_centered);
        assert!(!lines[1].is_centered);
    }

    #[test]
    fn tj_array_inserts_word_gaps() {
        let arr = PdfValue::Array(vec![
            PdfValue::Str(b"Hel".to_vec()),
            PdfValue::Real(-20.0), // small kerning, no space
            PdfValue::Str(b"lo".to_vec()),
            PdfValue::Real(-300.0), // large rightward shift => space
            PdfValue::Str(b"there".to_vec()),
        ]);
        let backend = MockBackend::single_page(
            vec![
                op("BT", vec![]),
                tf("F1", 12.0),
                td(72.0, 700.0),
                op("TJ", vec![arr]),
                op("ET", vec![]),
            ],
            vec![],
        );

        let lines = collect_lines(&backend).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello there");
    }

    #[test]
    fn empty_document_yields_no_lines() {
        let backend = MockBackend::single_page(vec![], vec![]);
        assert!(collect_lines(&backend).unwrap().is_empty());
    }
}
