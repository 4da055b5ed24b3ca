//! Text-only PDF layout on top of `printpdf`'s built-in Helvetica.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rgb,
};

use crate::error::MeetmindError;

pub const PRIMARY: (f32, f32, f32) = (37.0, 99.0, 235.0);
pub const MUTED: (f32, f32, f32) = (100.0, 116.0, 139.0);
pub const BODY: (f32, f32, f32) = (40.0, 40.0, 40.0);

#[derive(Debug, Clone, Copy)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

pub const A4_PORTRAIT: PageSize = PageSize {
    width: 210.0,
    height: 297.0,
};

pub const A4_LANDSCAPE: PageSize = PageSize {
    width: 297.0,
    height: 210.0,
};

const MARGIN: f32 = 20.0;
const FOOTER: f32 = 15.0;

fn render_err(e: impl std::fmt::Display) -> MeetmindError {
    MeetmindError::RenderError(format!("pdf: {e}"))
}

/// A document written top to bottom; `y` counts millimetres from the top edge.
pub struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    size: PageSize,
    y: f32,
    page: u32,
    footer: Option<String>,
}

impl PdfWriter {
    pub fn new(title: &str, size: PageSize) -> Result<Self, MeetmindError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(size.width), Mm(size.height), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            size,
            y: MARGIN,
            page: 1,
            footer: None,
        })
    }

    /// Footer text stamped on every page along with the page number.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    /// Draws `text` at (`x`, current `y`) without moving the cursor.
    pub fn text_at(&self, x: f32, text: &str, size: f32, bold: bool, rgb: (f32, f32, f32)) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            rgb.0 / 255.0,
            rgb.1 / 255.0,
            rgb.2 / 255.0,
            None,
        )));
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(
            winansi(text),
            size,
            Mm(x),
            Mm(self.size.height - self.y),
            font,
        );
    }

    /// Writes one line at the left margin and advances by `advance` mm.
    pub fn line(&mut self, text: &str, size: f32, bold: bool, advance: f32) {
        self.ensure_space(advance);
        self.text_at(MARGIN, text, size, bold, BODY);
        self.y += advance;
    }

    pub fn heading(&mut self, text: &str) {
        self.ensure_space(14.0);
        self.y += 4.0;
        self.text_at(MARGIN, text, 14.0, true, PRIMARY);
        self.y += 8.0;
    }

    pub fn gap(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Starts a new page when fewer than `needed` mm remain above the footer.
    /// Returns whether a page break happened.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed <= self.size.height - MARGIN - FOOTER {
            return false;
        }
        self.stamp_footer();
        let (page, layer) = self.doc.add_page(
            Mm(self.size.width),
            Mm(self.size.height),
            format!("Page {}", self.page + 1),
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.page += 1;
        self.y = MARGIN;
        true
    }

    fn stamp_footer(&mut self) {
        let saved = self.y;
        self.y = self.size.height - 6.0;
        if let Some(footer) = self.footer.clone() {
            self.text_at(MARGIN, &footer, 9.0, false, MUTED);
        }
        let label = format!("Page {}", self.page);
        self.text_at(self.size.width - MARGIN - 12.0, &label, 8.0, false, MUTED);
        self.y = saved;
    }

    pub fn finish(mut self) -> Result<Vec<u8>, MeetmindError> {
        self.stamp_footer();
        self.doc.save_to_bytes().map_err(render_err)
    }
}

/// Characters the built-in fonts can encode: printable ASCII, Latin-1 and
/// the Windows-1252 extras in 0x80..0x9F.
fn is_winansi(c: char) -> bool {
    matches!(c, ' '..='~' | '\u{A0}'..='\u{FF}')
        || "€‚ƒ„…†‡ˆ‰Š‹ŒŽ‘’“”•–—˜™š›œžŸ".contains(c)
}

/// Replaces what WinAnsi cannot encode with `?` so nothing is dropped silently.
pub fn winansi(s: &str) -> String {
    s.chars()
        .map(|c| if is_winansi(c) { c } else { '?' })
        .collect()
}

/// Shortens `s` to at most `max` characters, marking the cut with "...".
pub fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// "$12.34" from cents.
pub fn money(cents: f64) -> String {
    format!("${:.2}", cents / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_produces_a_pdf_and_breaks_pages() {
        let mut pdf = PdfWriter::new("test", A4_PORTRAIT)
            .expect("pdf")
            .with_footer("footer");
        let mut breaks = 0;
        for i in 0..80 {
            if pdf.ensure_space(7.0) {
                breaks += 1;
            }
            pdf.line(&format!("line {i}"), 11.0, false, 7.0);
        }
        assert!(breaks >= 1);
        let bytes = pdf.finish().expect("bytes");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn unencodable_characters_become_question_marks() {
        assert_eq!(winansi("Café – naïve €5"), "Café – naïve €5");
        assert_eq!(winansi("张伟 Ōtani"), "?? ?tani");
        assert_eq!(winansi("Тьютор"), "??????");
        assert_eq!(winansi("tab\there"), "tab?here");
    }

    #[test]
    fn clip_and_money() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("a very long meeting name", 10), "a very ...");
        assert_eq!(money(123456.0), "$1234.56");
    }
}
