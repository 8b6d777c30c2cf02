use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};

use super::ReportError;

pub(crate) const PAGE_WIDTH: f32 = 210.0;
pub(crate) const PAGE_HEIGHT: f32 = 297.0;
pub(crate) const MARGIN_LEFT: f32 = 18.0;
pub(crate) const MARGIN_RIGHT: f32 = PAGE_WIDTH - 18.0;
const MARGIN_TOP: f32 = PAGE_HEIGHT - 20.0;
const MARGIN_BOTTOM: f32 = 20.0;
const LAYER: &str = "Layer 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Weight {
    Regular,
    Bold,
}

/// A4 page writer with a top-down cursor that starts new pages as needed.
pub(crate) struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    cursor: f32,
    pages: usize,
}

impl Canvas {
    pub(crate) fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(ReportError::pdf)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(ReportError::pdf)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: MARGIN_TOP,
            pages: 1,
        })
    }

    pub(crate) fn pages(&self) -> usize {
        self.pages
    }

    /// Writes text at the cursor height without moving it.
    pub(crate) fn text_at(&self, x: f32, size: f32, weight: Weight, text: &str) {
        let font = match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        };
        self.layer
            .use_text(pdf_safe(text), size, Mm(x), Mm(self.cursor), font);
    }

    /// Writes one line at the left margin and moves below it.
    pub(crate) fn line(&mut self, size: f32, weight: Weight, text: &str) {
        let height = line_height(size);
        self.ensure_room(height);
        self.text_at(MARGIN_LEFT, size, weight, text);
        self.cursor -= height;
    }

    /// Writes cells at the given x offsets as one row.
    pub(crate) fn row(&mut self, size: f32, weight: Weight, cells: &[(f32, &str)]) {
        let height = line_height(size);
        self.ensure_room(height);
        for (x, text) in cells {
            self.text_at(*x, size, weight, text);
        }
        self.cursor -= height;
    }

    pub(crate) fn rule(&mut self) {
        self.ensure_room(4.0);
        let y = self.cursor + 1.5;
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(y)), false),
                (Point::new(Mm(MARGIN_RIGHT), Mm(y)), false),
            ],
            is_closed: false,
        });
        self.cursor -= 3.0;
    }

    pub(crate) fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    /// Starts a new page when fewer than `height` millimetres remain.
    pub(crate) fn ensure_room(&mut self, height: f32) -> bool {
        if self.cursor - height >= MARGIN_BOTTOM {
            return false;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = MARGIN_TOP;
        self.pages += 1;
        true
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>, ReportError> {
        self.doc.save_to_bytes().map_err(ReportError::pdf)
    }
}

pub(crate) fn line_height(size: f32) -> f32 {
    size * 0.5 + 1.5
}

/// Built-in fonts only cover Latin-1; fold the rest to ASCII.
pub(crate) fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'ñ' => 'n',
            'Ñ' => 'N',
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2013}' | '\u{2014}' => '-',
            '\n' | '\r' | '\t' => ' ',
            ch if ch.is_ascii() => ch,
            _ => '?',
        })
        .collect()
}

/// Cuts `text` to `max` characters, marking the cut with an ellipsis.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let kept: String = flat.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Splits `text` into lines of at most `width` characters on word boundaries.
pub(crate) fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let word = truncate(word, width);
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_documents_spill_onto_new_pages() {
        let mut canvas = Canvas::new("pagination").expect("canvas");
        for index in 0..120 {
            canvas.line(10.0, Weight::Regular, &format!("row {index}"));
        }
        assert!(canvas.pages() > 1);
        let bytes = canvas.finish().expect("pdf");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn text_is_folded_and_truncated() {
        assert_eq!(pdf_safe("Peñafrancia – Año"), "Penafrancia - Ano");
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer activity line", 12), "a much lo...");
    }

    #[test]
    fn wrap_breaks_on_words() {
        assert_eq!(
            wrap("quick to learn and dependable", 12),
            vec!["quick to", "learn and", "dependable"]
        );
        assert!(wrap("   ", 10).is_empty());
    }
}
