//! Words from the PDF's own text layer.
//!
//! Used when OCR is disabled, or when `force_full_page_ocr` is off and the
//! page already carries programmatic text. pdfium reports individual
//! characters with loose bounds in PDF space (bottom-left origin); we group
//! them into words, lines and paragraphs so the result looks exactly like
//! tesseract output to the layout stages.

use crate::document::BoundingBox;
use crate::error::Ocr2HtmlError;
use crate::pipeline::words::OcrWord;
use pdfium_render::prelude::*;

/// Characters separated by more than this many points start a new word.
const WORD_SPACING_THRESHOLD: f32 = 3.0;

/// A line whose top lies more than this many line heights below the previous
/// line's bottom starts a new paragraph.
const PARAGRAPH_GAP_RATIO: f32 = 0.8;

/// One character in PDF space (bottom-left origin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharBox {
    pub ch: char,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl CharBox {
    fn height(&self) -> f32 {
        (self.top - self.bottom).max(0.0)
    }

    fn y_center(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// Extract words from a loaded pdfium page.
pub fn extract_page_words(page: &PdfPage, page_num: usize) -> Result<Vec<OcrWord>, Ocr2HtmlError> {
    let page_height = page.height().value;
    let text = page.text().map_err(|e| Ocr2HtmlError::TextLayerFailed {
        page: page_num,
        detail: format!("{:?}", e),
    })?;

    let mut chars = Vec::new();
    for pdf_char in text.chars().iter() {
        let Some(ch) = pdf_char.unicode_char() else {
            continue;
        };
        let bounds = pdf_char
            .loose_bounds()
            .map_err(|e| Ocr2HtmlError::TextLayerFailed {
                page: page_num,
                detail: format!("char bounds: {:?}", e),
            })?;
        chars.push(CharBox {
            ch,
            left: bounds.left().value,
            bottom: bounds.bottom().value,
            right: bounds.right().value,
            top: bounds.top().value,
        });
    }

    Ok(group_chars(&chars, page_height))
}

/// Group characters (in content-stream order) into words with line and
/// paragraph ids, converting to top-left page coordinates.
pub fn group_chars(chars: &[CharBox], page_height: f32) -> Vec<OcrWord> {
    let mut words: Vec<OcrWord> = Vec::new();
    let mut current: Vec<CharBox> = Vec::new();

    for &c in chars {
        if c.ch.is_whitespace() || c.ch.is_control() {
            flush_word(&mut current, page_height, &mut words);
            continue;
        }
        if let Some(prev) = current.last() {
            let gap = c.left - prev.right;
            let baseline_shift = (c.y_center() - prev.y_center()).abs();
            if gap > WORD_SPACING_THRESHOLD
                || gap < -prev.height()
                || baseline_shift > prev.height().max(c.height()) / 2.0
            {
                flush_word(&mut current, page_height, &mut words);
            }
        }
        current.push(c);
    }
    flush_word(&mut current, page_height, &mut words);

    assign_lines(&mut words);
    words
}

fn flush_word(chars: &mut Vec<CharBox>, page_height: f32, out: &mut Vec<OcrWord>) {
    if chars.is_empty() {
        return;
    }
    let text: String = chars.iter().map(|c| c.ch).collect();
    let left = chars.iter().map(|c| c.left).fold(f32::MAX, f32::min);
    let right = chars.iter().map(|c| c.right).fold(f32::MIN, f32::max);
    let top_pdf = chars.iter().map(|c| c.top).fold(f32::MIN, f32::max);
    let bottom_pdf = chars.iter().map(|c| c.bottom).fold(f32::MAX, f32::min);
    out.push(OcrWord {
        text,
        bbox: BoundingBox::new(left, page_height - top_pdf, right, page_height - bottom_pdf),
        confidence: 100.0,
        block: 0,
        par: 0,
        line: 0,
    });
    chars.clear();
}

/// Number lines and paragraphs in stream order.
fn assign_lines(words: &mut [OcrWord]) {
    let mut block = 1u32;
    let mut line = 1u32;
    let mut line_box: Option<BoundingBox> = None;

    for w in words.iter_mut() {
        if let Some(lb) = line_box {
            let same_line = (w.bbox.y_center() - lb.y_center()).abs()
                <= lb.height().max(w.bbox.height()) / 2.0
                && w.bbox.left >= lb.left;
            if same_line {
                line_box = Some(lb.union(&w.bbox));
            } else {
                let gap = w.bbox.top - lb.bottom;
                if gap > lb.height() * PARAGRAPH_GAP_RATIO || gap < -lb.height() {
                    block += 1;
                    line = 1;
                } else {
                    line += 1;
                }
                line_box = Some(w.bbox);
            }
        } else {
            line_box = Some(w.bbox);
        }
        w.block = block;
        w.par = 1;
        w.line = line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lay out `text` as 6pt-wide glyphs starting at (x, baseline) in PDF space.
    fn run(text: &str, x: f32, baseline: f32) -> Vec<CharBox> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let left = x + i as f32 * 6.0;
                CharBox {
                    ch,
                    left,
                    bottom: baseline,
                    right: left + 5.5,
                    top: baseline + 10.0,
                }
            })
            .collect()
    }

    #[test]
    fn spaces_split_words_and_coords_flip() {
        let words = group_chars(&run("Hello world", 72.0, 700.0), 792.0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[1].text, "world");
        assert!((words[0].bbox.top - 82.0).abs() < 1e-3);
        assert!((words[0].bbox.bottom - 92.0).abs() < 1e-3);
        assert_eq!(words[0].line_key(), words[1].line_key());
    }

    #[test]
    fn wide_gap_splits_word_without_space() {
        let mut chars = run("Qty", 72.0, 700.0);
        chars.extend(run("12", 200.0, 700.0));
        let words = group_chars(&chars, 792.0);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "12");
    }

    #[test]
    fn consecutive_lines_share_paragraph() {
        let mut chars = run("first line", 72.0, 700.0);
        chars.extend(run("second", 72.0, 688.0));
        let words = group_chars(&chars, 792.0);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].paragraph_key(), words[2].paragraph_key());
        assert_ne!(words[0].line, words[2].line);
    }

    #[test]
    fn large_gap_starts_new_paragraph() {
        let mut chars = run("Heading", 72.0, 700.0);
        chars.extend(run("Body", 72.0, 650.0));
        let words = group_chars(&chars, 792.0);
        assert_ne!(words[0].block, words[1].block);
    }
}
