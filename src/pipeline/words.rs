//! Recognised words: the common currency between the text sources (OCR and
//! the PDF text layer) and the layout stages (tables, paragraphs).

use crate::document::BoundingBox;
use serde::{Deserialize, Serialize};

/// One word with its position on the page.
///
/// `block`, `par` and `line` follow tesseract's hierarchy: words sharing a
/// `(block, par)` belong to one paragraph, words sharing all three to one
/// text line. Text-layer words get synthetic ids with the same meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    /// Position in page points, top-left origin.
    pub bbox: BoundingBox,
    /// 0–100. Text-layer words report 100.
    pub confidence: f32,
    pub block: u32,
    pub par: u32,
    pub line: u32,
}

impl OcrWord {
    pub fn paragraph_key(&self) -> (u32, u32) {
        (self.block, self.par)
    }

    pub fn line_key(&self) -> (u32, u32, u32) {
        (self.block, self.par, self.line)
    }
}

/// Median of a slice of heights, `None` when empty.
pub fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Median word height of a set of words; 0 when empty.
pub fn median_height(words: &[&OcrWord]) -> f32 {
    let mut heights: Vec<f32> = words.iter().map(|w| w.bbox.height()).collect();
    median(&mut heights).unwrap_or(0.0)
}

#[cfg(test)]
pub(crate) fn word(text: &str, left: f32, top: f32, width: f32, height: f32) -> OcrWord {
    OcrWord {
        text: text.to_string(),
        bbox: BoundingBox::new(left, top, left + width, top + height),
        confidence: 95.0,
        block: 1,
        par: 1,
        line: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn median_height_of_words() {
        let a = word("a", 0.0, 0.0, 5.0, 10.0);
        let b = word("b", 0.0, 0.0, 5.0, 12.0);
        let c = word("c", 0.0, 0.0, 5.0, 30.0);
        assert_eq!(median_height(&[&a, &b, &c]), 12.0);
    }
}
