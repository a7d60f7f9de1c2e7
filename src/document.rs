//! The structured document produced by a conversion.
//!
//! A [`ConvertedDocument`] is a flat, reading-ordered list of [`DocItem`]s
//! plus per-page geometry. Every item records where it came from
//! ([`Provenance`]) so downstream consumers can map HTML back onto the scan.
//!
//! Coordinates are PDF points (1/72 inch) with a **top-left** origin, the
//! same orientation as the rasterised page images the OCR engine reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle in page points, top-left origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }

    pub fn x_center(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn y_center(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Union of an iterator of boxes, `None` when empty.
    pub fn enclosing<'a>(boxes: impl IntoIterator<Item = &'a BoundingBox>) -> Option<BoundingBox> {
        boxes.into_iter().fold(None, |acc, b| match acc {
            None => Some(*b),
            Some(a) => Some(a.union(b)),
        })
    }

    /// Length of the horizontal overlap with `other` (0 when disjoint).
    pub fn x_overlap(&self, other: &BoundingBox) -> f32 {
        (self.right.min(other.right) - self.left.max(other.left)).max(0.0)
    }

    /// Scale every coordinate by `factor`.
    pub fn scaled(&self, factor: f32) -> BoundingBox {
        BoundingBox {
            left: self.left * factor,
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
        }
    }
}

/// Where an item sits in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// 1-indexed page number.
    pub page_no: usize,
    pub bbox: BoundingBox,
}

/// Format of the input artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Pdf,
    Png,
    Jpeg,
    Tiff,
    Bmp,
    Gif,
    Webp,
}

impl InputFormat {
    pub fn is_image(&self) -> bool {
        !matches!(self, InputFormat::Pdf)
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            InputFormat::Pdf => "application/pdf",
            InputFormat::Png => "image/png",
            InputFormat::Jpeg => "image/jpeg",
            InputFormat::Tiff => "image/tiff",
            InputFormat::Bmp => "image/bmp",
            InputFormat::Gif => "image/gif",
            InputFormat::Webp => "image/webp",
        }
    }

    /// Map an `image` crate format onto the formats we accept.
    pub fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(InputFormat::Png),
            image::ImageFormat::Jpeg => Some(InputFormat::Jpeg),
            image::ImageFormat::Tiff => Some(InputFormat::Tiff),
            image::ImageFormat::Bmp => Some(InputFormat::Bmp),
            image::ImageFormat::Gif => Some(InputFormat::Gif),
            image::ImageFormat::WebP => Some(InputFormat::Webp),
            _ => None,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InputFormat::Pdf => "pdf",
            InputFormat::Png => "png",
            InputFormat::Jpeg => "jpeg",
            InputFormat::Tiff => "tiff",
            InputFormat::Bmp => "bmp",
            InputFormat::Gif => "gif",
            InputFormat::Webp => "webp",
        };
        f.write_str(s)
    }
}

/// The file the document was converted from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOrigin {
    pub filename: String,
    pub format: InputFormat,
}

/// How the words of a page were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Rasterised and read by the OCR engine.
    Ocr,
    /// Taken from the PDF's embedded text.
    TextLayer,
}

/// Geometry and provenance of a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_no: usize,
    /// Width in points.
    pub width: f32,
    /// Height in points.
    pub height: f32,
    pub text_source: TextSource,
    /// PNG data URI of the rendered page, present when page images were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A single table cell placed on the logical grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    pub start_row: usize,
    pub start_col: usize,
    pub row_span: usize,
    pub col_span: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub column_header: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl TableCell {
    pub fn end_row(&self) -> usize {
        self.start_row + self.row_span.max(1)
    }

    pub fn end_col(&self) -> usize {
        self.start_col + self.col_span.max(1)
    }
}

/// Table structure: dimensions and the cells placed on the grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub num_rows: usize,
    pub num_cols: usize,
    pub cells: Vec<TableCell>,
}

impl TableData {
    /// Row-major occupancy grid: `grid[r][c]` is the index into `cells` of the
    /// cell covering that slot, or `None` for an empty slot.
    pub fn grid(&self) -> Vec<Vec<Option<usize>>> {
        let mut grid = vec![vec![None; self.num_cols]; self.num_rows];
        for (i, cell) in self.cells.iter().enumerate() {
            for row in grid
                .iter_mut()
                .take(cell.end_row().min(self.num_rows))
                .skip(cell.start_row)
            {
                for slot in row
                    .iter_mut()
                    .take(cell.end_col().min(self.num_cols))
                    .skip(cell.start_col)
                {
                    *slot = Some(i);
                }
            }
        }
        grid
    }

    /// Cell text by grid position, empty string for empty slots.
    pub fn text_at(&self, row: usize, col: usize) -> &str {
        self.grid()
            .get(row)
            .and_then(|r| r.get(col).copied().flatten())
            .map(|i| self.cells[i].text.as_str())
            .unwrap_or("")
    }
}

/// One content item in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "label", rename_all = "snake_case")]
pub enum DocItem {
    Title {
        text: String,
        prov: Provenance,
    },
    SectionHeader {
        text: String,
        /// 1 = top-level section.
        level: u8,
        prov: Provenance,
    },
    Paragraph {
        text: String,
        prov: Provenance,
    },
    ListItem {
        text: String,
        /// The bullet or enumerator as printed, e.g. "•" or "3.".
        marker: String,
        enumerated: bool,
        prov: Provenance,
    },
    PageHeader {
        text: String,
        prov: Provenance,
    },
    PageFooter {
        text: String,
        prov: Provenance,
    },
    Table {
        data: TableData,
        prov: Provenance,
    },
}

impl DocItem {
    pub fn prov(&self) -> &Provenance {
        match self {
            DocItem::Title { prov, .. }
            | DocItem::SectionHeader { prov, .. }
            | DocItem::Paragraph { prov, .. }
            | DocItem::ListItem { prov, .. }
            | DocItem::PageHeader { prov, .. }
            | DocItem::PageFooter { prov, .. }
            | DocItem::Table { prov, .. } => prov,
        }
    }

    pub fn page_no(&self) -> usize {
        self.prov().page_no
    }

    /// Text of the item; tables have none.
    pub fn text(&self) -> Option<&str> {
        match self {
            DocItem::Title { text, .. }
            | DocItem::SectionHeader { text, .. }
            | DocItem::Paragraph { text, .. }
            | DocItem::ListItem { text, .. }
            | DocItem::PageHeader { text, .. }
            | DocItem::PageFooter { text, .. } => Some(text),
            DocItem::Table { .. } => None,
        }
    }

    /// Page headers and footers.
    pub fn is_furniture(&self) -> bool {
        matches!(self, DocItem::PageHeader { .. } | DocItem::PageFooter { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocItem::Title { .. } => "title",
            DocItem::SectionHeader { .. } => "section_header",
            DocItem::Paragraph { .. } => "paragraph",
            DocItem::ListItem { .. } => "list_item",
            DocItem::PageHeader { .. } => "page_header",
            DocItem::PageFooter { .. } => "page_footer",
            DocItem::Table { .. } => "table",
        }
    }
}

/// The result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Document name, the input file stem.
    pub name: String,
    pub origin: DocumentOrigin,
    pub pages: Vec<PageInfo>,
    pub items: Vec<DocItem>,
}

impl ConvertedDocument {
    pub fn new(name: impl Into<String>, origin: DocumentOrigin) -> Self {
        Self {
            name: name.into(),
            origin,
            pages: Vec::new(),
            items: Vec::new(),
        }
    }

    /// Iterate over every table in the document.
    pub fn tables(&self) -> impl Iterator<Item = &TableData> {
        self.items.iter().filter_map(|item| match item {
            DocItem::Table { data, .. } => Some(data),
            _ => None,
        })
    }

    /// Items belonging to one page, in reading order.
    pub fn page_items(&self, page_no: usize) -> impl Iterator<Item = &DocItem> {
        self.items.iter().filter(move |i| i.page_no() == page_no)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str, row: usize, col: usize, col_span: usize) -> TableCell {
        TableCell {
            text: text.into(),
            start_row: row,
            start_col: col,
            row_span: 1,
            col_span,
            ..Default::default()
        }
    }

    #[test]
    fn bbox_union_and_centres() {
        let a = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let b = BoundingBox::new(15.0, 5.0, 40.0, 12.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(10.0, 5.0, 40.0, 20.0));
        assert_eq!(a.x_center(), 15.0);
        assert_eq!(a.x_overlap(&b), 5.0);
    }

    #[test]
    fn enclosing_of_nothing_is_none() {
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn grid_marks_spanned_slots() {
        let table = TableData {
            num_rows: 2,
            num_cols: 3,
            cells: vec![
                cell("Quarter", 0, 0, 1),
                cell("Revenue and costs", 0, 1, 2),
                cell("Q1", 1, 0, 1),
                cell("10", 1, 2, 1),
            ],
        };
        let grid = table.grid();
        assert_eq!(grid[0], vec![Some(0), Some(1), Some(1)]);
        assert_eq!(grid[1], vec![Some(2), None, Some(3)]);
        assert_eq!(table.text_at(0, 2), "Revenue and costs");
        assert_eq!(table.text_at(1, 1), "");
    }

    #[test]
    fn item_serialises_with_label_tag() {
        let item = DocItem::Paragraph {
            text: "Hello".into(),
            prov: Provenance {
                page_no: 1,
                bbox: BoundingBox::default(),
            },
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"label\":\"paragraph\""), "got {json}");
    }

    #[test]
    fn input_format_mime() {
        assert_eq!(InputFormat::Pdf.mime_type(), "application/pdf");
        assert!(InputFormat::Png.is_image());
        assert!(!InputFormat::Pdf.is_image());
        assert_eq!(
            InputFormat::from_image_format(image::ImageFormat::Jpeg),
            Some(InputFormat::Jpeg)
        );
    }
}
