//! Result types returned by the conversion entry points.

use crate::document::ConvertedDocument;
use serde::{Deserialize, Serialize};

/// Everything a conversion produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// The structured document.
    pub document: ConvertedDocument,
    /// HTML export of `document`, rendered with the configured [`crate::HtmlOptions`].
    pub html: String,
    /// Metadata of the PDF that was OCR'd.
    pub metadata: DocumentMetadata,
    pub stats: ConversionStats,
}

/// Timing and volume figures for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the PDF.
    pub total_pages: usize,
    /// Pages that went through the pipeline.
    pub processed_pages: usize,
    /// Pages read by the OCR engine.
    pub ocr_pages: usize,
    /// Pages read from the PDF text layer.
    pub text_layer_pages: usize,
    pub total_words: usize,
    pub tables_found: usize,
    pub total_items: usize,
    /// Time spent building a PDF from an image input.
    pub image_to_pdf_duration_ms: u64,
    pub render_duration_ms: u64,
    pub ocr_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Document-level information read from the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
