//! Pipeline stages for image/PDF-to-HTML conversion.
//!
//! Each submodule implements exactly one transformation step and is tested
//! on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ image_pdf ──▶ render ──▶ ocr / textlayer ──▶ table ──▶ layout
//! (path)    (img→PDF)    (pdfium)    (words)             (grids)    (items)
//! ```
//!
//! 1. [`input`]     canonicalise the path or URL and sniff its format
//! 2. [`image_pdf`] wrap an image input in a single-page PDF
//! 3. [`render`]    rasterise selected pages in `spawn_blocking`
//! 4. [`ocr`]       run tesseract on each page image, or
//!    [`textlayer`] read the PDF's own text
//! 5. [`table`]     find tables among the positioned [`words`]
//! 6. [`layout`]    classify the remaining words into titles, headers,
//!    paragraphs and list items, cleaned by [`postprocess`]
//!
//! [`encode`] turns page images into data URIs for the HTML export.

pub mod encode;
pub mod image_pdf;
pub mod input;
pub mod layout;
pub mod ocr;
pub mod postprocess;
pub mod render;
pub mod table;
pub mod textlayer;
pub mod words;
