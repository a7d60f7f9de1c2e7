//! # ocr2html
//!
//! Convert scanned images and PDFs to HTML using Tesseract OCR, with
//! heuristic layout analysis and table-structure detection.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image / PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, sniff format
//!  ├─ 2. ImgToPdf  wrap an image in a single-page PDF
//!  ├─ 3. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. OCR       tesseract subprocess per page, or the PDF text layer
//!  ├─ 5. Tables    rows, columns and cells from word geometry
//!  ├─ 6. Layout    title, section headers, paragraphs, list items
//!  └─ 7. Export    HTML (also Markdown, text, JSON)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ocr2html::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("scan.png", &config).await?;
//!     println!("{}", output.html);
//!     eprintln!("{} tables on {} pages",
//!         output.stats.tables_found,
//!         output.stats.processed_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## External programs
//!
//! - **pdfium** shared library, located via `PDFIUM_LIB_PATH`, the working
//!   directory or the system library path.
//! - **tesseract** binary on `PATH` (or [`OcrOptions::tesseract_cmd`]).
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr2html` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! ocr2html = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod export;
pub mod output;
pub mod pdfium;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, HtmlOptions, OcrOptions, PageSelection,
    PipelineOptions, TableStructureOptions,
};
pub use convert::{
    convert, convert_document, convert_from_bytes, convert_sync, convert_to_file, image_to_pdf,
    inspect,
};
pub use document::{
    BoundingBox, ConvertedDocument, DocItem, DocumentOrigin, InputFormat, PageInfo, Provenance,
    TableCell, TableData, TextSource,
};
pub use error::Ocr2HtmlError;
pub use export::OutputFormat;
pub use output::{ConversionOutput, ConversionStats, DocumentMetadata};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
