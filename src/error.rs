//! Error types for the ocr2html library.
//!
//! Conversion is all-or-nothing: a corrupt page, a crashed OCR subprocess or
//! an unwritable output path aborts the whole run. There is therefore a single
//! fatal error type, [`Ocr2HtmlError`], returned from every `convert*` entry
//! point. Variants are grouped by the stage that produced them so callers can
//! match on the broad category (input, image, PDF, OCR, I/O) when they need
//! to tell "bad file" apart from "missing tesseract".

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the ocr2html library.
#[derive(Debug, Error)]
pub enum Ocr2HtmlError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file is neither a PDF nor an image format we can decode.
    #[error("Unsupported input format: '{path}'\nFirst bytes: {magic:?}")]
    UnsupportedFormat { path: PathBuf, magic: [u8; 4] },

    // ── Image errors ──────────────────────────────────────────────────────
    /// The image could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    /// The single-page PDF built from an image could not be written.
    #[error("Failed to write PDF '{path}': {source}")]
    PdfWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// pdfium refused to build the PDF page for an image.
    #[error("Failed to build PDF from image '{path}': {detail}")]
    PdfBuildFailed { path: PathBuf, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The PDF text layer could not be read.
    #[error("Text extraction failed for page {page}: {detail}")]
    TextLayerFailed { page: usize, detail: String },

    // ── OCR errors ────────────────────────────────────────────────────────
    /// The tesseract binary could not be spawned.
    #[error(
        "OCR engine '{command}' not found: {detail}\n\
Install tesseract (e.g. `apt install tesseract-ocr`, `brew install tesseract`)\n\
or point --tesseract-cmd at the binary."
    )]
    OcrEngineNotFound { command: String, detail: String },

    /// tesseract ran but exited unsuccessfully or produced unreadable output.
    #[error("OCR failed on page {page}: {detail}")]
    OcrFailed { page: usize, detail: String },

    /// tesseract did not finish within the configured timeout.
    #[error("OCR timed out after {secs}s on page {page}")]
    OcrTimeout { page: usize, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium must be installed as a shared library. You can:\n\
  • Install libpdfium system-wide (e.g. from bblanchon/pdfium-binaries).\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use a specific copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Ocr2HtmlError {
    /// True for failures raised while parsing the document or running OCR.
    ///
    /// These are the "conversion errors" of the pipeline, as opposed to bad
    /// input paths, decode errors or output I/O.
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            Ocr2HtmlError::CorruptPdf { .. }
                | Ocr2HtmlError::PasswordRequired { .. }
                | Ocr2HtmlError::WrongPassword { .. }
                | Ocr2HtmlError::RasterisationFailed { .. }
                | Ocr2HtmlError::TextLayerFailed { .. }
                | Ocr2HtmlError::OcrEngineNotFound { .. }
                | Ocr2HtmlError::OcrFailed { .. }
                | Ocr2HtmlError::OcrTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ocr_failed_display() {
        let e = Ocr2HtmlError::OcrFailed {
            page: 2,
            detail: "exit status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("exit status 1"));
    }

    #[test]
    fn engine_not_found_mentions_command() {
        let e = Ocr2HtmlError::OcrEngineNotFound {
            command: "/opt/tess/bin/tesseract".into(),
            detail: "No such file or directory".into(),
        };
        assert!(e.to_string().contains("/opt/tess/bin/tesseract"));
        assert!(e.is_conversion_error());
    }

    #[test]
    fn ocr_timeout_display() {
        let e = Ocr2HtmlError::OcrTimeout { page: 3, secs: 30 };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn decode_error_is_not_conversion_error() {
        let e = Ocr2HtmlError::ImageDecode {
            path: PathBuf::from("scan.png"),
            detail: "truncated".into(),
        };
        assert!(!e.is_conversion_error());
        assert!(e.to_string().contains("scan.png"));
    }

    #[test]
    fn unsupported_format_shows_magic() {
        let e = Ocr2HtmlError::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            magic: *b"hell",
        };
        assert!(e.to_string().contains("notes.txt"));
    }
}
