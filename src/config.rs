//! Configuration types for image/PDF-to-HTML conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The OCR and table-structure knobs are
//! grouped in [`PipelineOptions`]; the HTML knobs in [`HtmlOptions`].

use crate::error::Ocr2HtmlError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Configuration for a conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use ocr2html::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(300)
///     .lang(["eng", "deu"])
///     .cell_matching(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.pipeline.ocr.lang, vec!["eng", "deu"]);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page for OCR. Range: 72–600. Default: 300.
    ///
    /// Tesseract is tuned for text at roughly 300 DPI; lower values lose
    /// small print, higher values mostly cost time.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 5000.
    ///
    /// A safety cap independent of DPI. A large-format page at 300 DPI
    /// would otherwise allocate hundreds of megabytes of pixels.
    pub max_rendered_pixels: u32,

    /// Resolution assumed for image inputs when building their PDF page. Default: 96.
    ///
    /// The page measures `pixels × 72 / image_dpi` points on each side.
    pub image_dpi: f32,

    /// Where to write the PDF built from an image input.
    ///
    /// `None` (default) uses a temporary file removed after conversion. An
    /// existing file at the path is overwritten.
    pub intermediate_pdf: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// OCR and table-structure settings.
    pub pipeline: PipelineOptions,

    /// HTML export settings.
    pub html: HtmlOptions,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback for per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_rendered_pixels: 5000,
            image_dpi: 96.0,
            intermediate_pdf: None,
            password: None,
            pages: PageSelection::default(),
            pipeline: PipelineOptions::default(),
            html: HtmlOptions::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("image_dpi", &self.image_dpi)
            .field("intermediate_pdf", &self.intermediate_pdf)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pages", &self.pages)
            .field("pipeline", &self.pipeline)
            .field("html", &self.html)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn image_dpi(mut self, dpi: f32) -> Self {
        self.config.image_dpi = dpi;
        self
    }

    pub fn intermediate_pdf(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.intermediate_pdf = Some(path.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pipeline(mut self, options: PipelineOptions) -> Self {
        self.config.pipeline = options;
        self
    }

    pub fn do_ocr(mut self, v: bool) -> Self {
        self.config.pipeline.do_ocr = v;
        self
    }

    pub fn force_full_page_ocr(mut self, v: bool) -> Self {
        self.config.pipeline.ocr.force_full_page_ocr = v;
        self
    }

    pub fn lang<I, S>(mut self, langs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.pipeline.ocr.lang = langs.into_iter().map(Into::into).collect();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.config.pipeline.ocr.tesseract_cmd = cmd.into();
        self
    }

    pub fn psm(mut self, psm: u8) -> Self {
        self.config.pipeline.ocr.psm = Some(psm);
        self
    }

    pub fn min_confidence(mut self, c: f32) -> Self {
        self.config.pipeline.ocr.min_confidence = c.clamp(0.0, 100.0);
        self
    }

    pub fn ocr_timeout_secs(mut self, secs: u64) -> Self {
        self.config.pipeline.ocr.timeout_secs = Some(secs);
        self
    }

    pub fn do_table_structure(mut self, v: bool) -> Self {
        self.config.pipeline.do_table_structure = v;
        self
    }

    pub fn cell_matching(mut self, v: bool) -> Self {
        self.config.pipeline.table_structure.do_cell_matching = v;
        self
    }

    pub fn html(mut self, options: HtmlOptions) -> Self {
        self.config.html = options;
        self
    }

    pub fn embed_page_images(mut self, v: bool) -> Self {
        self.config.html.embed_page_images = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Attach a progress callback to receive per-page conversion events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Ocr2HtmlError> {
        let c = &self.config;
        if !(72..=600).contains(&c.dpi) {
            return Err(Ocr2HtmlError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if !(c.image_dpi.is_finite() && c.image_dpi > 0.0) {
            return Err(Ocr2HtmlError::InvalidConfig(format!(
                "Image DPI must be positive, got {}",
                c.image_dpi
            )));
        }
        if c.pipeline.ocr.lang.is_empty() {
            return Err(Ocr2HtmlError::InvalidConfig(
                "At least one OCR language is required".into(),
            ));
        }
        if c.pipeline.ocr.tesseract_cmd.trim().is_empty() {
            return Err(Ocr2HtmlError::InvalidConfig(
                "Tesseract command must not be empty".into(),
            ));
        }
        if let Some(psm) = c.pipeline.ocr.psm {
            if psm > 13 {
                return Err(Ocr2HtmlError::InvalidConfig(format!(
                    "Page segmentation mode must be 0–13, got {psm}"
                )));
            }
        }
        let ts = &c.pipeline.table_structure;
        if ts.min_rows < 2 || ts.min_cols < 2 {
            return Err(Ocr2HtmlError::InvalidConfig(
                "Tables need at least 2 rows and 2 columns".into(),
            ));
        }
        if !(ts.column_gap_ratio.is_finite() && ts.column_gap_ratio > 0.0) {
            return Err(Ocr2HtmlError::InvalidConfig(format!(
                "Column gap ratio must be positive, got {}",
                ts.column_gap_ratio
            )));
        }
        Ok(self.config)
    }
}

// ── Pipeline options ─────────────────────────────────────────────────────

/// Switches for the conversion pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Run OCR. Default: true.
    pub do_ocr: bool,
    pub ocr: OcrOptions,
    /// Detect tables among the page words. Default: true.
    pub do_table_structure: bool,
    pub table_structure: TableStructureOptions,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            do_ocr: true,
            ocr: OcrOptions::default(),
            do_table_structure: true,
            table_structure: TableStructureOptions::default(),
        }
    }
}

/// Settings for the tesseract command-line OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrOptions {
    /// OCR every page even when it already has a text layer. Default: true.
    pub force_full_page_ocr: bool,
    /// Tesseract language codes, joined with `+`. Default: `["eng"]`.
    pub lang: Vec<String>,
    /// Binary to spawn. Default: `tesseract`.
    pub tesseract_cmd: String,
    /// Page segmentation mode (`--psm`). Default: tesseract's own.
    pub psm: Option<u8>,
    /// Words below this confidence (0–100) are dropped. Default: 0.
    pub min_confidence: f32,
    /// Subprocess timeout. Default: none, OCR blocks until tesseract exits.
    pub timeout_secs: Option<u64>,
    /// Convert pages to grayscale before OCR. Default: true.
    pub grayscale: bool,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            force_full_page_ocr: true,
            lang: vec!["eng".to_string()],
            tesseract_cmd: "tesseract".to_string(),
            psm: None,
            min_confidence: 0.0,
            timeout_secs: None,
            grayscale: true,
        }
    }
}

impl OcrOptions {
    /// The `-l` argument, e.g. `eng+deu`.
    pub fn lang_arg(&self) -> String {
        self.lang.join("+")
    }
}

/// Settings for table-structure detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStructureOptions {
    /// Re-assign individual words to detected columns. Default: true.
    ///
    /// Without it, each run of closely spaced words is kept as one cell and
    /// spans every column it overlaps.
    pub do_cell_matching: bool,
    /// Minimum rows for a region to count as a table. Default: 2.
    pub min_rows: usize,
    /// Minimum columns for a region to count as a table. Default: 2.
    pub min_cols: usize,
    /// Horizontal gap, in multiples of the row's word height, that separates
    /// two cells. Default: 1.5.
    pub column_gap_ratio: f32,
}

impl Default for TableStructureOptions {
    fn default() -> Self {
        Self {
            do_cell_matching: true,
            min_rows: 2,
            min_cols: 2,
            column_gap_ratio: 1.5,
        }
    }
}

/// HTML export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlOptions {
    /// Wrap each page in `<div class='page'>`. Default: true.
    pub page_divs: bool,
    /// Emit page headers and footers. Default: false.
    pub include_furniture: bool,
    /// Embed each rendered page as a PNG data URI. Default: false.
    pub embed_page_images: bool,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            page_divs: true,
            include_furniture: false,
            embed_page_images: false,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF to convert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
