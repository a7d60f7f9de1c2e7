//! Conversion entry points.
//!
//! Pages are processed one at a time and the conversion is all-or-nothing:
//! the first failing page aborts it and no partial document is returned.

use crate::config::ConversionConfig;
use crate::document::{
    ConvertedDocument, DocItem, DocumentOrigin, InputFormat, PageInfo, TextSource,
};
use crate::error::Ocr2HtmlError;
use crate::export::OutputFormat;
use crate::output::{ConversionOutput, ConversionStats, DocumentMetadata};
use crate::pipeline::layout::LayoutBuilder;
use crate::pipeline::render::{RenderPlan, RenderedPage};
use crate::pipeline::words::OcrWord;
use crate::pipeline::{encode, image_pdf, input, ocr, render, table};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info};

/// Convert an image or PDF file (or URL) to a structured document and HTML.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input` — Local file path or HTTP/HTTPS URL to an image or PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// Any failure is fatal: unreadable input, an image that cannot be
/// decoded, a PDF pdfium cannot open, a missing or failing OCR engine.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Ocr2HtmlError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let mut stats = ConversionStats::default();

    // ── Step 2: Images become a single-page PDF ──────────────────────────
    let prepared = prepare_pdf(resolved.path(), resolved.format(), config).await?;
    stats.image_to_pdf_duration_ms = prepared.duration_ms;
    let pdf_path = prepared.path.as_path();

    // ── Step 3: Extract metadata ─────────────────────────────────────────
    let metadata = render::extract_metadata(pdf_path, config.password.as_deref()).await?;
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 4: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(Ocr2HtmlError::PageOutOfRange {
            page: 0,
            total: total_pages,
        });
    }
    debug!("Selected {} pages for conversion", page_indices.len());

    // Fail before rendering when the OCR engine is missing.
    if config.pipeline.do_ocr {
        let version = ocr::tesseract_version(&config.pipeline.ocr).await?;
        info!("Using tesseract {}", version);
    }

    // ── Step 5: Rasterise pages ──────────────────────────────────────────
    let render_start = Instant::now();
    let plan = RenderPlan::from_config(config);
    // Page PNGs live here until the conversion returns.
    let raster_dir = tempfile::tempdir()
        .map_err(|e| Ocr2HtmlError::Internal(format!("tempdir: {e}")))?;
    let rendered = render::render_pages(
        pdf_path,
        config.password.as_deref(),
        plan,
        &page_indices,
        raster_dir.path(),
    )
    .await?;
    stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        rendered.len(),
        stats.render_duration_ms
    );

    // ── Step 6: Read, detect tables, lay out ─────────────────────────────
    let selected = page_indices.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(selected);
    }

    let mut document = ConvertedDocument::new(
        resolved.name(),
        DocumentOrigin {
            filename: resolved.filename(),
            format: resolved.format(),
        },
    );
    let mut layout = LayoutBuilder::new();

    for page in rendered {
        let page_num = page.index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let processed = process_page(page, config, &mut layout, &mut stats).await;
        let (info, items, word_count) = match processed {
            Ok(v) => v,
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                return Err(e);
            }
        };

        stats.total_words += word_count;
        document.pages.push(info);
        document.items.extend(items);

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, selected, word_count);
        }
    }

    // ── Step 7: Export ───────────────────────────────────────────────────
    let html = document.export_to_html_with(&config.html);

    stats.total_pages = total_pages;
    stats.processed_pages = document.pages.len();
    stats.tables_found = document.tables().count();
    stats.total_items = document.items.len();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Conversion complete: {} pages, {} items, {} tables, {}ms total",
        stats.processed_pages, stats.total_items, stats.tables_found, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(selected, stats.processed_pages);
    }

    Ok(ConversionOutput {
        document,
        html,
        metadata,
        stats,
    })
}

/// Convert and return only the structured document.
pub async fn convert_document(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConvertedDocument, Ocr2HtmlError> {
    Ok(convert(input_str, config).await?.document)
}

/// Convert and write the result to a file in `format`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    format: OutputFormat,
    config: &ConversionConfig,
) -> Result<ConversionStats, Ocr2HtmlError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    let content = match format {
        OutputFormat::Html => output.html,
        other => output.document.export(other, &config.html)?,
    };
    write_atomic(path, format, content.as_bytes()).await?;
    info!("Wrote {} ({})", path.display(), format);

    Ok(output.stats)
}

async fn write_atomic(path: &Path, format: OutputFormat, bytes: &[u8]) -> Result<(), Ocr2HtmlError> {
    let write_err = |e: std::io::Error| Ocr2HtmlError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Ocr2HtmlError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Ocr2HtmlError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, config))
}

/// Wrap an image (path or URL) in a single-page PDF written to `output_path`.
///
/// The page measures `pixels × 72 / image_dpi` points. An existing file at
/// `output_path` is overwritten; a PDF input is rejected as unsupported.
pub async fn image_to_pdf(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    image_dpi: f32,
) -> Result<PathBuf, Ocr2HtmlError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    if !resolved.format().is_image() {
        return Err(Ocr2HtmlError::UnsupportedFormat {
            path: resolved.path().to_path_buf(),
            magic: *b"%PDF",
        });
    }
    image_pdf::image_to_pdf(resolved.path(), output_path.as_ref(), image_dpi).await
}

/// Read document metadata without OCR.
///
/// Images are reported as a single page with no PDF fields.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, Ocr2HtmlError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    if resolved.format().is_image() {
        return Ok(DocumentMetadata {
            page_count: 1,
            ..Default::default()
        });
    }
    render::extract_metadata(resolved.path(), None).await
}

/// Convert an in-memory image or PDF.
///
/// The bytes are written to a managed [`tempfile`] that is removed on
/// return.
///
/// # Example
/// ```rust,no_run
/// use ocr2html::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("scan.png")?;
/// let config = ConversionConfig::default();
/// let output = convert_from_bytes(&bytes, &config).await?;
/// println!("{}", output.html);
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<ConversionOutput, Ocr2HtmlError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("ocr2html-")
        .tempfile()
        .map_err(|e| Ocr2HtmlError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Ocr2HtmlError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// The PDF the pipeline reads, plus whatever keeps it alive.
struct PreparedPdf {
    path: PathBuf,
    duration_ms: u64,
    _temp_dir: Option<TempDir>,
}

/// PDFs pass through; images are wrapped in a single-page PDF written to
/// `config.intermediate_pdf` or a temporary file.
async fn prepare_pdf(
    path: &Path,
    format: InputFormat,
    config: &ConversionConfig,
) -> Result<PreparedPdf, Ocr2HtmlError> {
    if !format.is_image() {
        return Ok(PreparedPdf {
            path: path.to_path_buf(),
            duration_ms: 0,
            _temp_dir: None,
        });
    }

    let start = Instant::now();
    let (out_path, temp_dir) = match &config.intermediate_pdf {
        Some(p) => (p.clone(), None),
        None => {
            let dir = tempfile::tempdir()
                .map_err(|e| Ocr2HtmlError::Internal(format!("tempdir: {e}")))?;
            (dir.path().join("output.pdf"), Some(dir))
        }
    };
    info!("Converting {} image to PDF", format);
    image_pdf::image_to_pdf(path, &out_path, config.image_dpi).await?;

    Ok(PreparedPdf {
        path: out_path,
        duration_ms: start.elapsed().as_millis() as u64,
        _temp_dir: temp_dir,
    })
}

/// Pick the word source for a page, then detect tables and lay it out.
async fn process_page(
    page: RenderedPage,
    config: &ConversionConfig,
    layout: &mut LayoutBuilder,
    stats: &mut ConversionStats,
) -> Result<(PageInfo, Vec<DocItem>, usize), Ocr2HtmlError> {
    let page_num = page.index + 1;
    let pipeline = &config.pipeline;

    let text_layer = page.text_words.filter(|w| !w.is_empty());
    let use_ocr = pipeline.do_ocr && (pipeline.ocr.force_full_page_ocr || text_layer.is_none());

    let (words, text_source): (Vec<OcrWord>, TextSource) = if use_ocr {
        let raster = page.raster.as_ref().ok_or_else(|| {
            Ocr2HtmlError::Internal(format!("Page {page_num} was not rasterised"))
        })?;
        let ocr_start = Instant::now();
        let words = ocr::ocr_page(raster, page_num, page.width_pt, &pipeline.ocr).await?;
        stats.ocr_duration_ms += ocr_start.elapsed().as_millis() as u64;
        stats.ocr_pages += 1;
        (words, TextSource::Ocr)
    } else {
        stats.text_layer_pages += 1;
        (text_layer.unwrap_or_default(), TextSource::TextLayer)
    };
    debug!(
        "Page {}: {} words from {:?}",
        page_num,
        words.len(),
        text_source
    );

    let tables = if pipeline.do_table_structure {
        table::detect_tables(&words, &pipeline.table_structure)
    } else {
        Vec::new()
    };
    let items = layout.layout_page(page_num, page.height_pt, &words, tables);

    let image = match (&page.raster, config.html.embed_page_images) {
        (Some(raster), true) => Some(encode::encode_page(&raster.path).await.map_err(|e| {
            Ocr2HtmlError::RasterisationFailed {
                page: page_num,
                detail: format!("Image encoding failed: {}", e),
            }
        })?),
        _ => None,
    };

    let info = PageInfo {
        page_no: page_num,
        width: page.width_pt,
        height: page.height_pt,
        text_source,
        image,
    };
    Ok((info, items, words.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let err = convert("/no/such/scan.png", &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::FileNotFound { .. }), "got {err}");
    }

    #[tokio::test]
    async fn unsupported_bytes_rejected_before_pdfium() {
        let err = convert_from_bytes(b"just some text, not a scan", &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::UnsupportedFormat { .. }), "got {err}");
    }

    #[tokio::test]
    async fn corrupt_image_fails_without_writing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("scan.png");
        std::fs::write(&bad, b"\x89PNG\r\n\x1a\ngarbage").unwrap();
        let pdf_out = dir.path().join("output.pdf");
        let config = ConversionConfig::builder()
            .intermediate_pdf(&pdf_out)
            .build()
            .unwrap();

        let err = convert(bad.to_string_lossy(), &config).await.unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::ImageDecode { .. }), "got {err}");
        assert!(!pdf_out.exists());
    }

    #[test]
    fn convert_sync_propagates_errors() {
        let err = convert_sync("", &ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::InvalidInput { .. }));
    }
}
