//! PDF rasterisation: load a document with pdfium, render the selected pages
//! to PNG files for OCR, and read their text layer when asked.
//!
//! Each page bitmap is written to disk and dropped before the next page is
//! rendered, so at most one raster is held in memory at a time.
//!
//! pdfium wraps a C++ library with thread-local state, so every call runs in
//! `tokio::task::spawn_blocking` with its own binding.

use crate::config::ConversionConfig;
use crate::error::Ocr2HtmlError;
use crate::output::DocumentMetadata;
use crate::pdfium;
use crate::pipeline::textlayer;
use crate::pipeline::words::OcrWord;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A rasterised page stored as a PNG file.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    pub path: PathBuf,
    pub width_px: u32,
    pub height_px: u32,
}

/// One page ready for text recognition.
pub struct RenderedPage {
    /// 0-indexed page number.
    pub index: usize,
    /// Page width in points.
    pub width_pt: f32,
    /// Page height in points.
    pub height_pt: f32,
    /// Rasterised page; `None` when the page will be read from its text layer only.
    pub raster: Option<PageRaster>,
    /// Text-layer words, when the text layer was read.
    pub text_words: Option<Vec<OcrWord>>,
}

/// What to pull out of each page.
#[derive(Debug, Clone, Copy)]
pub struct RenderPlan {
    pub dpi: u32,
    pub max_pixels: u32,
    pub rasterise: bool,
    /// Store rasters as 8-bit grayscale.
    pub grayscale: bool,
    pub read_text_layer: bool,
}

impl RenderPlan {
    /// Derive the plan from the pipeline options.
    ///
    /// Pages are rasterised whenever OCR may run or page images are wanted
    /// for export; the text layer is read whenever it may be used.
    pub fn from_config(config: &ConversionConfig) -> Self {
        let p = &config.pipeline;
        Self {
            dpi: config.dpi,
            max_pixels: config.max_rendered_pixels,
            rasterise: p.do_ocr || config.html.embed_page_images,
            grayscale: p.do_ocr && p.ocr.grayscale,
            read_text_layer: !p.do_ocr || !p.ocr.force_full_page_ocr,
        }
    }
}

/// Load the PDF and prepare the selected pages, writing rasters into
/// `raster_dir` as `page-N.png`.
pub async fn render_pages(
    pdf_path: &Path,
    password: Option<&str>,
    plan: RenderPlan,
    page_indices: &[usize],
    raster_dir: &Path,
) -> Result<Vec<RenderedPage>, Ocr2HtmlError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(|s| s.to_string());
    let indices = page_indices.to_vec();
    let raster_dir = raster_dir.to_path_buf();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, password.as_deref(), plan, &indices, &raster_dir)
    })
    .await
    .map_err(|e| Ocr2HtmlError::Internal(format!("Render task panicked: {}", e)))?
}

/// Map a pdfium load failure onto a typed error.
fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> Ocr2HtmlError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Ocr2HtmlError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            Ocr2HtmlError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        Ocr2HtmlError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Render config for a page: scale to `dpi`, then cap the longest edge.
fn render_config(plan: RenderPlan) -> PdfRenderConfig {
    PdfRenderConfig::new()
        .scale_page_by_factor(plan.dpi as f32 / 72.0)
        .set_maximum_width(plan.max_pixels as i32)
        .set_maximum_height(plan.max_pixels as i32)
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    plan: RenderPlan,
    page_indices: &[usize],
    raster_dir: &Path,
) -> Result<Vec<RenderedPage>, Ocr2HtmlError> {
    let pdfium = pdfium::bind()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let config = render_config(plan);
    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            return Err(Ocr2HtmlError::PageOutOfRange {
                page: idx + 1,
                total: total_pages,
            });
        }

        let page = pages
            .get(idx as u16)
            .map_err(|e| Ocr2HtmlError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let raster = if plan.rasterise {
            let bitmap = page.render_with_config(&config).map_err(|e| {
                Ocr2HtmlError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;
            let image = bitmap.as_image();
            let image = if plan.grayscale {
                DynamicImage::ImageLuma8(image.to_luma8())
            } else {
                image
            };
            let raster = write_raster(&image, idx + 1, raster_dir)?;
            debug!(
                "Rendered page {} → {}x{} px at {}",
                idx + 1,
                raster.width_px,
                raster.height_px,
                raster.path.display()
            );
            Some(raster)
        } else {
            None
        };

        let text_words = if plan.read_text_layer {
            let words = textlayer::extract_page_words(&page, idx + 1)?;
            debug!("Page {}: text layer has {} words", idx + 1, words.len());
            Some(words)
        } else {
            None
        };

        results.push(RenderedPage {
            index: idx,
            width_pt: page.width().value,
            height_pt: page.height().value,
            raster,
            text_words,
        });
    }

    Ok(results)
}

/// Save one page image as PNG; the image is dropped by the caller right after.
fn write_raster(
    img: &DynamicImage,
    page_num: usize,
    raster_dir: &Path,
) -> Result<PageRaster, Ocr2HtmlError> {
    let path = raster_dir.join(format!("page-{page_num}.png"));
    img.save_with_format(&path, image::ImageFormat::Png)
        .map_err(|e| Ocr2HtmlError::RasterisationFailed {
            page: page_num,
            detail: format!("could not write page image: {e}"),
        })?;
    Ok(PageRaster {
        path,
        width_px: img.width(),
        height_px: img.height(),
    })
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Ocr2HtmlError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| Ocr2HtmlError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, Ocr2HtmlError> {
    let pdfium = pdfium::bind()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;

    #[test]
    fn forced_ocr_skips_text_layer() {
        let plan = RenderPlan::from_config(&ConversionConfig::default());
        assert!(plan.rasterise);
        assert!(!plan.read_text_layer);
        assert_eq!(plan.dpi, 300);
    }

    #[test]
    fn no_ocr_reads_text_layer_only() {
        let config = ConversionConfig::builder().do_ocr(false).build().unwrap();
        let plan = RenderPlan::from_config(&config);
        assert!(!plan.rasterise);
        assert!(plan.read_text_layer);
    }

    #[test]
    fn optional_ocr_needs_both() {
        let config = ConversionConfig::builder()
            .force_full_page_ocr(false)
            .build()
            .unwrap();
        let plan = RenderPlan::from_config(&config);
        assert!(plan.rasterise);
        assert!(plan.read_text_layer);
    }

    #[test]
    fn grayscale_only_when_ocr_runs() {
        assert!(RenderPlan::from_config(&ConversionConfig::default()).grayscale);
        let config = ConversionConfig::builder()
            .do_ocr(false)
            .embed_page_images(true)
            .build()
            .unwrap();
        assert!(!RenderPlan::from_config(&config).grayscale);
    }

    #[test]
    fn raster_written_as_png_with_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(40, 25, image::Luma([200])));
        let raster = write_raster(&img, 3, dir.path()).unwrap();
        assert_eq!(raster.path, dir.path().join("page-3.png"));
        assert_eq!((raster.width_px, raster.height_px), (40, 25));
        let bytes = std::fs::read(&raster.path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn raster_into_missing_dir_is_rasterisation_error() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::new(2, 2));
        let err = write_raster(&img, 1, Path::new("/no/such/dir")).unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::RasterisationFailed { page: 1, .. }));
    }

    #[test]
    fn page_images_force_rasterisation() {
        let config = ConversionConfig::builder()
            .do_ocr(false)
            .embed_page_images(true)
            .build()
            .unwrap();
        assert!(RenderPlan::from_config(&config).rasterise);
    }
}
