//! ImageToPdf: wrap a raster image in a single-page PDF.
//!
//! The page is sized so the image prints at `dpi` dots per inch
//! (`points = pixels × 72 / dpi`) and the image fills it edge to edge. With
//! no resolution information in the file, 96 DPI is assumed.
//!
//! Decoding happens before pdfium is touched, so an unreadable image fails
//! with [`Ocr2HtmlError::ImageDecode`] and never produces an output file.

use crate::error::Ocr2HtmlError;
use crate::pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page dimensions in points for an image of `width × height` pixels at `dpi`.
pub fn page_size_points(width: u32, height: u32, dpi: f32) -> (f32, f32) {
    let scale = 72.0 / dpi;
    (width as f32 * scale, height as f32 * scale)
}

/// Decode an image file.
pub fn decode_image(path: &Path) -> Result<DynamicImage, Ocr2HtmlError> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| Ocr2HtmlError::ImageDecode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| Ocr2HtmlError::ImageDecode {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    reader.decode().map_err(|e| Ocr2HtmlError::ImageDecode {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Build the bytes of a single-page PDF containing the image at `path`.
///
/// Blocking: decodes the image and drives pdfium on the calling thread.
pub fn image_to_pdf_bytes(path: &Path, dpi: f32) -> Result<Vec<u8>, Ocr2HtmlError> {
    let image = decode_image(path)?;
    encode_single_page(&image, dpi).map_err(|detail| Ocr2HtmlError::PdfBuildFailed {
        path: path.to_path_buf(),
        detail,
    })
}

fn encode_single_page(image: &DynamicImage, dpi: f32) -> Result<Vec<u8>, String> {
    let (width_pt, height_pt) = page_size_points(image.width(), image.height(), dpi);
    debug!(
        "Building PDF page {:.1}x{:.1} pt for {}x{} px image",
        width_pt,
        height_pt,
        image.width(),
        image.height()
    );

    let pdfium = pdfium::bind().map_err(|e| e.to_string())?;
    let mut document = pdfium.create_new_pdf().map_err(|e| format!("{:?}", e))?;

    {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::from_points(
                PdfPoints::new(width_pt),
                PdfPoints::new(height_pt),
            ))
            .map_err(|e| format!("{:?}", e))?;

        page.objects_mut()
            .create_image_object(
                PdfPoints::ZERO,
                PdfPoints::ZERO,
                image,
                Some(PdfPoints::new(width_pt)),
                Some(PdfPoints::new(height_pt)),
            )
            .map_err(|e| format!("{:?}", e))?;
    }

    document.save_to_bytes().map_err(|e| format!("{:?}", e))
}

/// Convert the image at `image_path` to a PDF written at `output_path`.
///
/// An existing file at `output_path` is overwritten.
pub fn image_to_pdf_file(
    image_path: &Path,
    output_path: &Path,
    dpi: f32,
) -> Result<PathBuf, Ocr2HtmlError> {
    let bytes = image_to_pdf_bytes(image_path, dpi)?;
    std::fs::write(output_path, &bytes).map_err(|e| Ocr2HtmlError::PdfWriteFailed {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    info!(
        "Wrote {} byte PDF for {} → {}",
        bytes.len(),
        image_path.display(),
        output_path.display()
    );
    Ok(output_path.to_path_buf())
}

/// Async wrapper around [`image_to_pdf_file`]; runs in `spawn_blocking`.
pub async fn image_to_pdf(
    image_path: &Path,
    output_path: &Path,
    dpi: f32,
) -> Result<PathBuf, Ocr2HtmlError> {
    let image_path = image_path.to_path_buf();
    let output_path = output_path.to_path_buf();
    tokio::task::spawn_blocking(move || image_to_pdf_file(&image_path, &output_path, dpi))
        .await
        .map_err(|e| Ocr2HtmlError::Internal(format!("Image-to-PDF task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_at_96_dpi() {
        let (w, h) = page_size_points(960, 480, 96.0);
        assert!((w - 720.0).abs() < 1e-3);
        assert!((h - 360.0).abs() < 1e-3);
    }

    #[test]
    fn page_size_at_72_dpi_is_pixel_size() {
        assert_eq!(page_size_points(100, 50, 72.0), (100.0, 50.0));
    }

    #[test]
    fn corrupt_image_is_decode_error_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.png");
        std::fs::write(&bad, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();
        let out = dir.path().join("output.pdf");

        let err = image_to_pdf_file(&bad, &out, 96.0).unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::ImageDecode { .. }), "got {err}");
        assert!(!out.exists());
    }

    #[test]
    fn missing_image_is_decode_error() {
        let err = decode_image(Path::new("/no/such/scan.png")).unwrap_err();
        assert!(matches!(err, Ocr2HtmlError::ImageDecode { .. }));
    }
}
