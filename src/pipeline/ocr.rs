//! OCR via the `tesseract` command-line binary.
//!
//! Each rendered page PNG is handed to `tesseract <png> stdout ... tsv`.
//! The TSV report gives one row per recognised element; level-5 rows are
//! words with pixel bounding boxes, which we scale back to page points.
//!
//! The subprocess is awaited with no timeout unless
//! [`crate::config::OcrOptions::timeout_secs`] is set.

use crate::config::OcrOptions;
use crate::document::BoundingBox;
use crate::error::Ocr2HtmlError;
use crate::pipeline::render::PageRaster;
use crate::pipeline::words::OcrWord;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Minimum number of tab-separated fields in a TSV word row.
const TSV_MIN_FIELDS: usize = 12;

/// TSV `level` value of a word row.
const TSV_WORD_LEVEL: u32 = 5;

/// Build the tesseract argument list for a page image.
///
/// `tesseract <image> stdout -l <lang> --dpi <dpi> [--psm N] tsv`
pub fn tesseract_args(image_path: &str, options: &OcrOptions, dpi: u32) -> Vec<String> {
    let mut args = vec![
        image_path.to_string(),
        "stdout".to_string(),
        "-l".to_string(),
        options.lang_arg(),
        "--dpi".to_string(),
        dpi.to_string(),
    ];
    if let Some(psm) = options.psm {
        args.push("--psm".to_string());
        args.push(psm.to_string());
    }
    args.push("tsv".to_string());
    args
}

/// Parse tesseract TSV output into words.
///
/// Pixel boxes are multiplied by `scale` (points per pixel). Rows that are
/// not words, fall below `min_confidence`, carry no text, or are malformed
/// are skipped.
pub fn parse_tsv(tsv: &str, scale: f32, min_confidence: f32) -> Vec<OcrWord> {
    let mut words = Vec::new();

    for (line_num, line) in tsv.lines().enumerate() {
        if line_num == 0 && line.starts_with("level") {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < TSV_MIN_FIELDS {
            continue;
        }

        let Ok(level) = fields[0].trim().parse::<u32>() else {
            continue;
        };
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let conf = fields[10].trim().parse::<f32>().unwrap_or(-1.0);
        if conf < min_confidence || conf < 0.0 {
            continue;
        }

        // Text may itself contain tabs in pathological output; keep the rest.
        let text = fields[11..].join("\t");
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let num = |i: usize| fields[i].trim().parse::<f32>().unwrap_or(0.0);
        let (left, top, width, height) = (num(6), num(7), num(8), num(9));

        words.push(OcrWord {
            text: text.to_string(),
            bbox: BoundingBox::new(left, top, left + width, top + height).scaled(scale),
            confidence: conf,
            block: fields[2].trim().parse().unwrap_or(0),
            par: fields[3].trim().parse().unwrap_or(0),
            line: fields[4].trim().parse().unwrap_or(0),
        });
    }

    words
}

/// Ask the binary for its version, e.g. `5.3.4`.
///
/// Fails with [`Ocr2HtmlError::OcrEngineNotFound`] when it cannot be spawned.
pub async fn tesseract_version(options: &OcrOptions) -> Result<String, Ocr2HtmlError> {
    let output = Command::new(&options.tesseract_cmd)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Ocr2HtmlError::OcrEngineNotFound {
            command: options.tesseract_cmd.clone(),
            detail: e.to_string(),
        })?;

    // Older builds print the banner on stderr.
    let text = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).into_owned()
    } else {
        String::from_utf8_lossy(&output.stdout).into_owned()
    };

    parse_version(&text).ok_or_else(|| Ocr2HtmlError::OcrEngineNotFound {
        command: options.tesseract_cmd.clone(),
        detail: format!("unrecognised --version output: {:?}", text.lines().next()),
    })
}

/// Extract the version number from the first line of `tesseract --version`.
fn parse_version(banner: &str) -> Option<String> {
    let first = banner.lines().next()?.trim();
    let rest = first.strip_prefix("tesseract")?.trim();
    let version = rest.trim_start_matches('v');
    if version.chars().next()?.is_ascii_digit() {
        Some(version.split_whitespace().next()?.to_string())
    } else {
        None
    }
}

/// Resolution a raster of `width_px` pixels has over a page `page_width_pt`
/// points wide. Differs from the configured DPI when the pixel cap applied.
pub fn effective_dpi(width_px: u32, page_width_pt: f32) -> u32 {
    if width_px == 0 || page_width_pt <= 0.0 {
        return 72;
    }
    ((width_px as f32 / page_width_pt * 72.0).round() as u32).max(1)
}

/// Run OCR on one rendered page.
///
/// `page_width_pt` converts pixel boxes back to points.
pub async fn ocr_page(
    raster: &PageRaster,
    page_num: usize,
    page_width_pt: f32,
    options: &OcrOptions,
) -> Result<Vec<OcrWord>, Ocr2HtmlError> {
    let dpi = effective_dpi(raster.width_px, page_width_pt);
    let png_path = &raster.path;

    let args = tesseract_args(&png_path.to_string_lossy(), options, dpi);
    debug!("Page {}: {} {}", page_num, options.tesseract_cmd, args.join(" "));

    let child = Command::new(&options.tesseract_cmd)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Ocr2HtmlError::OcrEngineNotFound {
            command: options.tesseract_cmd.clone(),
            detail: e.to_string(),
        })?;

    let output = match options.timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), child.wait_with_output())
            .await
            .map_err(|_| Ocr2HtmlError::OcrTimeout {
                page: page_num,
                secs,
            })?,
        None => child.wait_with_output().await,
    }
    .map_err(|e| Ocr2HtmlError::OcrFailed {
        page: page_num,
        detail: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Ocr2HtmlError::OcrFailed {
            page: page_num,
            detail: format!("tesseract exited with {}: {}", output.status, stderr.trim()),
        });
    }

    let tsv = String::from_utf8(output.stdout).map_err(|e| Ocr2HtmlError::OcrFailed {
        page: page_num,
        detail: format!("TSV output was not valid UTF-8: {e}"),
    })?;

    let scale = if raster.width_px == 0 {
        1.0
    } else {
        page_width_pt / raster.width_px as f32
    };
    let words = parse_tsv(&tsv, scale, options.min_confidence);
    if words.is_empty() {
        warn!("Page {}: OCR found no words", page_num);
    } else {
        info!("Page {}: OCR found {} words", page_num, words.len());
    }

    Ok(words)
}
