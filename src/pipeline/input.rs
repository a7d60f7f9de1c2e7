//! Input resolution: normalise a user-supplied path or URL to a local file
//! and decide whether it is an image or a PDF.
//!
//! pdfium and tesseract both need a file-system path, so URLs are downloaded
//! into a `TempDir` that lives as long as the [`InputArtifact`]. The format
//! is sniffed from the leading bytes, never from the extension: scanners
//! routinely produce `.pdf` files that are really JPEGs and vice versa.

use crate::document::InputFormat;
use crate::error::Ocr2HtmlError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Bytes read from the head of a file for format detection.
const SNIFF_LEN: usize = 32;

/// A resolved input file plus its detected format.
pub struct InputArtifact {
    path: PathBuf,
    format: InputFormat,
    /// Keeps a downloaded file alive until processing completes.
    _temp_dir: Option<TempDir>,
}

impl InputArtifact {
    /// Path to the local copy of the input.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// File stem used as the document name.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// File name recorded as the document origin.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local file with a known format.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputArtifact, Ocr2HtmlError> {
    if input.trim().is_empty() {
        return Err(Ocr2HtmlError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Detect the format of a byte prefix.
///
/// Returns `None` for anything that is neither a PDF nor a supported image.
pub fn sniff_format(head: &[u8]) -> Option<InputFormat> {
    if head.starts_with(b"%PDF") {
        return Some(InputFormat::Pdf);
    }
    image::guess_format(head)
        .ok()
        .and_then(InputFormat::from_image_format)
}

/// Resolve a local file path, validating existence and format.
pub fn resolve_local(path: &Path) -> Result<InputArtifact, Ocr2HtmlError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Ocr2HtmlError::FileNotFound { path });
    }
    if !path.is_file() {
        return Err(Ocr2HtmlError::InvalidInput {
            input: path.display().to_string(),
        });
    }

    let head = match std::fs::File::open(&path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(SNIFF_LEN);
            f.take(SNIFF_LEN as u64)
                .read_to_end(&mut head)
                .map_err(|_| Ocr2HtmlError::PermissionDenied { path: path.clone() })?;
            head
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Ocr2HtmlError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Ocr2HtmlError::FileNotFound { path });
        }
    };

    let format = sniff_format(&head).ok_or_else(|| Ocr2HtmlError::UnsupportedFormat {
        magic: magic_of(&head),
        path: path.clone(),
    })?;

    debug!("Resolved local {} input: {}", format, path.display());
    Ok(InputArtifact {
        path,
        format,
        _temp_dir: None,
    })
}

fn magic_of(head: &[u8]) -> [u8; 4] {
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    magic
}

/// Download a URL to a temporary directory and return the artifact.
async fn download_url(url: &str, timeout_secs: u64) -> Result<InputArtifact, Ocr2HtmlError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Ocr2HtmlError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Ocr2HtmlError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Ocr2HtmlError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Ocr2HtmlError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Ocr2HtmlError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let temp_dir = TempDir::new().map_err(|e| Ocr2HtmlError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(filename_from_url(url));

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| Ocr2HtmlError::Internal(format!("Failed to write temp file: {}", e)))?;

    let format = sniff_format(&bytes[..bytes.len().min(SNIFF_LEN)]).ok_or_else(|| {
        Ocr2HtmlError::UnsupportedFormat {
            path: file_path.clone(),
            magic: magic_of(&bytes),
        }
    })?;

    info!("Downloaded {} input to: {}", format, file_path.display());

    Ok(InputArtifact {
        path: file_path,
        format,
        _temp_dir: Some(temp_dir),
    })
}

/// Extract a reasonable filename from the URL path.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded".to_string()
}
