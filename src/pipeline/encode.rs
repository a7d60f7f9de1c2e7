//! Image encoding: PNG bytes → base64 data URI.
//!
//! Used to embed rendered pages in the HTML export. The rasters are already
//! PNG on disk, so their bytes are wrapped without decoding.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tracing::debug;

/// Wrap PNG bytes as a `data:image/png;base64,...` URI.
pub fn png_data_uri(png: &[u8]) -> String {
    let b64 = STANDARD.encode(png);
    debug!("Encoded image → {} bytes base64", b64.len());
    format!("data:image/png;base64,{b64}")
}

/// Read a page PNG and encode it as a data URI.
pub async fn encode_page(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(png_data_uri(&bytes))
}
