//! Binding to the pdfium shared library.
//!
//! Resolution order:
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to `libpdfium.so` / `.dylib` / `pdfium.dll`.
//! 2. A pdfium library next to the current working directory.
//! 3. The system library search path.
//!
//! pdfium is bound per call, inside the blocking task that uses it, so no
//! `Pdfium` handle crosses an `.await`.

use crate::error::Ocr2HtmlError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind pdfium, trying each location in turn.
pub fn bind() -> Result<Pdfium, Ocr2HtmlError> {
    if let Some(path) = explicit_library_path() {
        debug!("Binding pdfium from {}", path.display());
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            Ocr2HtmlError::PdfiumBindingFailed(format!(
                "{} = '{}': {:?}",
                PDFIUM_LIB_PATH_ENV,
                path.display(),
                e
            ))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    let bindings = Pdfium::bind_to_library(&local)
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| Ocr2HtmlError::PdfiumBindingFailed(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Returns the library named by `PDFIUM_LIB_PATH`, when set and non-empty.
fn explicit_library_path() -> Option<PathBuf> {
    std::env::var(PDFIUM_LIB_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Returns `true` if a pdfium library can be bound right now.
///
/// The e2e tests use this to skip when no library is installed.
pub fn is_available() -> bool {
    bind().is_ok()
}
