//! Serialisation of a [`ConvertedDocument`] into output formats.
//!
//! HTML is the primary format; Markdown, plain text and JSON share the same
//! reading order and drop page furniture unless asked otherwise.

pub mod html;
pub mod markdown;
pub mod text;

use crate::config::HtmlOptions;
use crate::document::ConvertedDocument;
use crate::error::Ocr2HtmlError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output formats a document can be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Markdown,
    Text,
    Json,
}

impl OutputFormat {
    /// Conventional file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension; unknown extensions are `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "txt" | "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        };
        f.write_str(s)
    }
}

impl ConvertedDocument {
    /// HTML with default [`HtmlOptions`].
    pub fn export_to_html(&self) -> String {
        html::render(self, &HtmlOptions::default())
    }

    pub fn export_to_html_with(&self, options: &HtmlOptions) -> String {
        html::render(self, options)
    }

    pub fn export_to_markdown(&self) -> String {
        markdown::render(self)
    }

    pub fn export_to_text(&self) -> String {
        text::render(self)
    }

    /// Pretty-printed JSON of the whole document model.
    pub fn export_to_json(&self) -> Result<String, Ocr2HtmlError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Ocr2HtmlError::Internal(format!("JSON serialisation failed: {e}")))
    }

    /// Render in `format`; `html` only affects HTML output.
    pub fn export(&self, format: OutputFormat, html: &HtmlOptions) -> Result<String, Ocr2HtmlError> {
        Ok(match format {
            OutputFormat::Html => self.export_to_html_with(html),
            OutputFormat::Markdown => self.export_to_markdown(),
            OutputFormat::Text => self.export_to_text(),
            OutputFormat::Json => self.export_to_json()?,
        })
    }
}
