//! Plain-text export in reading order.

use crate::document::{ConvertedDocument, DocItem};
use crate::pipeline::postprocess::ensure_final_newline;

/// One block per item separated by blank lines; table rows are
/// tab-separated. Page furniture is left out.
pub fn render(doc: &ConvertedDocument) -> String {
    let blocks: Vec<String> = doc
        .items
        .iter()
        .filter(|i| !i.is_furniture())
        .map(|item| match item {
            DocItem::Table { data, .. } => (0..data.num_rows)
                .map(|r| {
                    (0..data.num_cols)
                        .map(|c| data.text_at(r, c))
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            DocItem::ListItem { text, marker, .. } => format!("{marker} {text}"),
            other => other.text().unwrap_or_default().to_string(),
        })
        .filter(|b| !b.trim().is_empty())
        .collect();

    ensure_final_newline(&blocks.join("\n\n"))
}
