//! Markdown export: ATX headings, paragraphs, lists and GFM tables.

use crate::document::{ConvertedDocument, DocItem, TableData};
use crate::pipeline::postprocess::{collapse_blank_lines, ensure_final_newline};

/// Render the document body as Markdown, without page furniture.
pub fn render(doc: &ConvertedDocument) -> String {
    let mut out = String::new();
    // Position in the current enumerated run, 0 outside lists.
    let mut list_counter = 0usize;
    let mut in_list = false;

    for item in doc.items.iter().filter(|i| !i.is_furniture()) {
        if let DocItem::ListItem {
            text, enumerated, ..
        } = item
        {
            if !in_list {
                out.push('\n');
                in_list = true;
                list_counter = 0;
            }
            if *enumerated {
                list_counter += 1;
                out.push_str(&format!("{list_counter}. {}\n", escape_inline(text)));
            } else {
                out.push_str(&format!("- {}\n", escape_inline(text)));
            }
            continue;
        }
        in_list = false;

        out.push('\n');
        match item {
            DocItem::Title { text, .. } => out.push_str(&format!("# {}\n", escape_inline(text))),
            DocItem::SectionHeader { text, level, .. } => {
                let hashes = "#".repeat((*level as usize + 1).clamp(2, 6));
                out.push_str(&format!("{hashes} {}\n", escape_inline(text)));
            }
            DocItem::Paragraph { text, .. } => {
                out.push_str(&escape_inline(text));
                out.push('\n');
            }
            DocItem::Table { data, .. } => out.push_str(&table(data)),
            DocItem::PageHeader { .. } | DocItem::PageFooter { .. } | DocItem::ListItem { .. } => {}
        }
    }

    ensure_final_newline(&collapse_blank_lines(out.trim_start()))
}

/// Escape characters that would otherwise start Markdown syntax at the
/// beginning of a line.
fn escape_inline(text: &str) -> String {
    let mut s = text.to_string();
    if s.starts_with(['#', '>', '+']) {
        s.insert(0, '\\');
    }
    s
}

fn table(data: &TableData) -> String {
    if data.num_rows == 0 || data.num_cols == 0 {
        return String::new();
    }
    let cell = |r: usize, c: usize| data.text_at(r, c).replace('|', "\\|");

    let mut out = String::new();
    for r in 0..data.num_rows {
        out.push('|');
        for c in 0..data.num_cols {
            out.push(' ');
            out.push_str(&cell(r, c));
            out.push_str(" |");
        }
        out.push('\n');
        if r == 0 {
            out.push('|');
            for _ in 0..data.num_cols {
                out.push_str(" --- |");
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BoundingBox, DocumentOrigin, InputFormat, Provenance, TableCell};
    use pretty_assertions::assert_eq;

    fn prov() -> Provenance {
        Provenance {
            page_no: 1,
            bbox: BoundingBox::default(),
        }
    }

    fn doc(items: Vec<DocItem>) -> ConvertedDocument {
        let mut d = ConvertedDocument::new(
            "scan",
            DocumentOrigin {
                filename: "scan.pdf".into(),
                format: InputFormat::Pdf,
            },
        );
        d.items = items;
        d
    }

    #[test]
    fn headings_lists_and_paragraphs() {
        let d = doc(vec![
            DocItem::Title {
                text: "Report".into(),
                prov: prov(),
            },
            DocItem::PageHeader {
                text: "ACME".into(),
                prov: prov(),
            },
            DocItem::SectionHeader {
                text: "Steps".into(),
                level: 1,
                prov: prov(),
            },
            DocItem::ListItem {
                text: "Open".into(),
                marker: "a)".into(),
                enumerated: true,
                prov: prov(),
            },
            DocItem::ListItem {
                text: "Close".into(),
                marker: "b)".into(),
                enumerated: true,
                prov: prov(),
            },
            DocItem::Paragraph {
                text: "Done.".into(),
                prov: prov(),
            },
        ]);
        assert_eq!(
            d.export_to_markdown(),
            "# Report\n\n## Steps\n\n1. Open\n2. Close\n\nDone.\n"
        );
    }

    #[test]
    fn gfm_table_with_pipe_escaped() {
        let d = doc(vec![DocItem::Table {
            data: TableData {
                num_rows: 2,
                num_cols: 2,
                cells: vec![
                    TableCell {
                        text: "A|B".into(),
                        start_row: 0,
                        start_col: 0,
                        row_span: 1,
                        col_span: 2,
                        column_header: true,
                        bbox: None,
                    },
                    TableCell {
                        text: "x".into(),
                        start_row: 1,
                        start_col: 1,
                        row_span: 1,
                        col_span: 1,
                        ..Default::default()
                    },
                ],
            },
            prov: prov(),
        }]);
        assert_eq!(
            d.export_to_markdown(),
            "| A\\|B | A\\|B |\n| --- | --- |\n|  | x |\n"
        );
    }

    #[test]
    fn empty_document_is_single_newline() {
        assert_eq!(doc(Vec::new()).export_to_markdown(), "\n");
    }
}
