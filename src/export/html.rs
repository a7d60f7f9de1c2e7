//! HTML export.
//!
//! Produces a standalone document: `<h1>` for the title, `<h2>`/`<h3>` for
//! section headers, `<p>` for paragraphs, `<ul>`/`<ol>` around runs of list
//! items and `<table>` with `<th>`/`<td>` cells carrying `colspan`/`rowspan`.

use crate::config::HtmlOptions;
use crate::document::{ConvertedDocument, DocItem, PageInfo, TableData};
use html_escape::{encode_double_quoted_attribute, encode_text};

const STYLE: &str = "\
html { background-color: #e1e1e1; font-family: Arial, sans-serif; line-height: 1.6; }
body { margin: 0 auto; max-width: 960px; padding: 30px; background-color: white; }
h1, h2, h3 { color: #333; }
div.page { padding-bottom: 2em; border-bottom: 1px solid #ccc; margin-bottom: 2em; }
img.page-image { max-width: 100%; border: 1px solid #ccc; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; vertical-align: top; }
th { background-color: #f2f2f2; }
.page-header, .page-footer { color: #888; font-size: 0.85em; }
";

/// Render the document as HTML.
pub fn render(doc: &ConvertedDocument, options: &HtmlOptions) -> String {
    let mut w = HtmlWriter::new(options);
    w.out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    w.out.push_str("<meta charset=\"UTF-8\">\n");
    w.out.push_str(&format!("<title>{}</title>\n", encode_text(&doc.name)));
    w.out.push_str("<style>\n");
    w.out.push_str(STYLE);
    w.out.push_str("</style>\n</head>\n<body>\n");

    if options.page_divs {
        for page in &doc.pages {
            w.out.push_str(&format!(
                "<div class='page' data-page-no='{}'>\n",
                page.page_no
            ));
            w.page_image(page);
            for item in doc.page_items(page.page_no) {
                w.item(item);
            }
            w.close_list();
            w.out.push_str("</div>\n");
        }
    } else {
        let mut current_page = None;
        for item in &doc.items {
            if current_page != Some(item.page_no()) {
                current_page = Some(item.page_no());
                if let Some(page) = doc.pages.iter().find(|p| p.page_no == item.page_no()) {
                    w.close_list();
                    w.page_image(page);
                }
            }
            w.item(item);
        }
        w.close_list();
    }

    w.out.push_str("</body>\n</html>\n");
    w.out
}

struct HtmlWriter<'a> {
    options: &'a HtmlOptions,
    out: String,
    /// `Some(enumerated)` while a list element is open.
    open_list: Option<bool>,
}

impl<'a> HtmlWriter<'a> {
    fn new(options: &'a HtmlOptions) -> Self {
        Self {
            options,
            out: String::new(),
            open_list: None,
        }
    }

    fn page_image(&mut self, page: &PageInfo) {
        if !self.options.embed_page_images {
            return;
        }
        if let Some(uri) = &page.image {
            self.out.push_str(&format!(
                "<img class='page-image' src=\"{}\" alt=\"Page {}\">\n",
                encode_double_quoted_attribute(uri),
                page.page_no
            ));
        }
    }

    fn close_list(&mut self) {
        match self.open_list.take() {
            Some(true) => self.out.push_str("</ol>\n"),
            Some(false) => self.out.push_str("</ul>\n"),
            None => {}
        }
    }

    fn item(&mut self, item: &DocItem) {
        if item.is_furniture() && !self.options.include_furniture {
            return;
        }
        if let DocItem::ListItem {
            text, enumerated, ..
        } = item
        {
            if self.open_list != Some(*enumerated) {
                self.close_list();
                self.out
                    .push_str(if *enumerated { "<ol>\n" } else { "<ul>\n" });
                self.open_list = Some(*enumerated);
            }
            self.out
                .push_str(&format!("<li>{}</li>\n", encode_text(text)));
            return;
        }

        self.close_list();
        match item {
            DocItem::Title { text, .. } => {
                self.out.push_str(&format!("<h1>{}</h1>\n", encode_text(text)))
            }
            DocItem::SectionHeader { text, level, .. } => {
                let h = (*level as usize + 1).clamp(2, 6);
                self.out
                    .push_str(&format!("<h{h}>{}</h{h}>\n", encode_text(text)));
            }
            DocItem::Paragraph { text, .. } => {
                self.out.push_str(&format!("<p>{}</p>\n", encode_text(text)))
            }
            DocItem::PageHeader { text, .. } => self.out.push_str(&format!(
                "<div class='page-header'>{}</div>\n",
                encode_text(text)
            )),
            DocItem::PageFooter { text, .. } => self.out.push_str(&format!(
                "<div class='page-footer'>{}</div>\n",
                encode_text(text)
            )),
            DocItem::Table { data, .. } => self.table(data),
            DocItem::ListItem { .. } => {}
        }
    }

    fn table(&mut self, data: &TableData) {
        let grid = data.grid();
        self.out.push_str("<table><tbody>\n");
        for (r, row) in grid.iter().enumerate() {
            self.out.push_str("<tr>");
            for (c, slot) in row.iter().enumerate() {
                match slot {
                    Some(i) => {
                        let cell = &data.cells[*i];
                        // Spanned slots are covered by the cell's start position.
                        if cell.start_row != r || cell.start_col != c {
                            continue;
                        }
                        let tag = if cell.column_header { "th" } else { "td" };
                        self.out.push('<');
                        self.out.push_str(tag);
                        if cell.row_span > 1 {
                            self.out
                                .push_str(&format!(" rowspan=\"{}\"", cell.row_span));
                        }
                        if cell.col_span > 1 {
                            self.out
                                .push_str(&format!(" colspan=\"{}\"", cell.col_span));
                        }
                        self.out.push('>');
                        self.out.push_str(&encode_text(&cell.text));
                        self.out.push_str(&format!("</{tag}>"));
                    }
                    None => self.out.push_str("<td></td>"),
                }
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</tbody></table>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        BoundingBox, DocumentOrigin, InputFormat, Provenance, TableCell, TextSource,
    };
    use pretty_assertions::assert_eq;

    fn prov(page_no: usize) -> Provenance {
        Provenance {
            page_no,
            bbox: BoundingBox::default(),
        }
    }

    fn doc(items: Vec<DocItem>, pages: usize) -> ConvertedDocument {
        let mut d = ConvertedDocument::new(
            "report",
            DocumentOrigin {
                filename: "report.png".into(),
                format: InputFormat::Png,
            },
        );
        d.pages = (1..=pages)
            .map(|page_no| PageInfo {
                page_no,
                width: 612.0,
                height: 792.0,
                text_source: TextSource::Ocr,
                image: None,
            })
            .collect();
        d.items = items;
        d
    }

    /// The `<body>` contents only.
    fn body(html: &str) -> &str {
        let start = html.find("<body>\n").map(|i| i + 7).unwrap_or(0);
        let end = html.find("</body>").unwrap_or(html.len());
        &html[start..end]
    }

    #[test]
    fn document_skeleton() {
        let html = doc(Vec::new(), 0).export_to_html();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("<title>report</title>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn headings_paragraphs_and_lists() {
        let d = doc(
            vec![
                DocItem::Title {
                    text: "Report".into(),
                    prov: prov(1),
                },
                DocItem::SectionHeader {
                    text: "Scope".into(),
                    level: 1,
                    prov: prov(1),
                },
                DocItem::ListItem {
                    text: "one".into(),
                    marker: "•".into(),
                    enumerated: false,
                    prov: prov(1),
                },
                DocItem::ListItem {
                    text: "two".into(),
                    marker: "•".into(),
                    enumerated: false,
                    prov: prov(1),
                },
                DocItem::ListItem {
                    text: "first".into(),
                    marker: "1.".into(),
                    enumerated: true,
                    prov: prov(1),
                },
                DocItem::SectionHeader {
                    text: "Details".into(),
                    level: 2,
                    prov: prov(1),
                },
                DocItem::Paragraph {
                    text: "Body text.".into(),
                    prov: prov(1),
                },
            ],
            1,
        );
        assert_eq!(
            body(&d.export_to_html()),
            "<div class='page' data-page-no='1'>\n\
<h1>Report</h1>\n\
<h2>Scope</h2>\n\
<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n\
<ol>\n<li>first</li>\n</ol>\n\
<h3>Details</h3>\n\
<p>Body text.</p>\n\
</div>\n"
        );
    }

    #[test]
    fn text_is_escaped() {
        let d = doc(
            vec![DocItem::Paragraph {
                text: "a < b & c > d".into(),
                prov: prov(1),
            }],
            1,
        );
        let html = d.export_to_html();
        assert!(html.contains("<p>a &lt; b &amp; c &gt; d</p>"), "{html}");
    }

    #[test]
    fn table_with_header_and_colspan() {
        let cell = |text: &str, row, col, col_span, header| TableCell {
            text: text.into(),
            start_row: row,
            start_col: col,
            row_span: 1,
            col_span,
            column_header: header,
            bbox: None,
        };
        let d = doc(
            vec![DocItem::Table {
                data: TableData {
                    num_rows: 2,
                    num_cols: 3,
                    cells: vec![
                        cell("Item", 0, 0, 1, true),
                        cell("Q1 & Q2", 0, 1, 2, true),
                        cell("Apple", 1, 0, 1, false),
                        cell("12", 1, 2, 1, false),
                    ],
                },
                prov: prov(1),
            }],
            1,
        );
        let html = d.export_to_html_with(&HtmlOptions {
            page_divs: false,
            ..Default::default()
        });
        assert_eq!(
            body(&html),
            "<table><tbody>\n\
<tr><th>Item</th><th colspan=\"2\">Q1 &amp; Q2</th></tr>\n\
<tr><td>Apple</td><td></td><td>12</td></tr>\n\
</tbody></table>\n"
        );
    }

    #[test]
    fn furniture_only_on_request() {
        let d = doc(
            vec![
                DocItem::PageHeader {
                    text: "ACME".into(),
                    prov: prov(1),
                },
                DocItem::Paragraph {
                    text: "Body".into(),
                    prov: prov(1),
                },
            ],
            1,
        );
        assert!(!d.export_to_html().contains("ACME"));
        let with = d.export_to_html_with(&HtmlOptions {
            include_furniture: true,
            ..Default::default()
        });
        assert!(with.contains("<div class='page-header'>ACME</div>"));
    }

    #[test]
    fn one_div_per_page_and_lists_close_at_page_end() {
        let d = doc(
            vec![
                DocItem::ListItem {
                    text: "a".into(),
                    marker: "-".into(),
                    enumerated: false,
                    prov: prov(1),
                },
                DocItem::ListItem {
                    text: "b".into(),
                    marker: "-".into(),
                    enumerated: false,
                    prov: prov(2),
                },
            ],
            2,
        );
        let html = d.export_to_html();
        assert_eq!(html.matches("<div class='page'").count(), 2);
        assert_eq!(html.matches("<ul>").count(), 2);
        assert_eq!(html.matches("</ul>").count(), 2);
    }

    #[test]
    fn page_images_embedded_when_enabled() {
        let mut d = doc(Vec::new(), 1);
        d.pages[0].image = Some("data:image/png;base64,AAAA".into());
        assert!(!d.export_to_html().contains("<img"));
        let html = d.export_to_html_with(&HtmlOptions {
            embed_page_images: true,
            ..Default::default()
        });
        assert!(html.contains(
            "<img class='page-image' src=\"data:image/png;base64,AAAA\" alt=\"Page 1\">"
        ));
    }
}
