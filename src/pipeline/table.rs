//! Table-structure detection on positioned words.
//!
//! Purely geometric. Words are clustered into rows by vertical centre, each
//! row is cut into segments at wide horizontal gaps, and a run of
//! consecutive multi-segment rows becomes a table candidate. Columns come
//! from the rows with the most segments; a candidate is kept only when it
//! has enough columns and its cells are reasonably filled. Candidates whose
//! columns are each a separate paragraph of the text source are multi-column
//! prose and are dropped.
//!
//! With cell matching on, every word is placed in the column holding its
//! horizontal centre. With it off, each segment stays one cell and spans
//! every column it overlaps.

use crate::config::TableStructureOptions;
use crate::document::{BoundingBox, TableCell, TableData};
use crate::pipeline::words::{median_height, OcrWord};
use std::collections::HashSet;
use tracing::debug;

/// Rows further apart than this many word heights end a table.
const MAX_ROW_GAP_RATIO: f32 = 2.5;

/// Minimum average share of a row's columns that must hold a cell.
const MIN_FILL_RATIO: f32 = 0.5;

/// A table found on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub data: TableData,
    /// Union of the table's words.
    pub bbox: BoundingBox,
    /// Indices into the page's word list of every word the table consumed.
    pub word_indices: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Segment {
    words: Vec<usize>,
    bbox: BoundingBox,
}

#[derive(Debug, Clone)]
struct Row {
    /// Sorted left to right.
    words: Vec<usize>,
    bbox: BoundingBox,
    height: f32,
    segments: Vec<Segment>,
}

/// Find tables among the words of one page.
pub fn detect_tables(words: &[OcrWord], options: &TableStructureOptions) -> Vec<DetectedTable> {
    let rows: Vec<Row> = cluster_rows(words)
        .into_iter()
        .filter_map(|ids| build_row(words, ids, options.column_gap_ratio))
        .collect();

    let mut tables = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        if rows[i].segments.len() < 2 {
            i += 1;
            continue;
        }
        let mut j = i + 1;
        while j < rows.len() && rows[j].segments.len() >= 2 && rows_adjacent(&rows[j - 1], &rows[j])
        {
            j += 1;
        }
        if j - i >= options.min_rows {
            if let Some(table) = build_table(words, &rows[i..j], options) {
                debug!(
                    "Table {}x{} at ({:.0}, {:.0})",
                    table.data.num_rows, table.data.num_cols, table.bbox.left, table.bbox.top
                );
                tables.push(table);
            }
        }
        i = j;
    }
    tables
}

/// Group word indices into rows sharing a vertical centre, top to bottom.
fn cluster_rows(words: &[OcrWord]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..words.len()).collect();
    order.sort_by(|&a, &b| {
        words[a]
            .bbox
            .y_center()
            .total_cmp(&words[b].bbox.y_center())
    });

    let mut rows: Vec<Vec<usize>> = Vec::new();
    let mut anchor: Option<BoundingBox> = None;
    for i in order {
        let b = words[i].bbox;
        let joins = anchor.is_some_and(|a| {
            (b.y_center() - a.y_center()).abs() <= 0.5 * a.height().max(b.height())
        });
        if joins {
            if let Some(row) = rows.last_mut() {
                row.push(i);
            }
        } else {
            rows.push(vec![i]);
            anchor = Some(b);
        }
    }

    for row in &mut rows {
        row.sort_by(|&a, &b| words[a].bbox.left.total_cmp(&words[b].bbox.left));
    }
    rows
}

fn build_row(words: &[OcrWord], ids: Vec<usize>, gap_ratio: f32) -> Option<Row> {
    let bbox = BoundingBox::enclosing(ids.iter().map(|&i| &words[i].bbox))?;
    let refs: Vec<&OcrWord> = ids.iter().map(|&i| &words[i]).collect();
    let height = median_height(&refs);
    let max_gap = height * gap_ratio;

    let mut segments: Vec<Segment> = Vec::new();
    for &i in &ids {
        let b = words[i].bbox;
        match segments.last_mut() {
            Some(seg) if b.left - seg.bbox.right <= max_gap => {
                seg.words.push(i);
                seg.bbox = seg.bbox.union(&b);
            }
            _ => segments.push(Segment {
                words: vec![i],
                bbox: b,
            }),
        }
    }

    Some(Row {
        words: ids,
        bbox,
        height,
        segments,
    })
}

fn rows_adjacent(upper: &Row, lower: &Row) -> bool {
    lower.bbox.top - upper.bbox.bottom <= MAX_ROW_GAP_RATIO * upper.height.max(lower.height)
}

/// Column intervals `(left, right)` sorted left to right.
fn column_bounds(rows: &[Row]) -> Vec<(f32, f32)> {
    let max_segments = rows.iter().map(|r| r.segments.len()).max().unwrap_or(0);
    let mut intervals: Vec<(f32, f32)> = rows
        .iter()
        .filter(|r| r.segments.len() == max_segments)
        .flat_map(|r| r.segments.iter().map(|s| (s.bbox.left, s.bbox.right)))
        .collect();
    intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut columns: Vec<(f32, f32)> = Vec::new();
    for (left, right) in intervals {
        if let Some(last) = columns.last_mut() {
            if left <= last.1 {
                last.1 = last.1.max(right);
                continue;
            }
        }
        columns.push((left, right));
    }

    // Segments that sit in exactly one column widen it.
    for seg in rows.iter().flat_map(|r| r.segments.iter()) {
        if let [c] = overlapping_columns(&columns, &seg.bbox)[..] {
            columns[c].0 = columns[c].0.min(seg.bbox.left);
            columns[c].1 = columns[c].1.max(seg.bbox.right);
        }
    }
    columns
}

fn overlapping_columns(columns: &[(f32, f32)], bbox: &BoundingBox) -> Vec<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, col)| bbox.right.min(col.1) - bbox.left.max(col.0) > 0.0)
        .map(|(i, _)| i)
        .collect()
}

/// Column containing `x`, or the nearest one.
fn column_for(columns: &[(f32, f32)], x: f32) -> usize {
    let distance = |&(l, r): &(f32, f32)| {
        if x < l {
            l - x
        } else if x > r {
            x - r
        } else {
            0.0
        }
    };
    columns
        .iter()
        .enumerate()
        .min_by(|a, b| distance(a.1).total_cmp(&distance(b.1)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// True when every column holds the words of exactly one paragraph and no
/// two columns share a paragraph: the layout of side-by-side text columns.
fn reads_as_prose(words: &[OcrWord], rows: &[Row], columns: &[(f32, f32)]) -> bool {
    let mut keys: Vec<Option<(u32, u32)>> = vec![None; columns.len()];
    for &wi in rows.iter().flat_map(|r| r.words.iter()) {
        let c = column_for(columns, words[wi].bbox.x_center());
        let key = words[wi].paragraph_key();
        let slot = &mut keys[c];
        match *slot {
            None => *slot = Some(key),
            Some(k) if k == key => {}
            Some(_) => return false,
        }
    }
    let mut seen = HashSet::new();
    keys.iter()
        .all(|k| matches!(k, Some(key) if seen.insert(*key)))
}

fn make_cell(words: &[OcrWord], ids: &[usize], row: usize, col: usize, col_span: usize) -> TableCell {
    TableCell {
        text: ids
            .iter()
            .map(|&i| words[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        start_row: row,
        start_col: col,
        row_span: 1,
        col_span,
        column_header: row == 0,
        bbox: BoundingBox::enclosing(ids.iter().map(|&i| &words[i].bbox)),
    }
}

fn build_table(
    words: &[OcrWord],
    rows: &[Row],
    options: &TableStructureOptions,
) -> Option<DetectedTable> {
    let columns = column_bounds(rows);
    let num_cols = columns.len();
    if num_cols < options.min_cols.max(2) {
        return None;
    }
    if reads_as_prose(words, rows, &columns) {
        debug!("Rejected {}-column candidate: columns are separate paragraphs", num_cols);
        return None;
    }

    let mut cells: Vec<TableCell> = Vec::new();
    for (r, row) in rows.iter().enumerate() {
        if options.do_cell_matching {
            let mut by_col: Vec<Vec<usize>> = vec![Vec::new(); num_cols];
            for &wi in &row.words {
                by_col[column_for(&columns, words[wi].bbox.x_center())].push(wi);
            }
            for (c, ids) in by_col.iter().enumerate() {
                if !ids.is_empty() {
                    cells.push(make_cell(words, ids, r, c, 1));
                }
            }
        } else {
            let mut row_cells: Vec<TableCell> = Vec::new();
            for seg in &row.segments {
                let hits = overlapping_columns(&columns, &seg.bbox);
                let (start, end) = match (hits.first(), hits.last()) {
                    (Some(&s), Some(&e)) => (s, e),
                    _ => {
                        let c = column_for(&columns, seg.bbox.x_center());
                        (c, c)
                    }
                };
                if let Some(prev) = row_cells.last_mut() {
                    if start < prev.end_col() {
                        // Collides with the previous cell: fold it in.
                        let seg_cell = make_cell(words, &seg.words, r, start, 1);
                        prev.text.push(' ');
                        prev.text.push_str(&seg_cell.text);
                        prev.col_span = prev.end_col().max(end + 1) - prev.start_col;
                        prev.bbox = match (prev.bbox, seg_cell.bbox) {
                            (Some(a), Some(b)) => Some(a.union(&b)),
                            (a, b) => a.or(b),
                        };
                        continue;
                    }
                }
                row_cells.push(make_cell(words, &seg.words, r, start, end - start + 1));
            }
            cells.extend(row_cells);
        }
    }

    let filled: usize = cells.iter().map(|c| c.col_span).sum();
    let average = filled as f32 / rows.len() as f32;
    if average < MIN_FILL_RATIO * num_cols as f32 {
        debug!(
            "Rejected {}-column candidate: {:.1} cells per row",
            num_cols, average
        );
        return None;
    }

    let word_indices: Vec<usize> = rows.iter().flat_map(|r| r.words.iter().copied()).collect();
    let bbox = BoundingBox::enclosing(word_indices.iter().map(|&i| &words[i].bbox))?;

    Some(DetectedTable {
        data: TableData {
            num_rows: rows.len(),
            num_cols,
            cells,
        },
        bbox,
        word_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::words::word;

    /// A 10pt-high word, 6pt per character.
    fn w(text: &str, left: f32, top: f32) -> OcrWord {
        word(text, left, top, text.chars().count() as f32 * 6.0, 10.0)
    }

    fn price_list() -> Vec<OcrWord> {
        vec![
            w("Name", 72.0, 100.0),
            w("Qty", 200.0, 100.0),
            w("Price", 300.0, 100.0),
            w("Apple", 72.0, 120.0),
            w("3", 200.0, 120.0),
            w("1.20", 300.0, 120.0),
            w("Pear", 72.0, 140.0),
            w("10", 200.0, 140.0),
            w("0.80", 300.0, 140.0),
        ]
    }

    #[test]
    fn simple_grid_detected() {
        let tables = detect_tables(&price_list(), &TableStructureOptions::default());
        assert_eq!(tables.len(), 1);
        let t = &tables[0].data;
        assert_eq!((t.num_rows, t.num_cols), (3, 3));
        assert_eq!(t.text_at(0, 2), "Price");
        assert_eq!(t.text_at(2, 1), "10");
        assert!(t.cells.iter().filter(|c| c.start_row == 0).all(|c| c.column_header));
        assert!(t.cells.iter().filter(|c| c.start_row > 0).all(|c| !c.column_header));
        assert_eq!(tables[0].word_indices.len(), 9);
        assert_eq!(tables[0].bbox.left, 72.0);
        assert_eq!(tables[0].bbox.top, 100.0);
    }

    #[test]
    fn words_in_rows_are_found_regardless_of_input_order() {
        let mut words = price_list();
        words.reverse();
        let tables = detect_tables(&words, &TableStructureOptions::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].data.text_at(1, 0), "Apple");
    }

    #[test]
    fn prose_is_not_a_table() {
        let mut words = Vec::new();
        for (line, top) in [(0, 100.0), (1, 114.0), (2, 128.0)] {
            let mut x = 72.0;
            for t in ["The", "quick", "brown", "fox", "jumps"] {
                let mut wd = w(t, x, top);
                wd.line = line + 1;
                x = wd.bbox.right + 4.0;
                words.push(wd);
            }
        }
        assert!(detect_tables(&words, &TableStructureOptions::default()).is_empty());
    }

    #[test]
    fn side_by_side_paragraphs_are_not_a_table() {
        let mut words = Vec::new();
        for (block, left) in [(1, 72.0), (2, 320.0)] {
            for (line, top) in [(1, 100.0), (2, 114.0), (3, 128.0), (4, 142.0)] {
                let mut x = left;
                for t in ["columns", "of", "text"] {
                    let mut wd = w(t, x, top);
                    wd.block = block;
                    wd.line = line;
                    x = wd.bbox.right + 4.0;
                    words.push(wd);
                }
            }
        }
        assert!(detect_tables(&words, &TableStructureOptions::default()).is_empty());
    }

    #[test]
    fn table_cells_in_separate_blocks_are_kept() {
        // Tesseract often reports each cell as its own block.
        let words: Vec<OcrWord> = price_list()
            .into_iter()
            .enumerate()
            .map(|(i, mut wd)| {
                wd.block = i as u32 + 1;
                wd
            })
            .collect();
        let tables = detect_tables(&words, &TableStructureOptions::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].data.num_cols, 3);
    }

    #[test]
    fn single_row_with_gap_is_not_a_table() {
        let words = vec![w("Invoice", 72.0, 100.0), w("2024-03-01", 400.0, 100.0)];
        assert!(detect_tables(&words, &TableStructureOptions::default()).is_empty());
    }

    #[test]
    fn closely_spaced_words_share_a_cell() {
        let mut words = price_list();
        words[3] = w("Green", 72.0, 120.0);
        words.push(w("apple", 72.0 + 30.0 + 4.0, 120.0));
        let tables = detect_tables(&words, &TableStructureOptions::default());
        assert_eq!(tables[0].data.text_at(1, 0), "Green apple");
        assert_eq!(tables[0].data.num_cols, 3);
    }

    fn spanning_rows() -> Vec<OcrWord> {
        vec![
            w("Item", 72.0, 100.0),
            w("Q1", 200.0, 100.0),
            w("Q2", 300.0, 100.0),
            w("Apple", 72.0, 120.0),
            w("10", 200.0, 120.0),
            w("12", 300.0, 120.0),
            w("Total", 72.0, 140.0),
            w("twenty", 200.0, 140.0),
            w("two", 240.0, 140.0),
            w("units", 262.0, 140.0),
            w("sold", 296.0, 140.0),
        ]
    }

    #[test]
    fn without_cell_matching_segments_span_columns() {
        let options = TableStructureOptions {
            do_cell_matching: false,
            ..Default::default()
        };
        let tables = detect_tables(&spanning_rows(), &options);
        assert_eq!(tables.len(), 1);
        let t = &tables[0].data;
        let span = t
            .cells
            .iter()
            .find(|c| c.start_row == 2 && c.start_col == 1)
            .unwrap();
        assert_eq!(span.col_span, 2);
        assert_eq!(span.text, "twenty two units sold");
        assert_eq!(t.text_at(2, 2), "twenty two units sold");
    }

    #[test]
    fn with_cell_matching_words_split_by_column() {
        let tables = detect_tables(&spanning_rows(), &TableStructureOptions::default());
        let t = &tables[0].data;
        assert!(t.cells.iter().all(|c| c.col_span == 1));
        assert_eq!(t.text_at(2, 1), "twenty two");
        assert_eq!(t.text_at(2, 2), "units sold");
    }

    #[test]
    fn min_rows_is_respected() {
        let options = TableStructureOptions {
            min_rows: 4,
            ..Default::default()
        };
        assert!(detect_tables(&price_list(), &options).is_empty());
    }

    #[test]
    fn distant_rows_form_separate_candidates() {
        let mut words = price_list();
        // Push the last row far below; the first two rows still form a table.
        for wd in words.iter_mut().skip(6) {
            wd.bbox.top += 300.0;
            wd.bbox.bottom += 300.0;
        }
        let tables = detect_tables(&words, &TableStructureOptions::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].data.num_rows, 2);
        assert!(!tables[0].word_indices.contains(&6));
    }
}
