//! Layout analysis: turn the words of a page into document items.
//!
//! Words left over after table detection are grouped by their paragraph and
//! line ids, then each paragraph is classified by simple geometric and
//! lexical cues:
//!
//! | Label          | Cue                                                        |
//! |----------------|------------------------------------------------------------|
//! | PageHeader     | inside the top 5 % of the page, at most two lines           |
//! | PageFooter     | inside the bottom 5 % of the page, at most two lines        |
//! | Title          | first body paragraph of the document, ≥ 1.5× median height  |
//! | SectionHeader  | ≤ 2 lines, ≤ 12 words, unterminated, tall or numbered       |
//! | ListItem       | lines opening with a bullet or an enumerator                |
//! | Paragraph      | everything else                                             |
//!
//! Paragraphs keep the order the text source reported them in. Tables are
//! slotted in before the first paragraph starting below their top edge.

use crate::document::{BoundingBox, DocItem, Provenance};
use crate::pipeline::postprocess::join_lines;
use crate::pipeline::table::DetectedTable;
use crate::pipeline::words::{median, OcrWord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Share of the page height at the top and bottom treated as furniture bands.
const FURNITURE_BAND: f32 = 0.05;

/// A title is at least this many times the page's median word height.
const TITLE_HEIGHT_RATIO: f32 = 1.5;

/// A section header is at least this many times the page's median word height.
const HEADER_HEIGHT_RATIO: f32 = 1.2;

const MAX_HEADER_LINES: usize = 2;
const MAX_HEADER_WORDS: usize = 12;

/// Bullet glyphs may touch the text; dashes and enumerators need a space.
static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:([•▪◦·●■])\s*|([*–-]|\d{1,3}[.)]|\([0-9A-Za-z]{1,3}\)|[a-z][.)])\s+)(\S.*)$",
    )
    .unwrap()
});

/// `2.1 Scope`, `3 Results`. A single number with a dot (`1. Buy`) is a
/// list enumerator instead.
static RE_NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)+\.?|\d+)\s+\p{Lu}").unwrap());

/// A paragraph of words, lines sorted top to bottom and words left to right.
struct Block<'a> {
    lines: Vec<Vec<&'a OcrWord>>,
    bbox: BoundingBox,
}

impl Block<'_> {
    fn line_texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    fn word_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    fn height(&self) -> f32 {
        let mut heights: Vec<f32> = self
            .lines
            .iter()
            .flatten()
            .map(|w| w.bbox.height())
            .collect();
        median(&mut heights).unwrap_or(0.0)
    }
}

/// Builds items page by page, remembering document-level state.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    /// A body item has been emitted; no title may follow.
    body_seen: bool,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out one page.
    ///
    /// `words` is every word on the page; those claimed by `tables` are left
    /// out of the paragraph flow.
    pub fn layout_page(
        &mut self,
        page_no: usize,
        page_height: f32,
        words: &[OcrWord],
        tables: Vec<DetectedTable>,
    ) -> Vec<DocItem> {
        let consumed: HashSet<usize> = tables
            .iter()
            .flat_map(|t| t.word_indices.iter().copied())
            .collect();
        let blocks = group_blocks(words, &consumed);

        let mut heights: Vec<f32> = words
            .iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i))
            .map(|(_, w)| w.bbox.height())
            .collect();
        let median_height = median(&mut heights).unwrap_or(0.0);

        let mut pending: Vec<DetectedTable> = tables;
        pending.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));
        let mut pending = pending.into_iter().peekable();

        let mut items = Vec::new();
        for block in &blocks {
            while let Some(table) = pending.next_if(|t| block.bbox.top >= t.bbox.top) {
                items.push(table_item(page_no, table));
                self.body_seen = true;
            }
            items.extend(self.classify(page_no, page_height, median_height, block));
        }
        for table in pending {
            items.push(table_item(page_no, table));
            self.body_seen = true;
        }
        items
    }

    fn classify(
        &mut self,
        page_no: usize,
        page_height: f32,
        median_height: f32,
        block: &Block<'_>,
    ) -> Vec<DocItem> {
        let prov = Provenance {
            page_no,
            bbox: block.bbox,
        };
        let text = join_lines(&block.line_texts());
        if text.is_empty() {
            return Vec::new();
        }

        let short = block.lines.len() <= MAX_HEADER_LINES;
        let band = page_height * FURNITURE_BAND;
        if short && block.bbox.bottom <= band {
            return vec![DocItem::PageHeader { text, prov }];
        }
        if short && block.bbox.top >= page_height - band {
            return vec![DocItem::PageFooter { text, prov }];
        }

        let height = block.height();
        let tall = |ratio: f32| median_height > 0.0 && height >= ratio * median_height;

        if !self.body_seen && short && tall(TITLE_HEIGHT_RATIO) {
            self.body_seen = true;
            return vec![DocItem::Title { text, prov }];
        }
        self.body_seen = true;

        let numbering = RE_NUMBERED_HEADING
            .captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim_end_matches('.').split('.').count());
        let unterminated = !text.ends_with(['.', ',', ';']);
        if short
            && block.word_count() <= MAX_HEADER_WORDS
            && unterminated
            && (tall(HEADER_HEIGHT_RATIO) || numbering.is_some())
        {
            let level = if tall(TITLE_HEIGHT_RATIO) || numbering == Some(1) {
                1
            } else {
                2
            };
            return vec![DocItem::SectionHeader { text, level, prov }];
        }

        if let Some(list) = split_list_items(page_no, block) {
            return list;
        }

        vec![DocItem::Paragraph { text, prov }]
    }
}

fn table_item(page_no: usize, table: DetectedTable) -> DocItem {
    DocItem::Table {
        data: table.data,
        prov: Provenance {
            page_no,
            bbox: table.bbox,
        },
    }
}

/// Group unconsumed words by paragraph, then by line, in first-seen order.
fn group_blocks<'a>(words: &'a [OcrWord], consumed: &HashSet<usize>) -> Vec<Block<'a>> {
    let mut order: Vec<(u32, u32)> = Vec::new();
    let mut by_par: HashMap<(u32, u32), Vec<&'a OcrWord>> = HashMap::new();
    for (i, w) in words.iter().enumerate() {
        if consumed.contains(&i) {
            continue;
        }
        let key = w.paragraph_key();
        by_par
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(w);
    }

    order
        .into_iter()
        .filter_map(|key| {
            let par_words = by_par.remove(&key)?;
            let mut line_order: Vec<u32> = Vec::new();
            let mut by_line: HashMap<u32, Vec<&'a OcrWord>> = HashMap::new();
            for w in par_words {
                by_line
                    .entry(w.line)
                    .or_insert_with(|| {
                        line_order.push(w.line);
                        Vec::new()
                    })
                    .push(w);
            }
            let lines: Vec<Vec<&'a OcrWord>> = line_order
                .into_iter()
                .filter_map(|l| {
                    let mut line = by_line.remove(&l)?;
                    line.sort_by(|a, b| a.bbox.left.total_cmp(&b.bbox.left));
                    Some(line)
                })
                .collect();
            let bbox = BoundingBox::enclosing(lines.iter().flatten().map(|w| &w.bbox))?;
            Some(Block { lines, bbox })
        })
        .collect()
}

/// Split a block whose first line opens with a list marker into list items.
///
/// Every line that opens with a marker starts a new item; other lines
/// continue the current one.
fn split_list_items(page_no: usize, block: &Block<'_>) -> Option<Vec<DocItem>> {
    struct Item {
        marker: String,
        lines: Vec<String>,
        bbox: BoundingBox,
    }

    let texts = block.line_texts();
    if !RE_LIST_MARKER.is_match(texts.first()?.trim()) {
        return None;
    }

    let mut items: Vec<Item> = Vec::new();
    for (line, text) in block.lines.iter().zip(&texts) {
        let bbox = BoundingBox::enclosing(line.iter().map(|w| &w.bbox))?;
        let text = text.trim();
        match RE_LIST_MARKER.captures(text) {
            Some(caps) => {
                let marker = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                let rest = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
                items.push(Item {
                    marker,
                    lines: vec![rest.to_string()],
                    bbox,
                });
            }
            None => {
                let current = items.last_mut()?;
                current.lines.push(text.to_string());
                current.bbox = current.bbox.union(&bbox);
            }
        }
    }

    Some(
        items
            .into_iter()
            .map(|item| DocItem::ListItem {
                text: join_lines(&item.lines),
                enumerated: item.marker.chars().any(char::is_alphanumeric),
                marker: item.marker,
                prov: Provenance {
                    page_no,
                    bbox: item.bbox,
                },
            })
            .collect(),
    )
}
