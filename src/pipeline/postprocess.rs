//! Post-processing: deterministic cleanup of recognised text.
//!
//! OCR output is noisy in predictable ways: ligature glyphs instead of
//! letters, zero-width characters from the text layer, words hyphenated
//! across line breaks, runs of spaces where tesseract saw a wide gap. The
//! rules here fix those without touching content. Each is a pure
//! `&str → String` function and independently testable.
//!
//! ## Rule Order
//!
//! Invisible characters go first so they cannot hide a hyphen from the
//! line-joining rule; whitespace is collapsed last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Clean the text of a single item.
///
/// Rules (applied in order):
/// 1. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 2. Expand typographic ligatures (`ﬁ` → `fi`)
/// 3. Normalise quotes and dashes OCR tends to confuse
/// 4. Collapse runs of whitespace to a single space and trim
pub fn clean_text(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = expand_ligatures(&s);
    let s = normalise_punctuation(&s);
    collapse_whitespace(&s)
}

/// Join the lines of a paragraph into one string.
///
/// A line ending in a hyphen after a lowercase letter is joined to the next
/// line without the hyphen when the next line starts lowercase
/// (`conver-` + `sion` → `conversion`); other lines are joined with a space.
/// Each line is cleaned with [`clean_text`] first.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut out = String::new();
    for line in lines {
        let line = clean_text(line.as_ref());
        if line.is_empty() {
            continue;
        }
        if out.is_empty() {
            out.push_str(&line);
            continue;
        }
        if ends_with_break_hyphen(&out) && line.starts_with(|c: char| c.is_lowercase()) {
            out.pop();
            out.push_str(&line);
        } else {
            out.push(' ');
            out.push_str(&line);
        }
    }
    out
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Expand ligatures ────────────────────────────────────────────────

fn expand_ligatures(input: &str) -> String {
    if !input.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            other => out.push(other),
        }
    }
    out
}

// ── Rule 3: Normalise punctuation ───────────────────────────────────────────

fn normalise_punctuation(input: &str) -> String {
    input
        .replace(['\u{2018}', '\u{2019}', '\u{201B}'], "'")
        .replace(['\u{201C}', '\u{201D}', '\u{201F}'], "\"")
        .replace('\u{2212}', "-")
}

// ── Rule 4: Collapse whitespace ─────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input.trim(), " ").to_string()
}

// ── Line joining ────────────────────────────────────────────────────────────

static RE_BREAK_HYPHEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Ll}-$").unwrap());

fn ends_with_break_hyphen(text: &str) -> bool {
    RE_BREAK_HYPHEN.is_match(text)
}

// ── Output finishing ────────────────────────────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Collapse three or more consecutive newlines down to one blank line.
pub fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

/// Ensure the text ends with exactly one newline.
pub fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::from("\n")
    } else {
        format!("{}\n", trimmed)
    }
}
