//! CLI binary for ocr2html.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use ocr2html::{
    convert, convert_to_file, image_to_pdf, inspect, ConversionConfig, ConversionProgressCallback,
    HtmlOptions, OutputFormat, PageSelection, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-page wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_conversion_start` tells us the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Rendering pages…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    /// Remove the bar from the terminal without a final summary.
    fn clear(&self) {
        self.bar.finish_and_clear();
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, word_count: usize) {
        let secs = self.elapsed_secs(page_num);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{word_count:>5} words")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs(page_num);
        // First line only; the full chain is printed on exit.
        let msg = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, _total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted",
            green("✔"),
            bold(&success_count.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan to HTML on stdout
  ocr2html scan.png

  # Keep the intermediate PDF, write HTML to a file
  ocr2html scan.png --pdf-out output.pdf -o scan.html

  # Only build the PDF from an image
  ocr2html scan.jpg --image-to-pdf-only --pdf-out scan.pdf

  # German + English, specific pages of a scanned PDF
  ocr2html --lang eng+deu --pages 2-5 archive.pdf -o archive.html

  # Use the PDF's own text layer where it has one
  ocr2html --no-force-ocr report.pdf --format markdown

  # Inspect PDF metadata (no OCR)
  ocr2html --inspect-only document.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium
  RUST_LOG          Log filter, e.g. ocr2html=debug
  OCR2HTML_*        Any flag, e.g. OCR2HTML_LANG=eng+fra

REQUIREMENTS:
  tesseract must be installed (or pass --tesseract-cmd), together with the
  language data for every --lang code. pdfium must be available as a shared
  library on the system path, in the working directory, or at PDFIUM_LIB_PATH.
"#;

/// Convert scanned images and PDFs to HTML using Tesseract OCR.
#[derive(Parser, Debug)]
#[command(
    name = "ocr2html",
    version,
    about = "Convert scanned images and PDFs to HTML using Tesseract OCR",
    long_about = "Convert images (PNG, JPEG, TIFF, BMP, GIF, WebP) and PDF documents to \
structured HTML. Images are first wrapped in a single-page PDF; every page is then rasterised, \
read with Tesseract, and analysed for headings, lists and tables.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local image/PDF path or HTTP/HTTPS URL.
    input: String,

    /// Write the result to this file instead of stdout.
    #[arg(short, long, env = "OCR2HTML_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format. Default: from the -o extension, else html.
    #[arg(long, env = "OCR2HTML_FORMAT", value_enum)]
    format: Option<FormatArg>,

    /// Write the PDF built from an image input to this file (overwritten).
    #[arg(long, env = "OCR2HTML_PDF_OUT")]
    pdf_out: Option<PathBuf>,

    /// Only convert the image to PDF; no OCR.
    #[arg(long)]
    image_to_pdf_only: bool,

    /// Rendering DPI for OCR (72–600).
    #[arg(long, env = "OCR2HTML_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Resolution assumed for image inputs when sizing their PDF page.
    #[arg(long, env = "OCR2HTML_IMAGE_DPI", default_value_t = 96.0)]
    image_dpi: f32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "OCR2HTML_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "OCR2HTML_PASSWORD")]
    password: Option<String>,

    /// Tesseract languages, joined with '+'.
    #[arg(long, env = "OCR2HTML_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract binary.
    #[arg(long, env = "OCR2HTML_TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "OCR2HTML_PSM",
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// Kill tesseract after this many seconds per page.
    #[arg(long, env = "OCR2HTML_OCR_TIMEOUT")]
    ocr_timeout: Option<u64>,

    /// Drop words below this OCR confidence (0–100).
    #[arg(long, env = "OCR2HTML_MIN_CONFIDENCE", default_value_t = 0.0)]
    min_confidence: f32,

    /// Skip OCR and use only the PDF text layer.
    #[arg(long, env = "OCR2HTML_NO_OCR")]
    no_ocr: bool,

    /// OCR only pages without a text layer.
    #[arg(long, env = "OCR2HTML_NO_FORCE_OCR")]
    no_force_ocr: bool,

    /// Disable table-structure detection.
    #[arg(long, env = "OCR2HTML_NO_TABLES")]
    no_tables: bool,

    /// Keep detected cells whole instead of matching words to columns.
    #[arg(long, env = "OCR2HTML_NO_CELL_MATCHING")]
    no_cell_matching: bool,

    /// Embed each rendered page as an image in the HTML.
    #[arg(long, env = "OCR2HTML_EMBED_IMAGES")]
    embed_images: bool,

    /// Do not wrap pages in <div class='page'>.
    #[arg(long, env = "OCR2HTML_NO_PAGE_DIVS")]
    no_page_divs: bool,

    /// Include page headers and footers.
    #[arg(long, env = "OCR2HTML_FURNITURE")]
    furniture: bool,

    /// Print document metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "OCR2HTML_NO_PROGRESS")]
    no_progress: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "OCR2HTML_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR2HTML_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "OCR2HTML_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Html,
    Markdown,
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; -v brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only && !cli.image_to_pdf_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Image-to-PDF-only mode ───────────────────────────────────────────
    if cli.image_to_pdf_only {
        let Some(target) = cli.pdf_out.as_ref().or(cli.output.as_ref()) else {
            bail!("--image-to-pdf-only needs --pdf-out FILE or -o FILE");
        };
        let written = image_to_pdf(&cli.input, target, cli.image_dpi)
            .await
            .context("Image to PDF conversion failed")?;
        if !cli.quiet {
            eprintln!("{}  {}", green("✔"), bold(&written.display().to_string()));
        }
        return Ok(());
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect input")?;

        if matches!(cli.format, Some(FormatArg::Json)) {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            if !meta.pdf_version.is_empty() {
                println!("PDF Version:  {}", meta.pdf_version);
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    let spinner = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb: Option<ProgressCallback> = spinner
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    let result = run_conversion(&cli, progress_cb, show_progress).await;
    if result.is_err() {
        if let Some(ref cb) = spinner {
            cb.clear();
        }
    }
    result
}

/// Convert `cli.input` and write the result to the chosen destination.
async fn run_conversion(
    cli: &Cli,
    progress_cb: Option<ProgressCallback>,
    show_progress: bool,
) -> Result<()> {
    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(cli, progress_cb)?;
    let format = resolve_format(cli);

    // ── Run conversion ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let stats = convert_to_file(&cli.input, output_path, format, &config)
            .await
            .context("Conversion failed")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} pages  {} tables  {}ms  →  {}",
                green("✔"),
                stats.processed_pages,
                stats.tables_found,
                stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let output = convert(&cli.input, &config)
            .await
            .context("Conversion failed")?;

        let rendered = match format {
            OutputFormat::Html => output.html.clone(),
            other => output
                .document
                .export(other, &config.html)
                .context("Failed to render output")?,
        };

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        if !rendered.ends_with('\n') {
            handle.write_all(b"\n").context("Failed to write to stdout")?;
        }

        if !cli.quiet && !show_progress {
            eprintln!(
                "Converted {} pages ({} OCR, {} text layer) in {}ms",
                output.stats.processed_pages,
                output.stats.ocr_pages,
                output.stats.text_layer_pages,
                output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// `--format`, else the `-o` extension, else HTML.
fn resolve_format(cli: &Cli) -> OutputFormat {
    if let Some(f) = cli.format {
        return f.into();
    }
    cli.output
        .as_ref()
        .and_then(|p| p.extension())
        .and_then(|e| OutputFormat::from_extension(&e.to_string_lossy()))
        .unwrap_or_default()
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let pages = parse_pages(&cli.pages)?;
    let langs: Vec<&str> = cli
        .lang
        .split('+')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .image_dpi(cli.image_dpi)
        .pages(pages)
        .do_ocr(!cli.no_ocr)
        .force_full_page_ocr(!cli.no_force_ocr)
        .lang(langs)
        .tesseract_cmd(cli.tesseract_cmd.clone())
        .min_confidence(cli.min_confidence)
        .do_table_structure(!cli.no_tables)
        .cell_matching(!cli.no_cell_matching)
        .html(HtmlOptions {
            page_divs: !cli.no_page_divs,
            include_furniture: cli.furniture,
            embed_page_images: cli.embed_images,
        })
        .download_timeout_secs(cli.download_timeout);

    if let Some(psm) = cli.psm {
        builder = builder.psm(psm);
    }
    if let Some(secs) = cli.ocr_timeout {
        builder = builder.ocr_timeout_secs(secs);
    }
    if let Some(ref path) = cli.pdf_out {
        builder = builder.intermediate_pdf(path.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_spinner_stops_ticking() {
        let cb = CliProgressCallback::new_dynamic();
        assert!(!cb.bar.is_finished());
        cb.clear();
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn pages_all_single_range_set() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(
            parse_pages("1,3,5").unwrap(),
            PageSelection::Set(vec![1, 3, 5])
        );
    }

    #[test]
    fn pages_rejects_zero_and_reversed() {
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("9-2").is_err());
        assert!(parse_pages("1,0").is_err());
        assert!(parse_pages("abc").is_err());
    }

    #[test]
    fn format_follows_output_extension() {
        let cli = Cli::parse_from(["ocr2html", "scan.png", "-o", "out.md"]);
        assert_eq!(resolve_format(&cli), OutputFormat::Markdown);
        let cli = Cli::parse_from(["ocr2html", "scan.png", "-o", "out.md", "--format", "json"]);
        assert_eq!(resolve_format(&cli), OutputFormat::Json);
        let cli = Cli::parse_from(["ocr2html", "scan.png"]);
        assert_eq!(resolve_format(&cli), OutputFormat::Html);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "ocr2html",
            "scan.png",
            "--lang",
            "eng+deu",
            "--no-cell-matching",
            "--psm",
            "6",
            "--pdf-out",
            "output.pdf",
        ]);
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.pipeline.ocr.lang, vec!["eng", "deu"]);
        assert!(!config.pipeline.table_structure.do_cell_matching);
        assert_eq!(config.pipeline.ocr.psm, Some(6));
        assert_eq!(config.intermediate_pdf, Some(PathBuf::from("output.pdf")));
    }
}
