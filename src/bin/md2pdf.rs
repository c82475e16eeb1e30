//! CLI binary for edgequake-md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, runs the export and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_md2pdf::{
    default_file_name_today, read_markdown, render_document, save_download, ConversionConfig,
    ConversionProgressCallback, ConversionStats, Converter, ExportState, ProgressCallback, Stage,
    SAMPLE_MARKDOWN,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the pipeline stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(spinner_style);
        bar.set_prefix("md2pdf");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, markdown_len: usize) {
        self.bar.reset_elapsed();
        self.bar.set_message(format!("{markdown_len} bytes of Markdown"));
    }

    fn on_cache_hit(&self, pdf_len: usize) {
        self.bar.set_message(format!("unchanged, reusing {pdf_len} bytes"));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_conversion_complete(&self, pdf_len: usize) {
        self.bar.set_message(format!("{pdf_len} bytes of PDF"));
    }

    fn on_conversion_error(&self, error: &str) {
        self.bar.set_message(red(error));
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a file; writes document-<today>.pdf
  md2pdf notes.md

  # Try it on the built-in sample document
  md2pdf --sample

  # Pick the output name (".pdf" is appended when missing)
  md2pdf notes.md -o "weekly report"

  # Read from stdin, write into a directory
  cat README.md | md2pdf --out-dir build/

  # Also write the live-preview HTML fragment
  md2pdf notes.md --preview preview.html

  # Print the styled HTML document instead of producing a PDF
  md2pdf notes.md --html > notes.html

  # Re-export whenever the file changes
  md2pdf notes.md --watch

  # Machine-readable summary
  md2pdf notes.md --json

MARKDOWN SUPPORT:
  Fenced code blocks, GFM tables, strict (CommonMark) list nesting,
  blockquotes, emphasis, links, headings.

ENVIRONMENT VARIABLES:
  RUST_LOG               Log filter (e.g. edgequake_md2pdf=debug)
  MD2PDF_OUTPUT          Default for --output
  MD2PDF_OUT_DIR         Default for --out-dir
"#;

/// Convert Markdown to a styled PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown to a clean, downloadable PDF",
    long_about = "Convert Markdown (a file or stdin) to a styled PDF document. \
The same Markdown can be rendered as an HTML preview, and watch mode re-exports \
on every change.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert; `-` reads stdin. Omitted: stdin, or the
    /// sample document when stdin is a terminal.
    input: Option<PathBuf>,

    /// Convert the built-in sample document.
    #[arg(long, conflicts_with_all = ["input", "watch"])]
    sample: bool,

    /// PDF file name. Trimmed; ".pdf" appended if missing. Default: document-<YYYYMMDD>.pdf.
    #[arg(short, long, env = "MD2PDF_OUTPUT")]
    output: Option<String>,

    /// Directory to write the PDF into.
    #[arg(long, env = "MD2PDF_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Also write the preview HTML fragment to this file.
    #[arg(long, env = "MD2PDF_PREVIEW")]
    preview: Option<PathBuf>,

    /// Print the full styled HTML document to stdout and exit (no PDF).
    #[arg(long, conflicts_with_all = ["watch", "json"])]
    html: bool,

    /// Re-export whenever the input file changes (Ctrl-C to stop).
    #[arg(short, long)]
    watch: bool,

    /// Polling interval for --watch, in milliseconds.
    #[arg(long, env = "MD2PDF_INTERVAL", default_value_t = 500,
          value_parser = clap::value_parser!(u64).range(50..))]
    interval: u64,

    /// Output a JSON summary (path, file name, MIME type, stats).
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    path: &'a Path,
    file_name: &'a str,
    mime: &'a str,
    stats: &'a ConversionStats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.html;
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

    let stdin_input = cli.input.as_deref().map_or(true, |p| p == Path::new("-"));
    if cli.watch && stdin_input {
        bail!("--watch needs an input file, not stdin");
    }

    let markdown = load_input(&cli)?;

    // ── HTML-only mode ───────────────────────────────────────────────────
    if cli.html {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(render_document(&markdown).as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    // ── Build converter ──────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };

    let mut builder = ConversionConfig::builder();
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    // Watch mode only ever needs the latest few versions of the file.
    if cli.watch {
        builder = builder.cache_capacity(8);
    }
    let config = builder.build().context("Invalid configuration")?;
    let converter = Converter::new(&config);
    debug!("{:?}", converter);

    let exported = export_once(&cli, &converter, &markdown).await?;

    if !cli.watch {
        if !exported {
            // Stop the spinner before exiting; `exit` skips destructors.
            drop(converter);
            drop(config);
            std::process::exit(1);
        }
        return Ok(());
    }

    watch(&cli, &converter, markdown).await
}

/// Read Markdown from the input file or stdin.
fn load_input(cli: &Cli) -> Result<String> {
    if cli.sample {
        return Ok(SAMPLE_MARKDOWN.to_string());
    }
    match cli.input.as_deref() {
        Some(path) if path != Path::new("-") => {
            read_markdown(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None if io::stdin().is_terminal() => {
            info!("No input given and stdin is a terminal; converting the sample document");
            Ok(SAMPLE_MARKDOWN.to_string())
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read Markdown from stdin")?;
            Ok(buf)
        }
    }
}

/// Convert, then write the PDF (and preview) if the conversion succeeded.
///
/// Returns `Ok(false)` when the renderer failed: the error has been reported
/// and no file was written.
async fn export_once(cli: &Cli, converter: &Converter, markdown: &str) -> Result<bool> {
    if let Some(ref preview_path) = cli.preview {
        tokio::fs::write(preview_path, converter.preview_html(markdown))
            .await
            .with_context(|| format!("Failed to write preview to {}", preview_path.display()))?;
        debug!("Preview written to {}", preview_path.display());
    }

    let output = {
        let converter = converter.clone();
        let text = markdown.to_string();
        tokio::task::spawn_blocking(move || converter.convert_detailed(&text))
            .await
            .context("Conversion task panicked")?
    };

    let default_name = default_file_name_today();
    let requested = cli.output.as_deref().unwrap_or("");
    let (pdf, stats) = match output {
        Ok(out) => (Ok(out.pdf), Some(out.stats)),
        Err(e) => (Err(e), None),
    };

    let state = ExportState::from_result(pdf, requested, &default_name);
    let (download, stats) = match (state.download(), stats) {
        (Some(dl), Some(stats)) => (dl, stats),
        _ => {
            eprintln!(
                "{} {}",
                red("✘"),
                state.error_message().unwrap_or("Could not generate PDF")
            );
            return Ok(false);
        }
    };

    let dir = cli.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let path = save_download(download, &dir)
        .await
        .context("Failed to save PDF")?;
    info!("Wrote {} ({} bytes)", path.display(), download.data.len());

    if cli.json {
        let summary = JsonSummary {
            path: &path,
            file_name: &download.file_name,
            mime: download.mime,
            stats: &stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} bytes  {}ms{}  →  {}",
            green("✔"),
            stats.pdf_bytes,
            stats.total_duration_ms,
            if stats.cache_hit { dim(" (cached)") } else { String::new() },
            bold(&path.display().to_string()),
        );
    }

    Ok(true)
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Poll the input file and re-export on change until Ctrl-C.
async fn watch(cli: &Cli, converter: &Converter, mut last_text: String) -> Result<()> {
    let Some(path) = cli.input.clone() else {
        bail!("--watch needs an input file");
    };
    if !cli.quiet {
        eprintln!("{} watching {}", dim("◆"), bold(&path.display().to_string()));
    }

    let mut last_modified = modified_at(&path);
    let mut ticker = tokio::time::interval(Duration::from_millis(cli.interval));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if !cli.quiet {
                    eprintln!("{} stopped watching", dim("◆"));
                }
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        let modified = modified_at(&path);
        if modified == last_modified {
            continue;
        }
        last_modified = modified;

        let text = match read_markdown(&path) {
            Ok(text) => text,
            Err(e) => {
                // Editors often replace files in two steps; the next tick usually succeeds.
                warn!("Skipping change: {}", e);
                continue;
            }
        };
        if text == last_text {
            debug!("Touched but unchanged: {}", path.display());
            continue;
        }
        last_text = text;
        export_once(cli, converter, &last_text).await?;
    }
}
