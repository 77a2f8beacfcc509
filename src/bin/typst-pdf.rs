//! CLI binary for typst-pdf-client.
//!
//! A thin shim over the library crate that maps CLI flags to a `Client` and a
//! `RequestContext`, then either saves the PDF or streams it to stdout.

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use typst_pdf_client::{
    Client, ClientOption, ErrorKind, MediaFile, RequestContext, ResponseInfo,
};

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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render a template to a file
  typst-pdf report.typ -o report.pdf

  # Stream the PDF to stdout
  typst-pdf report.typ > report.pdf

  # Forward renderer options and bundle media
  typst-pdf paper.typ -o paper.pdf --option=--ppi --option=300 \
      --media fonts/Lato-Regular.ttf=./fonts/Lato-Regular.ttf \
      --media data.json=./data.json

  # Tag the request for log correlation
  typst-pdf invoice.typ -o invoice.pdf --correlation-id invoice-42

ENVIRONMENT VARIABLES:
  PDF_GENERATOR_AUTH_KEY    Gateway credential (sent verbatim as Authorization)
  PDF_GENERATOR_ENDPOINT    Gateway URL, e.g. https://gateway.example.com/function/typst
  TYPST_PDF_TIMEOUT         Overall request timeout in seconds
  TYPST_PDF_INSECURE        Skip TLS certificate verification
  TYPST_PDF_CORRELATION_ID  Correlation id to send
  RUST_LOG                  Overrides the log filter (e.g. typst_pdf_client=debug)
"#;

/// Generate PDFs from Typst templates through a remote rendering gateway.
#[derive(Parser, Debug)]
#[command(
    name = "typst-pdf",
    version,
    about = "Generate PDFs from Typst templates through a remote rendering gateway",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the Typst template.
    template: PathBuf,

    /// Write the PDF to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Inline content forwarded to the renderer.
    #[arg(long, conflicts_with = "content_file")]
    content: Option<String>,

    /// Read inline content from this file.
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Renderer argument, forwarded verbatim. Repeat to pass several, in order.
    #[arg(long = "option", value_name = "ARG", allow_hyphen_values = true)]
    options: Vec<String>,

    /// Media file as NAME=PATH. Repeatable.
    #[arg(long, value_name = "NAME=PATH")]
    media: Vec<String>,

    /// Gateway credential.
    #[arg(long, env = "PDF_GENERATOR_AUTH_KEY", hide_env_values = true)]
    auth_key: String,

    /// Gateway URL.
    #[arg(long, env = "PDF_GENERATOR_ENDPOINT")]
    gateway: String,

    /// Overall request timeout in seconds.
    #[arg(long, env = "TYPST_PDF_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Skip TLS certificate verification (test gateways only).
    #[arg(long, env = "TYPST_PDF_INSECURE")]
    insecure: bool,

    /// Correlation id to send. A UUID is generated when omitted.
    #[arg(long, env = "TYPST_PDF_CORRELATION_ID")]
    correlation_id: Option<String>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TYPST_PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TYPST_PDF_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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

    // ── Build client and request inputs ──────────────────────────────────
    let client = build_client(&cli)?;
    let ctx = RequestContext::new()
        .with_correlation_id(cli.correlation_id.clone().unwrap_or_default());
    let content = read_content(&cli).await?;
    let media = load_media(&cli.media).await?;

    // ── Run conversion ───────────────────────────────────────────────────
    let spinner = (!cli.quiet).then(|| start_spinner(&cli.template));
    let start = Instant::now();

    let result = if let Some(ref output_path) = cli.output {
        client
            .save_pdf(&ctx, &content, &cli.template, output_path, &cli.options, &media)
            .await
    } else {
        let mut stdout = tokio::io::stdout();
        client
            .generate_pdf_from_file(&ctx, &mut stdout, &content, &cli.template, &cli.options, &media)
            .await
    };

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    match result {
        Ok(info) => {
            if !cli.quiet {
                let target = cli
                    .output
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "stdout".to_string());
                eprintln!(
                    "{}  {}  {}ms  →  {}",
                    green("✔"),
                    cli.template.display(),
                    start.elapsed().as_millis(),
                    bold(&target),
                );
                print_diagnostics(&info);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", red("✘"), bold(kind_label(e.kind())));
            print_diagnostics(e.info());
            Err(e).context("PDF generation failed")
        }
    }
}

/// Map CLI args to a `Client`.
fn build_client(cli: &Cli) -> Result<Client> {
    let mut options = vec![ClientOption::Timeout(Duration::from_secs(cli.timeout))];
    if cli.insecure {
        options.push(ClientOption::InsecureSkipVerify);
    }
    Client::new(cli.auth_key.clone(), &cli.gateway, options).context("Invalid client configuration")
}

async fn read_content(cli: &Cli) -> Result<String> {
    if let Some(ref path) = cli.content_file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content from {:?}", path));
    }
    Ok(cli.content.clone().unwrap_or_default())
}

/// Parse `--media NAME=PATH` pairs and load each file.
async fn load_media(specs: &[String]) -> Result<Vec<MediaFile>> {
    let mut media = Vec::with_capacity(specs.len());
    for spec in specs {
        let (name, path) = parse_media_spec(spec)?;
        media.push(MediaFile::from_path(name, path).await?);
    }
    Ok(media)
}

fn parse_media_spec(spec: &str) -> Result<(&str, &str)> {
    let Some((name, path)) = spec.split_once('=') else {
        bail!("Invalid media '{}': expected NAME=PATH", spec);
    };
    let (name, path) = (name.trim(), path.trim());
    if name.is_empty() || path.is_empty() {
        bail!("Invalid media '{}': name and path must be non-empty", spec);
    }
    Ok((name, path))
}

fn start_spinner(template: &std::path::Path) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Rendering");
    bar.set_message(template.display().to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_diagnostics(info: &ResponseInfo) {
    eprintln!("   {} {}", dim("correlation id:"), info.correlation_id);
    if !info.stdout.trim().is_empty() {
        eprintln!("   {}\n{}", dim("renderer stdout:"), info.stdout.trim_end());
    }
    if !info.stderr.trim().is_empty() {
        eprintln!("   {}\n{}", dim("renderer stderr:"), info.stderr.trim_end());
    }
}

/// Short human label for an error kind.
fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidConfiguration => "invalid configuration",
        ErrorKind::Connection => "gateway unreachable",
        ErrorKind::Http => "gateway rejected the request",
        ErrorKind::NotGenerated => "template did not render",
        ErrorKind::Other => "local failure",
    }
}
