//! CLI binary for act-review.
//!
//! Three subcommands over the library crate: run the HTTP server, analyse a
//! PDF in-process, or upload a PDF to a running server.

use act_review::{
    render_report, serve, upload_pdf, AnalysisConfig, Analyzer, CombinedReport, ServerConfig,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the server and open http://127.0.0.1:8000/ in a browser
  act-review serve

  # Analyse a local act without a server
  act-review analyze universal-credit-act.pdf

  # Send a PDF to a running server, print the raw JSON
  act-review upload --server http://localhost:8000 act.pdf --json

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Provider auto-detection override
  EDGEQUAKE_MODEL         Model auto-detection override
  PDFIUM_LIB_PATH         Directory containing libpdfium

  A .env file in the working directory is loaded if present.
"#;

/// Summarise legislation PDFs and check them against drafting rules.
#[derive(Parser, Debug)]
#[command(
    name = "act-review",
    version,
    about = "Summarise legislation PDFs and check them against drafting rules",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ACT_REVIEW_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ACT_REVIEW_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (upload endpoint and browser UI).
    Serve {
        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Address to bind.
        #[arg(long, env = "ACT_REVIEW_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind.
        #[arg(long, env = "ACT_REVIEW_PORT", default_value_t = 8000)]
        port: u16,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "ACT_REVIEW_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },

    /// Analyse a local PDF in-process.
    Analyze {
        /// PDF file to analyse.
        pdf: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,

        /// Print the report as JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },

    /// Upload a PDF to a running server.
    Upload {
        /// PDF file to upload.
        pdf: PathBuf,

        /// Base URL of the server.
        #[arg(long, env = "ACT_REVIEW_SERVER_URL", default_value = act_review::client::DEFAULT_SERVER_URL)]
        server: String,

        /// Print the report as JSON instead of Markdown.
        #[arg(long)]
        json: bool,
    },
}

/// Options shared by every subcommand that talks to the model itself.
#[derive(Args, Debug)]
struct AnalysisArgs {
    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, env = "ACT_REVIEW_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "ACT_REVIEW_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ACT_REVIEW_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "ACT_REVIEW_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "ACT_REVIEW_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Directory for temporary upload files.
    #[arg(long, env = "ACT_REVIEW_TEMP_DIR", default_value = "./data")]
    temp_dir: PathBuf,

    /// Directory containing libpdfium.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Run the three model calls one after another.
    #[arg(long, env = "ACT_REVIEW_SEQUENTIAL")]
    sequential: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner is the feedback for one-shot commands; the server logs.
    let default_filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if matches!(cli.command, Command::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            analysis,
            host,
            port,
            max_upload_mb,
        } => {
            let analyzer = build_analyzer(&analysis)?;
            let config = ServerConfig {
                host,
                port,
                max_upload_bytes: upload_limit_bytes(max_upload_mb),
            };
            serve(analyzer, &config).await.context("Server failed")?;
        }
        Command::Analyze {
            pdf,
            analysis,
            json,
        } => {
            let analyzer = build_analyzer(&analysis)?;
            let spinner = spinner(cli.quiet, &pdf, "Analysing");
            let start = Instant::now();
            let result = analyzer.analyze_file(&pdf).await;
            spinner.finish_and_clear();
            let report = result.with_context(|| format!("Analysis of {} failed", pdf.display()))?;
            print_report(&report, json)?;
            if !cli.quiet {
                print_verdict(&report, start.elapsed());
            }
        }
        Command::Upload { pdf, server, json } => {
            let spinner = spinner(cli.quiet, &pdf, "Uploading and processing");
            let start = Instant::now();
            let result = upload_pdf(&server, &pdf).await;
            spinner.finish_and_clear();
            let report = result.with_context(|| format!("Upload to {} failed", server))?;
            print_report(&report, json)?;
            if !cli.quiet {
                print_verdict(&report, start.elapsed());
            }
        }
    }

    Ok(())
}

/// `--max-upload-mb` in bytes, saturating instead of overflowing.
fn upload_limit_bytes(mb: usize) -> usize {
    mb.saturating_mul(1024 * 1024)
}

/// Map CLI args to an `Analyzer`.
fn build_analyzer(args: &AnalysisArgs) -> Result<Analyzer> {
    let mut builder = AnalysisConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .temp_dir(&args.temp_dir)
        .sequential(args.sequential);
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = args.api_timeout {
        builder = builder.api_timeout_secs(secs);
    }
    if let Some(ref dir) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(dir);
    }

    let config = builder.build().context("Invalid configuration")?;
    Analyzer::from_config(config).context("Failed to initialise LLM provider")
}

fn spinner(quiet: bool, pdf: &Path, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(
        pdf.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_report(report: &CombinedReport, json: bool) -> Result<()> {
    let stdout = io::stdout();
    write_report(&mut stdout.lock(), report, json)
}

/// Write the report, always ending with a newline.
fn write_report<W: Write>(out: &mut W, report: &CombinedReport, json: bool) -> Result<()> {
    let text = if json {
        serde_json::to_string_pretty(report).context("Failed to serialise report")?
    } else {
        render_report(report)
    };
    out.write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    Ok(())
}

/// One-line rule tally on stderr.
fn print_verdict(report: &CombinedReport, elapsed: Duration) {
    match report.rule_check_records() {
        Some(records) => {
            let passed = records.iter().filter(|r| r.passed()).count();
            let mark = if passed == records.len() {
                green("✔")
            } else {
                red("✘")
            };
            eprintln!(
                "{}  {}/{} rules passed  {}",
                mark,
                passed,
                records.len(),
                dim(&format!("{}ms", elapsed.as_millis()))
            );
        }
        None => eprintln!(
            "{}  rule checks could not be parsed  {}",
            red("✘"),
            dim(&format!("{}ms", elapsed.as_millis()))
        ),
    }
}
