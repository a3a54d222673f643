//! CLI binary for gdocs2blog.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, picks ad hoc or tracked mode, and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use gdocs2blog::{
    parse_id_list, BatchOrchestrator, BatchReport, CloudinaryConfig, ConversionConfig,
    ConversionProgressCallback, Converter, ProgressCallback, StateFiles,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
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

/// Terminal progress callback: one bar for the batch plus a log line per
/// document.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the document currently being converted.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} docs  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total} document(s)…"))
        ));
    }

    fn on_document_start(&self, _index: usize, _total: usize, doc_id: &str) {
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(doc_id.to_string());
    }

    fn on_document_complete(&self, index: usize, total: usize, _doc_id: &str, output_path: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            output_path,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, index: usize, total: usize, doc_id: &str, error: &str) {
        let secs = self.elapsed_secs();

        // Keep one line per document; the full error is in the log.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}  {}",
            red("✗"),
            index,
            total,
            doc_id,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} document(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} document(s) converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert every ID in pending_doc_ids.json, moving successes to
  # converted_doc_ids.json
  gdocs2blog

  # Convert specific documents (state files untouched)
  gdocs2blog 1AbCdEfGh
  gdocs2blog 1AbCdEfGh,2XyZ

  # Write posts elsewhere, keep the raw exports for inspection
  gdocs2blog -o site/content/posts --dump-html raw/

  # Skip the LLM tidy-up pass
  gdocs2blog --no-refine 1AbCdEfGh

  # Machine-readable report
  gdocs2blog --json > report.json

DOCUMENT SHARING:
  Documents must be shared as "anyone with the link can view"; private
  documents export a short stub page and fail with "export is only N bytes".

ENVIRONMENT VARIABLES:
  CLOUDINARY_CLOUD_NAME   Cloudinary cloud name
  CLOUDINARY_API_KEY      API key (signed uploads)
  CLOUDINARY_API_SECRET   API secret (signed uploads)
  CLOUDINARY_UPLOAD_PRESET  Upload preset (unsigned uploads)
  OPENAI_API_KEY          OpenAI API key for the refinement pass
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter (e.g. gdocs2blog=debug)

STATE FILES:
  Both lists are JSON arrays of document IDs. A document that fails stays
  in the pending list and is retried on the next run.
"#;

/// Convert shared Google Docs into frontmatter Markdown blog posts.
#[derive(Parser, Debug)]
#[command(
    name = "gdocs2blog",
    version,
    about = "Convert shared Google Docs into frontmatter Markdown blog posts",
    long_about = "Convert shared Google Docs into frontmatter Markdown blog posts. \
The first heading becomes the title, the second the category, images are re-hosted \
on Cloudinary, and an optional LLM pass tidies the formatting.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document ID, or a comma-separated list. Omit to convert the pending list.
    ids: Option<String>,

    /// Directory the posts are written to.
    #[arg(short, long, env = "GDOCS2BLOG_OUTPUT_DIR", default_value = "blogposts")]
    output_dir: PathBuf,

    /// Pending-list state file (tracked mode).
    #[arg(long, env = "GDOCS2BLOG_PENDING", default_value = gdocs2blog::batch::DEFAULT_PENDING_FILE)]
    pending: PathBuf,

    /// Completed-list state file (tracked mode).
    #[arg(long, env = "GDOCS2BLOG_COMPLETED", default_value = gdocs2blog::batch::DEFAULT_COMPLETED_FILE)]
    completed: PathBuf,

    /// Cover image used when no image could be uploaded.
    #[arg(long, env = "GDOCS2BLOG_DEFAULT_IMAGE", default_value = gdocs2blog::config::DEFAULT_COVER_IMAGE)]
    default_image: String,

    /// Export URL template; `{id}` is replaced by the document ID.
    #[arg(long, env = "GDOCS2BLOG_EXPORT_URL", default_value = gdocs2blog::config::DEFAULT_EXPORT_URL)]
    export_url: String,

    /// Save each raw HTML export to DIR/<id>.html.
    #[arg(long, value_name = "DIR", env = "GDOCS2BLOG_DUMP_HTML")]
    dump_html: Option<PathBuf>,

    /// Skip the LLM refinement pass.
    #[arg(long, env = "GDOCS2BLOG_NO_REFINE")]
    no_refine: bool,

    /// LLM model ID for refinement (default: gpt-4.1-nano).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom refinement system prompt.
    #[arg(long, env = "GDOCS2BLOG_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "GDOCS2BLOG_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Cloudinary cloud name.
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "CLOUDINARY_API_KEY")]
    api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    /// Cloudinary upload preset (unsigned uploads).
    #[arg(long, env = "CLOUDINARY_UPLOAD_PRESET")]
    upload_preset: Option<String>,

    /// Cloudinary folder for uploaded images.
    #[arg(long, env = "CLOUDINARY_FOLDER")]
    folder: Option<String>,

    /// Export fetch timeout in seconds.
    #[arg(long, env = "GDOCS2BLOG_FETCH_TIMEOUT", default_value_t = 60)]
    fetch_timeout: u64,

    /// Per-image upload timeout in seconds.
    #[arg(long, env = "GDOCS2BLOG_UPLOAD_TIMEOUT", default_value_t = 60)]
    upload_timeout: u64,

    /// Refinement call timeout in seconds.
    #[arg(long, env = "GDOCS2BLOG_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "GDOCS2BLOG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "GDOCS2BLOG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GDOCS2BLOG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GDOCS2BLOG_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build converter ──────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let converter =
        Converter::from_config(config).context("Failed to set up the conversion pipeline")?;
    if !cli.quiet && !cli.no_refine && !converter.refines() {
        eprintln!(
            "{} no LLM provider configured; posts are published unrefined",
            cyan("⚠")
        );
    }

    let mut orchestrator = BatchOrchestrator::new(Arc::new(converter));
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>;
        orchestrator = orchestrator.with_progress(cb);
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let report = match cli.ids.as_deref() {
        Some(arg) => {
            let ids = parse_id_list(arg);
            if ids.is_empty() {
                anyhow::bail!("No document IDs in '{}'", arg);
            }
            orchestrator.run_ids(&ids).await
        }
        None => {
            let files = StateFiles {
                pending: cli.pending.clone(),
                completed: cli.completed.clone(),
            };
            orchestrator
                .run_tracked(&files)
                .await
                .context("Tracked batch failed")?
        }
    };

    print_report(&cli, &report, show_progress)
}

/// Map CLI args to `ConversionConfig`.
async fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let cloudinary = CloudinaryConfig {
        cloud_name: cli.cloud_name.clone(),
        api_key: cli.api_key.clone(),
        api_secret: cli.api_secret.clone(),
        upload_preset: cli.upload_preset.clone(),
        folder: cli.folder.clone(),
    };

    let mut builder = ConversionConfig::builder()
        .output_dir(&cli.output_dir)
        .default_cover_image(&cli.default_image)
        .export_url_template(&cli.export_url)
        .refine(!cli.no_refine)
        .temperature(cli.temperature)
        .cloudinary(cloudinary)
        .fetch_timeout_secs(cli.fetch_timeout)
        .upload_timeout_secs(cli.upload_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref dir) = cli.dump_html {
        builder = builder.raw_html_dir(dir);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

fn print_report(cli: &Cli, report: &BatchReport, show_progress: bool) -> Result<()> {
    if cli.json {
        let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }

    // The progress callback already printed the per-document lines.
    if cli.quiet || show_progress {
        return Ok(());
    }

    for outcome in &report.outcomes {
        match (&outcome.output_path, &outcome.error) {
            (Some(path), _) => eprintln!(
                "  {} {}  →  {}",
                green("✓"),
                outcome.doc_id,
                bold(&path.display().to_string())
            ),
            (None, error) => eprintln!(
                "  {} {}  {}",
                red("✗"),
                outcome.doc_id,
                dim(error.as_deref().unwrap_or("unknown error"))
            ),
        }
    }
    eprintln!(
        "Converted {}/{} document(s)",
        report.succeeded(),
        report.len()
    );
    Ok(())
}
