//! CLI binary for slidegen.
//!
//! A thin shim over the library crate that maps CLI flags to `RunConfig`
//! and prints the run summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use slidegen::{
    list_slides, run, RunConfig, RunMode, RunProgressCallback, RunSummary, SlideSelection,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the run plus a log line per slide.
struct CliProgressCallback {
    bar: ProgressBar,
    verb: &'static str,
}

impl CliProgressCallback {
    fn new(mode: RunMode) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} slides  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);

        let (prefix, verb) = match mode {
            RunMode::Draft => ("Drafting", "drafted"),
            RunMode::Upscale => ("Upscaling", "upscaled"),
        };
        bar.set_prefix(prefix);
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar, verb })
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_slides: usize) {
        self.bar.set_length(total_slides as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Processing {total_slides} slides…"))
        ));
    }

    fn on_slide_start(&self, slide: usize, _total: usize) {
        self.bar.set_message(format!("slide {slide}"));
    }

    fn on_slide_complete(&self, slide: usize, total: usize, bytes: usize) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            green("✓"),
            slide,
            total,
            dim(&format!("{:>8} KiB", bytes / 1024)),
        ));
        self.bar.inc(1);
    }

    fn on_slide_error(&self, slide: usize, total: usize, error: &str) {
        self.bar.println(format!(
            "  {} Slide {:>3}/{:<3}  {}",
            red("✗"),
            slide,
            total,
            red(error),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_slides: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_slides.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} slides {}",
                green("✔"),
                bold(&success_count.to_string()),
                self.verb
            );
        } else {
            eprintln!(
                "{} {}/{} slides {}  ({} failed)",
                if success_count == 0 { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_slides,
                self.verb,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Draft every slide of outline_visual.md into generated_slides/
  slidegen

  # Re-draft only slides 8 and 11
  slidegen --slides 8 11

  # Upscale the approved drafts of slides 2 and 5 to 4K
  slidegen --enlarge --slides 2 5

  # Show what the outline parses to, without calling the API
  slidegen --list

OUTLINE FORMAT:
  #### Slide 2: Call to action
  QR code overlay on a dark gradient
  * **Asset**: imgs/qrcode.png

  Lines that are just a relative image path (or an **Asset** label) are
  attached as reference images and removed from the prompt.

OUTPUT:
  generated_slides/slide_02.png      draft
  generated_slides/slide_02_4k.png   upscaled

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Gemini API key (fallback: GOOGLE_API_KEY); .env is loaded
  GEMINI_BASE_URL    Override the API endpoint
  RUST_LOG           Override log filtering (e.g. slidegen=debug)
"#;

/// Render slide images from a markdown outline with Gemini image models.
#[derive(Parser, Debug)]
#[command(
    name = "slidegen",
    version,
    about = "Render slide images from a markdown outline with Gemini image models",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Upscale existing drafts instead of generating new ones.
    #[arg(long)]
    enlarge: bool,

    /// Only process these 1-based slide numbers (any order).
    #[arg(long, num_args = 1.., value_name = "IDX",
          value_parser = clap::value_parser!(u32).range(1..))]
    slides: Vec<u32>,

    /// Markdown outline.
    #[arg(long, env = "SLIDEGEN_OUTLINE", default_value = "outline_visual.md")]
    outline: PathBuf,

    /// Visual guideline prepended to every draft prompt.
    /// Default: visual_guideline.md next to the outline, when present.
    #[arg(long, env = "SLIDEGEN_GUIDELINE")]
    guideline: Option<PathBuf>,

    /// Directory for generated images.
    #[arg(long, env = "SLIDEGEN_OUTPUT_DIR", default_value = "generated_slides")]
    output_dir: PathBuf,

    /// Base directory for relative asset paths. Default: the outline's directory.
    #[arg(long, env = "SLIDEGEN_ASSET_ROOT")]
    asset_root: Option<PathBuf>,

    /// Gemini image model.
    #[arg(long, env = "SLIDEGEN_MODEL", default_value = slidegen::config::DEFAULT_MODEL)]
    model: String,

    /// Aspect ratio of generated slides.
    #[arg(long, env = "SLIDEGEN_ASPECT_RATIO", default_value = "16:9")]
    aspect_ratio: String,

    /// Image size for drafts.
    #[arg(long, env = "SLIDEGEN_DRAFT_SIZE", default_value = "1K")]
    draft_size: String,

    /// Image size for upscaled slides.
    #[arg(long, env = "SLIDEGEN_UPSCALE_SIZE", default_value = "4K")]
    upscale_size: String,

    /// Per-request API timeout in seconds.
    #[arg(long, env = "SLIDEGEN_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// Print the parsed slides and exit. No API key needed.
    #[arg(long)]
    list: bool,

    /// Print the run summary (or slide list) as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "SLIDEGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SLIDEGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and skipped slides.
    #[arg(short, long, env = "SLIDEGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("error:"), e);
            ExitCode::FAILURE
        }
    }
}

async fn real_main() -> Result<ExitCode> {
    // Credentials live in .env by convention; a missing file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar already reports each slide; keep INFO logs out of
    // its way unless the user asked for them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list;
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

    let mut config = build_config(&cli)?;

    // ── List mode ────────────────────────────────────────────────────────
    if cli.list {
        let slides = list_slides(&config).await.context("Failed to read outline")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&slides).context("Failed to serialise slides")?
            );
        } else {
            for slide in &slides {
                println!("{} {}", bold(&format!("Slide {:>2}", slide.index)), slide.title);
                let preview: String = slide.prompt.chars().take(100).collect();
                if !preview.is_empty() {
                    println!("   {}", dim(&preview.replace('\n', " ")));
                }
                for asset in &slide.asset_paths {
                    println!("   {} {}", cyan("asset"), asset);
                }
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    // ── Run ──────────────────────────────────────────────────────────────
    if show_progress {
        let cb = CliProgressCallback::new(config.mode);
        config.progress_callback = Some(cb as Arc<dyn RunProgressCallback>);
    }

    let summary = run(&config).await.context("Run failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if cli.quiet {
        write_problems(&mut io::stderr().lock(), &summary)
            .context("Failed to write run report")?;
    } else {
        print_summary(&summary, show_progress);
    }

    Ok(if summary.failed > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli) -> Result<RunConfig> {
    let mode = if cli.enlarge {
        RunMode::Upscale
    } else {
        RunMode::Draft
    };
    let selection = if cli.slides.is_empty() {
        SlideSelection::All
    } else {
        SlideSelection::from_indices(cli.slides.iter().map(|&i| i as usize))
    };

    let mut builder = RunConfig::builder()
        .mode(mode)
        .slides(selection)
        .outline(&cli.outline)
        .output_dir(&cli.output_dir)
        .model(&cli.model)
        .aspect_ratio(&cli.aspect_ratio)
        .draft_size(&cli.draft_size)
        .upscale_size(&cli.upscale_size)
        .api_timeout_secs(cli.api_timeout);

    if let Some(guideline) = cli
        .guideline
        .clone()
        .or_else(|| default_guideline(&cli.outline))
    {
        builder = builder.guideline(guideline);
    }
    if let Some(ref root) = cli.asset_root {
        builder = builder.asset_root(root);
    }

    builder.build().context("Invalid configuration")
}

/// `visual_guideline.md` beside the outline, if it exists.
fn default_guideline(outline: &Path) -> Option<PathBuf> {
    let dir = outline.parent().unwrap_or_else(|| Path::new(""));
    let candidate = dir.join("visual_guideline.md");
    candidate.is_file().then_some(candidate)
}

/// Quiet mode report: skipped slides and unknown indices only.
fn write_problems(out: &mut impl Write, summary: &RunSummary) -> io::Result<()> {
    for err in summary.failures() {
        writeln!(out, "  {} {}", red("✗"), err)?;
    }
    for index in &summary.unknown_indices {
        writeln!(out, "  {} Slide {} is not in the outline", cyan("⚠"), index)?;
    }
    Ok(())
}

/// One line per slide, then skipped slides and unknown indices.
fn print_summary(summary: &RunSummary, progress_shown: bool) {
    // The progress callback already printed per-slide lines.
    if !progress_shown {
        for result in &summary.slides {
            match (&result.output_path, &result.error) {
                (Some(path), None) => eprintln!(
                    "  {} Slide {:>3}  →  {}",
                    green("✓"),
                    result.slide,
                    path.display()
                ),
                (_, Some(err)) => eprintln!("  {} {}", red("✗"), err),
                (None, None) => {}
            }
        }
    }

    for index in &summary.unknown_indices {
        eprintln!("  {} Slide {} is not in the outline", cyan("⚠"), index);
    }

    eprintln!(
        "{}  {}/{} slides  {}ms",
        if summary.failed == 0 {
            green("✔")
        } else {
            cyan("⚠")
        },
        summary.succeeded,
        summary.slides.len(),
        summary.total_duration_ms,
    );
    if summary.failed > 0 {
        eprintln!(
            "   {} re-run with --slides {}",
            dim("skipped slides can be retried:"),
            summary
                .failures()
                .map(|e| e.slide().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );
    }
}
