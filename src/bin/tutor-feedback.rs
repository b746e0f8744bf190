//! CLI binary for tutor-feedback.
//!
//! A thin shim over the library crate that maps CLI flags to `ClientConfig`,
//! drives one `Session` submission and saves the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tutor_feedback::{
    validate, ClientConfig, Session, SessionObserver, SessionSnapshot, SessionState,
    SubmissionInput, SubmitOutcome, DEFAULT_ENDPOINT,
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

// ── Spinner driven by session state ──────────────────────────────────────────

/// Shows a spinner while the session is `Submitting`.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        Arc::new(Self { bar })
    }
}

impl SessionObserver for CliObserver {
    fn on_state_change(&self, _from: &SessionState, to: &SessionState) {
        match to {
            SessionState::Submitting => {
                self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                self.bar.set_prefix("Feedback");
                self.bar.set_message("Generating...");
                self.bar.enable_steady_tick(Duration::from_millis(80));
            }
            SessionState::Ready(_) | SessionState::Failed(_) | SessionState::Idle => {
                self.bar.finish_and_clear();
            }
        }
    }

    fn on_submit_rejected(&self) {
        self.bar.println(dim("  a submission is already in progress"));
    }
}

// ── CLI ──────────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Request feedback for one essay, saved as ./feedback.docx
  tutor-feedback --name "Alice" essay.docx

  # Save next to other results
  tutor-feedback --name "Alice" essay.docx -o results/alice-feedback.docx

  # Use a remote service and give up after 5 minutes
  tutor-feedback --name "Bob" --endpoint https://feedback.example.org/upload/ \
      --timeout 300 unit3.docx

  # Machine-readable outcome
  tutor-feedback --name "Alice" essay.docx --json

ENVIRONMENT VARIABLES:
  TUTOR_FEEDBACK_ENDPOINT   Upload URL (default http://localhost:8000/upload/)
  TUTOR_FEEDBACK_TIMEOUT    Request timeout in seconds
  TUTOR_FEEDBACK_OUTPUT     Where to save the returned document
  RUST_LOG                  Log filter, e.g. tutor_feedback=debug
"#;

/// Send a student's .docx to the feedback service and save the annotated result.
#[derive(Parser, Debug)]
#[command(
    name = "tutor-feedback",
    version,
    about = "Send a student's .docx to the feedback service and save the annotated result",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Student's .docx submission.
    file: PathBuf,

    /// Student name, used by the service to address the feedback.
    #[arg(short, long, default_value = "")]
    name: String,

    /// Upload URL of the feedback service.
    #[arg(long, env = "TUTOR_FEEDBACK_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Whole-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "TUTOR_FEEDBACK_TIMEOUT")]
    timeout: Option<u64>,

    /// TCP connect timeout in seconds.
    #[arg(long, env = "TUTOR_FEEDBACK_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,

    /// File or directory to save the returned document to.
    #[arg(short, long, env = "TUTOR_FEEDBACK_OUTPUT", default_value = "feedback.docx")]
    output: PathBuf,

    /// Print the final session state as JSON on stdout.
    #[arg(long, env = "TUTOR_FEEDBACK_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "TUTOR_FEEDBACK_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TUTOR_FEEDBACK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TUTOR_FEEDBACK_QUIET")]
    quiet: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    session: &'a SessionSnapshot,
    saved_to: Option<PathBuf>,
    server_filename: Option<String>,
    bytes: Option<usize>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out of
    // its way unless asked for.
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

    let config = build_config(&cli)?;

    // ── Collect input ────────────────────────────────────────────────────
    let input = SubmissionInput::load(cli.name.clone(), &cli.file)
        .await
        .context("Cannot submit")?;
    validate(&input).context("Cannot submit")?;

    // ── Submit ───────────────────────────────────────────────────────────
    let mut session = Session::http(&config).context("Failed to set up client")?;
    if show_progress {
        session = session.with_observer(CliObserver::new());
    }

    let outcome = session.submit(&input).await.context("Cannot submit")?;

    match outcome {
        SubmitOutcome::Ready(handle) => {
            let artifact = session.resolve(&handle)?;
            let saved = artifact
                .save_to(&cli.output)
                .await
                .context("Failed to save feedback document")?;

            if cli.json {
                print_json(&JsonReport {
                    session: &session.snapshot(),
                    saved_to: Some(saved.clone()),
                    server_filename: artifact.server_filename().map(str::to_string),
                    bytes: Some(artifact.len()),
                })?;
            } else if !cli.quiet {
                eprintln!(
                    "{} Feedback for {} saved  →  {}  {}",
                    green("✔"),
                    bold(input.student_name.trim()),
                    bold(&saved.display().to_string()),
                    dim(&format!("({} bytes)", artifact.len())),
                );
            }
            session.end();
            Ok(())
        }
        SubmitOutcome::Failed(e) => {
            if cli.json {
                print_json(&JsonReport {
                    session: &session.snapshot(),
                    saved_to: None,
                    server_filename: None,
                    bytes: None,
                })?;
            } else {
                eprintln!("{} {}", red("✘"), bold("Failed to generate feedback"));
            }
            Err(e).context("Failed to generate feedback")
        }
        SubmitOutcome::Rejected => {
            anyhow::bail!("Submission rejected: another request is already in flight")
        }
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder().endpoint(cli.endpoint.clone());
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    if let Some(secs) = cli.connect_timeout {
        builder = builder.connect_timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

fn print_json(report: &JsonReport<'_>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialise output")?;
    println!("{json}");
    Ok(())
}
