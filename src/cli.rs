use crate::backend::{Backend, HttpBackend};
use crate::config::{Config, ConfigOverrides};
use crate::input::{self, Prompt};
use crate::models;
use crate::orchestrator::{EXIT_NO_INPUT, Orchestrator, Outcome};
use crate::{log_debug, log_warn, logger, ui};

use anyhow::Context;
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, crate_version};
use colored::Colorize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// CLI structure defining the prompt and global flags
#[derive(Parser, Debug)]
#[command(
    author,
    version = crate_version!(),
    about = "chorus: ask several models at once and let one of them judge",
    long_about = "Sends one prompt to several OpenAI models concurrently, prints every answer in a stable order, then asks a judge model which answer is best.",
    disable_version_flag = true,
    after_help = get_dynamic_help(),
    styles = get_styles(),
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// The question or prompt to send. Read from STDIN when omitted.
    pub prompt: Option<String>,

    /// Pin a single model; skips the fan-out and the judge
    #[arg(short = 'm', long = "model", help = "Pin a single model")]
    pub model: Option<String>,

    /// Models to fan out to, comma-separated
    #[arg(
        long = "models",
        value_delimiter = ',',
        help = "Models to fan out to (comma-separated)"
    )]
    pub models: Option<Vec<String>>,

    /// Model that picks the best answer
    #[arg(long = "judge-model", help = "Model that picks the best answer")]
    pub judge_model: Option<String>,

    /// Skip the judge step
    #[arg(long = "no-judge", help = "Skip the judge step")]
    pub no_judge: bool,

    /// Maximum tokens for completion-style models
    #[arg(long = "max-tokens", help = "Maximum tokens for completion-style models")]
    pub max_tokens: Option<u32>,

    /// Text prepended to the prompt
    #[arg(long = "prefix", help = "Text prepended to the prompt")]
    pub prefix: Option<String>,

    /// Per-call timeout in seconds
    #[arg(long = "timeout", help = "Per-call timeout in seconds")]
    pub timeout: Option<u64>,

    /// Print the outcome as JSON
    #[arg(long = "json", help = "Print the outcome as JSON")]
    pub json: bool,

    /// List the models chorus knows about and exit
    #[arg(long = "list-models", help = "List known models and exit")]
    pub list_models: bool,

    /// Log debug messages to a file
    #[arg(short = 'l', long = "log", help = "Log debug messages to a file")]
    pub log: bool,

    /// Specify a custom log file path, or `-` for STDERR
    #[arg(long = "log-file", help = "Specify a custom log file path (`-` for STDERR)")]
    pub log_file: Option<String>,

    /// Suppress non-essential output (spinners, banners, summaries)
    #[arg(short = 'q', long = "quiet", help = "Suppress non-essential output")]
    pub quiet: bool,

    /// Display the version
    #[arg(short = 'v', long = "version", help = "Display the version")]
    pub version: bool,
}

impl Cli {
    /// Command-line values that take priority over every other config source
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            max_tokens: self.max_tokens,
            prompt_prefix: self.prefix.clone(),
            pinned_model: self.model.clone(),
            models: self.models.clone(),
            judge_model: self.judge_model.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Help footer listing the known models
fn get_dynamic_help() -> String {
    let models_list = models::names()
        .iter()
        .map(|m| format!("{}", m.bold()))
        .collect::<Vec<_>>()
        .join(" • ");

    format!("\nKnown models: {models_list}\n\n{}", ui::USAGE)
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

fn setup_logging(cli: &Cli) -> anyhow::Result<()> {
    if cli.log {
        if let Err(e) = logger::init() {
            ui::print_warning(&format!("Logging unavailable: {e}"));
        }
        logger::enable_logging();
        match cli.log_file.as_deref() {
            Some("-") => logger::set_log_to_stderr(true),
            log_file => {
                let log_file = log_file.unwrap_or(logger::DEFAULT_LOG_FILE);
                logger::set_log_file(log_file)
                    .with_context(|| format!("Failed to open log file {log_file}"))?;
            }
        }
    } else {
        logger::disable_logging();
    }
    Ok(())
}

fn print_models() {
    for spec in models::all() {
        let default = if models::DEFAULT_MODELS.contains(&spec.identifier.as_str()) {
            " (default)".green().to_string()
        } else {
            String::new()
        };
        println!("{:<24} {}{}", spec.identifier.bold(), spec.shape, default);
    }
}

/// Cancel `token` on Ctrl-C so in-flight calls resolve instead of hanging
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_warn!("Interrupted; cancelling in-flight calls");
            token.cancel();
        }
    });
}

fn announce(prompt: &Prompt, config: &Config) {
    ui::print_info(&format!("> Using prompt from {}: {}", prompt.source, prompt.text));
    match &config.pinned_model {
        Some(model) => ui::print_info(&format!("> Asking {model}")),
        None => ui::print_info(&format!("> Asking {}", config.models.join(", "))),
    }
}

/// Pretty JSON for `--json`, tagged by `mode`
pub fn outcome_json(outcome: &Outcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

/// Print the outcome as JSON on stdout or as the colored report
fn report(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if !json {
        ui::print_outcome(outcome);
        return Ok(());
    }

    println!(
        "{}",
        outcome_json(outcome).context("Failed to serialize outcome")?
    );
    if *outcome == Outcome::NoInput {
        ui::print_usage();
    }
    Ok(())
}

/// Parse arguments, run the flow, and return the process exit code
pub async fn main() -> anyhow::Result<i32> {
    let cli = parse_args();

    if cli.version {
        ui::print_version(crate_version!());
        return Ok(0);
    }

    setup_logging(&cli)?;

    if cli.quiet || cli.json {
        ui::set_quiet_mode(true);
    }

    if cli.list_models {
        print_models();
        return Ok(0);
    }

    let config = Arc::new(Config::load(&cli.overrides()).context("Failed to load configuration")?);

    let Some(prompt) =
        input::read_prompt(cli.prompt.as_deref()).context("Failed to read prompt from STDIN")?
    else {
        report(&Outcome::NoInput, cli.json)?;
        return Ok(EXIT_NO_INPUT);
    };
    log_debug!("Prompt from {}: {} bytes", prompt.source, prompt.text.len());

    if !cli.json {
        announce(&prompt, &config);
    }

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let backend: Arc<dyn Backend> = Arc::new(
        HttpBackend::new(Arc::clone(&config)).context("Failed to create HTTP backend")?,
    );
    let orchestrator = Orchestrator::new(backend, Arc::clone(&config))
        .with_cancellation(cancel)
        .with_judge(!cli.no_judge);

    let spinner = ui::create_spinner("Waiting for answers...");
    let outcome = orchestrator.run(Some(&prompt.text)).await;
    spinner.finish_and_clear();

    report(&outcome, cli.json)?;
    Ok(outcome.exit_code())
}
