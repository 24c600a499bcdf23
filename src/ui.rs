use crate::orchestrator::Outcome;
use crate::types::{AggregateResult, CallResult, JudgmentResult};

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::fmt::Write;
use std::time::Duration;

// RGB tuples for `colored`'s `.truecolor()`
pub mod rgb {
    pub const ELECTRIC_PURPLE: (u8, u8, u8) = (225, 53, 255);
    pub const NEON_CYAN: (u8, u8, u8) = (128, 255, 234);
    pub const CORAL: (u8, u8, u8) = (255, 106, 193);
    pub const SUCCESS_GREEN: (u8, u8, u8) = (80, 250, 123);
    pub const ERROR_RED: (u8, u8, u8) = (255, 99, 99);
    pub const DIM_WHITE: (u8, u8, u8) = (180, 180, 190);
}

pub const USAGE: &str = r#"Usage:
  chorus [OPTIONS] [PROMPT]
  echo "PROMPT" | chorus [OPTIONS]

Description:
  Sends one prompt to several OpenAI models at once, prints every answer,
  then asks a judge model which answer is best. Pin a single model with
  --model (or CHORUS_MODEL) to skip the fan-out and the judge.

Options:
  PROMPT              The question or prompt to send. Read from STDIN when omitted.

Environment Variables:
  OPENAI_API_KEY      Your OpenAI API key (falls back to ./.openai_key).
  MAX_TOKENS          Maximum tokens for completion-style models. (default: 100)
  PROMPT_PREFIX       Text prepended to every prompt.
  CHORUS_MODEL        Pin a single model.
  CHORUS_MODELS       Comma-separated models to fan out to.
  CHORUS_JUDGE_MODEL  Model that picks the best answer. (default: gpt-3.5-turbo)
  OPENAI_BASE_URL     Service root. (default: https://api.openai.com/v1)
  CHORUS_TIMEOUT_SECS Per-call timeout in seconds. (default: 120)

Example:
  chorus "What is the capital of France?"
  echo "What is the capital of France?" | chorus"#;

static QUIET_MODE: std::sync::LazyLock<Mutex<bool>> =
    std::sync::LazyLock::new(|| Mutex::new(false));

/// Enable or disable quiet mode
pub fn set_quiet_mode(enabled: bool) {
    *QUIET_MODE.lock() = enabled;
}

/// Check if quiet mode is enabled
pub fn is_quiet_mode() -> bool {
    *QUIET_MODE.lock()
}

pub fn create_spinner(message: &str) -> ProgressBar {
    if is_quiet_mode() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("✦✧✶✷✸✹✺✻✼✽")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn print_info(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.cyan().bold());
    }
}

pub fn print_warning(message: &str) {
    if !is_quiet_mode() {
        eprintln!("{}", message.yellow().bold());
    }
}

pub fn print_error(message: &str) {
    // Errors print even in quiet mode
    eprintln!("{}", message.red().bold());
}

pub fn print_success(message: &str) {
    if !is_quiet_mode() {
        println!("{}", message.green().bold());
    }
}

pub fn print_version(version: &str) {
    println!(
        "{} {} {}",
        create_gradient_text("♫ chorus"),
        "version".cyan(),
        version.green()
    );
}

pub fn print_usage() {
    eprintln!("{USAGE}");
}

/// Print content with decorative borders
pub fn print_bordered_content(content: &str) {
    if is_quiet_mode() {
        println!("{content}");
    } else {
        println!("{}", "━".repeat(50).bright_purple());
        println!("{content}");
        println!("{}", "━".repeat(50).bright_purple());
    }
}

/// Gradient text, Electric Purple -> Neon Cyan
pub fn create_gradient_text(text: &str) -> String {
    let gradient = [
        rgb::ELECTRIC_PURPLE,
        (200, 100, 255),
        (180, 150, 250),
        (150, 200, 245),
        rgb::NEON_CYAN,
    ];

    apply_gradient(text, &gradient)
}

fn apply_gradient(text: &str, gradient: &[(u8, u8, u8)]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let chars_len = chars.len();
    let gradient_len = gradient.len();

    let mut result = String::new();

    if chars_len == 0 || gradient_len == 0 {
        return result;
    }

    for (i, c) in chars.iter().enumerate() {
        let index = if chars_len == 1 {
            0
        } else {
            i * (gradient_len - 1) / (chars_len - 1)
        };
        let (r, g, b) = gradient.get(index).copied().unwrap_or(rgb::NEON_CYAN);
        let _ = write!(result, "{}", c.to_string().truecolor(r, g, b));
    }

    result
}

/// Heading line for one model's answer
pub fn format_result_header(result: &CallResult) -> String {
    let (r, g, b) = if result.ok {
        rgb::SUCCESS_GREEN
    } else {
        rgb::ERROR_RED
    };
    let marker = if result.ok { "✔" } else { "✘" };
    let timing = format!("{}ms", result.elapsed_ms);
    format!(
        "{} {} {}",
        marker.truecolor(r, g, b).bold(),
        result.model.truecolor(r, g, b).bold(),
        timing.truecolor(rgb::DIM_WHITE.0, rgb::DIM_WHITE.1, rgb::DIM_WHITE.2)
    )
}

/// Body for one model's answer: the text, or the failure inline
pub fn format_result_body(result: &CallResult) -> String {
    if result.ok {
        return result.text.clone();
    }
    let kind = result
        .error_kind
        .map_or_else(|| "error".to_string(), |k| k.to_string());
    let detail = result.error.as_deref().unwrap_or("unknown failure");
    format!("{} {}", format!("[{kind}]").red().bold(), detail.red())
}

pub fn print_call_result(result: &CallResult) {
    println!("{}", format_result_header(result));
    println!("{}", format_result_body(result));
}

pub fn print_aggregate(results: &AggregateResult) {
    for (index, result) in results.iter().enumerate() {
        if index > 0 {
            println!();
        }
        print_call_result(result);
    }
}

pub fn print_judgment(judgment: &JudgmentResult) {
    let title = format!("⚖ Judge ({})", judgment.model);
    println!(
        "{}",
        title
            .truecolor(rgb::CORAL.0, rgb::CORAL.1, rgb::CORAL.2)
            .bold()
    );
    if judgment.ok {
        print_bordered_content(&judgment.text);
    } else {
        print_error(&format!(
            "Judge failed: {}",
            judgment.error.as_deref().unwrap_or("unknown failure")
        ));
    }
}

/// Render a finished run to the terminal
pub fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::NoInput => {
            print_error("✘ No prompt found in args or STDIN");
            print_usage();
        }
        Outcome::SingleModel(result) => {
            if result.ok {
                println!("{}", result.text);
            } else {
                print_call_result(result);
            }
        }
        Outcome::FanOut { results, judgment } => {
            if results.is_empty() {
                print_warning("No models configured; nothing to ask.");
                return;
            }
            print_aggregate(results);
            println!();

            let ok = results.success_count();
            let summary = format!("{ok}/{} models answered", results.len());
            if ok == results.len() {
                print_success(&summary);
            } else if ok == 0 {
                print_error(&summary);
            } else {
                print_warning(&summary);
            }

            match judgment {
                Some(judgment) => {
                    println!();
                    print_judgment(judgment);
                }
                None if ok == 1 => {
                    print_info("Judge skipped: only one answer to compare.");
                }
                None if ok > 1 => print_info("Judge skipped."),
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChorusError;

    #[test]
    fn test_failure_body_names_kind_and_detail() {
        colored::control::set_override(false);
        let result = CallResult::failure("gpt-4", &ChorusError::Remote("status 500".into()));
        assert_eq!(format_result_body(&result), "[remote] status 500");
        let header = format_result_header(&result);
        assert!(header.contains("gpt-4"));
    }

    #[test]
    fn test_gradient_keeps_characters() {
        colored::control::set_override(false);
        assert_eq!(create_gradient_text("chorus"), "chorus");
        assert_eq!(create_gradient_text(""), "");
    }
}
