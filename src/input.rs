//! Prompt acquisition: command-line argument first, then piped stdin

use crate::log_debug;

use std::fmt;
use std::io::{self, IsTerminal, Read};

/// Where the prompt came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Args,
    Stdin,
}

impl fmt::Display for PromptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Args => write!(f, "args"),
            Self::Stdin => write!(f, "STDIN"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub source: PromptSource,
}

/// Resolve the prompt from an optional argument and a stdin reader.
///
/// A blank argument falls through to stdin. Stdin is only read when it is not
/// a terminal, and is drained completely before trimming. `Ok(None)` means no
/// prompt is available from any source.
pub fn resolve_prompt<R: Read>(
    arg: Option<&str>,
    mut stdin: R,
    stdin_is_terminal: bool,
) -> io::Result<Option<Prompt>> {
    if let Some(text) = arg.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(Some(Prompt {
            text: text.to_string(),
            source: PromptSource::Args,
        }));
    }

    if stdin_is_terminal {
        log_debug!("Stdin is a terminal; not waiting for input");
        return Ok(None);
    }

    let mut buffer = Vec::new();
    stdin.read_to_end(&mut buffer)?;
    let text = String::from_utf8_lossy(&buffer).trim().to_string();
    log_debug!("Read {} bytes from stdin", buffer.len());

    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Prompt {
            text,
            source: PromptSource::Stdin,
        }))
    }
}

/// Resolve the prompt against the real process stdin
pub fn read_prompt(arg: Option<&str>) -> io::Result<Option<Prompt>> {
    let stdin = io::stdin();
    let is_terminal = stdin.is_terminal();
    resolve_prompt(arg, stdin.lock(), is_terminal)
}
