//! Call results and their ordered aggregate

use crate::error::{ChorusError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Outcome of exactly one backend call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    /// Model identifier as the caller asked for it
    pub model: String,
    /// Trimmed generated text, empty on failure
    pub text: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Wall time spent on the call
    #[serde(default)]
    pub elapsed_ms: u64,
}

impl CallResult {
    pub fn success(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            text: text.into(),
            ok: true,
            error: None,
            error_kind: None,
            elapsed_ms: 0,
        }
    }

    pub fn failure(model: impl Into<String>, error: &ChorusError) -> Self {
        Self {
            model: model.into(),
            text: String::new(),
            ok: false,
            error: Some(error.detail()),
            error_kind: Some(error.kind()),
            elapsed_ms: 0,
        }
    }

    #[must_use]
    pub const fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }
}

/// One result per dispatched identifier, in the order the caller gave them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResult {
    results: Vec<CallResult>,
}

impl AggregateResult {
    pub const fn new(results: Vec<CallResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CallResult> {
        self.results.iter()
    }

    pub fn successes(&self) -> impl Iterator<Item = &CallResult> {
        self.results.iter().filter(|r| r.ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CallResult> {
        self.results.iter().filter(|r| !r.ok)
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn as_slice(&self) -> &[CallResult] {
        &self.results
    }
}

impl<'a> IntoIterator for &'a AggregateResult {
    type Item = &'a CallResult;
    type IntoIter = std::slice::Iter<'a, CallResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl From<Vec<CallResult>> for AggregateResult {
    fn from(results: Vec<CallResult>) -> Self {
        Self::new(results)
    }
}
