//! Per-call request

use crate::models::ModelSpec;

/// Everything one backend call needs. Built once per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub prompt: String,
    pub max_tokens: u32,
    pub prompt_prefix: String,
    pub model: ModelSpec,
}

impl Request {
    pub fn new(
        prompt: impl Into<String>,
        max_tokens: u32,
        prompt_prefix: impl Into<String>,
        model: ModelSpec,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            prompt_prefix: prompt_prefix.into(),
            model,
        }
    }

    /// Prompt text as sent on the wire, prefix first
    pub fn full_prompt(&self) -> String {
        format!("{}{}", self.prompt_prefix, self.prompt)
    }
}
