//! Top-level flow: no input, a single pinned model, or fan-out plus judge

use crate::backend::Backend;
use crate::config::Config;
use crate::dispatch::{Dispatcher, guarded_call};
use crate::judge::Judge;
use crate::models;
use crate::types::{AggregateResult, CallResult, JudgmentResult, Request};
use crate::{log_debug, log_info};

use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Exit code when no prompt could be found
pub const EXIT_NO_INPUT: i32 = 2;
/// Exit code when every call failed
pub const EXIT_ALL_FAILED: i32 = 1;

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Outcome {
    /// No prompt from any source; nothing was called
    NoInput,
    /// One pinned model answered (or failed); dispatcher and judge skipped
    SingleModel(CallResult),
    /// Every configured model was asked, then the judge if there was anything to compare
    FanOut {
        results: AggregateResult,
        judgment: Option<JudgmentResult>,
    },
}

impl Outcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoInput => EXIT_NO_INPUT,
            Self::SingleModel(result) if result.ok => 0,
            Self::FanOut { results, .. } if results.success_count() > 0 => 0,
            Self::SingleModel(_) | Self::FanOut { .. } => EXIT_ALL_FAILED,
        }
    }
}

pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    config: Arc<Config>,
    cancel: CancellationToken,
    judge_enabled: bool,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>, config: Arc<Config>) -> Self {
        Self {
            backend,
            config,
            cancel: CancellationToken::new(),
            judge_enabled: true,
        }
    }

    /// Share an externally owned token, e.g. one cancelled on Ctrl-C
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Turn the judge step on or off for fan-out runs
    #[must_use]
    pub fn with_judge(mut self, enabled: bool) -> Self {
        self.judge_enabled = enabled;
        self
    }

    pub async fn run(&self, prompt: Option<&str>) -> Outcome {
        let Some(prompt) = prompt.map(str::trim).filter(|p| !p.is_empty()) else {
            log_debug!("No prompt available");
            return Outcome::NoInput;
        };

        match &self.config.pinned_model {
            Some(model) => Outcome::SingleModel(self.run_single(prompt, model).await),
            None => self.run_fan_out(prompt).await,
        }
    }

    async fn run_single(&self, prompt: &str, identifier: &str) -> CallResult {
        log_info!("Single-model run with {}", identifier);
        match models::resolve(identifier) {
            Ok(spec) => {
                let request = Request::new(
                    prompt,
                    self.config.max_tokens,
                    self.config.prompt_prefix.as_str(),
                    spec,
                );
                let result = guarded_call(
                    Arc::clone(&self.backend),
                    request,
                    self.config.timeout,
                    self.cancel.child_token(),
                )
                .await;
                CallResult {
                    model: identifier.to_string(),
                    ..result
                }
            }
            Err(e) => CallResult::failure(identifier, &e),
        }
    }

    async fn run_fan_out(&self, prompt: &str) -> Outcome {
        log_info!("Fan-out run over {} models", self.config.models.len());
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.config),
            self.cancel.clone(),
        );
        let results = dispatcher.dispatch_all(prompt, &self.config.models).await;

        let judgment = if self.judge_enabled {
            Judge::new(
                Arc::clone(&self.backend),
                Arc::clone(&self.config),
                self.cancel.clone(),
            )
            .judge(prompt, &results)
            .await
        } else {
            None
        };

        Outcome::FanOut { results, judgment }
    }
}
