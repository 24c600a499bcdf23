//! Fan-out/fan-in dispatcher
//!
//! Sends one prompt to many models at once. Every identifier gets exactly one
//! slot in the returned [`AggregateResult`], in the order the caller listed
//! them, no matter which call finishes first.

use crate::backend::{Backend, elapsed_ms};
use crate::config::Config;
use crate::error::ChorusError;
use crate::models;
use crate::types::{AggregateResult, CallResult, Request};
use crate::{log_debug, log_info, log_warn};

use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One position in the output, either already settled or still running
enum Slot {
    Settled(CallResult),
    Running {
        model: String,
        handle: JoinHandle<CallResult>,
    },
}

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, config: Arc<Config>, cancel: CancellationToken) -> Self {
        Self {
            backend,
            config,
            cancel,
        }
    }

    /// Send `prompt` to every model in `identifiers` concurrently.
    ///
    /// Unknown identifiers settle immediately as `UnknownModel` failures and
    /// are never launched. Duplicates are dispatched independently.
    #[tracing::instrument(skip_all, fields(models = identifiers.len()))]
    pub async fn dispatch_all(&self, prompt: &str, identifiers: &[String]) -> AggregateResult {
        if identifiers.is_empty() {
            return AggregateResult::default();
        }

        let start = Instant::now();
        // Timeouts cancel this dispatch only; cancelling the parent reaches every call
        let token = self.cancel.child_token();

        let slots: Vec<Slot> = identifiers
            .iter()
            .map(|identifier| match models::resolve(identifier) {
                Ok(spec) => {
                    let request = Request::new(
                        prompt,
                        self.config.max_tokens,
                        self.config.prompt_prefix.as_str(),
                        spec,
                    );
                    let handle = tokio::spawn(guarded_call(
                        Arc::clone(&self.backend),
                        request,
                        self.config.timeout,
                        token.clone(),
                    ));
                    Slot::Running {
                        model: identifier.clone(),
                        handle,
                    }
                }
                Err(e) => {
                    log_warn!("Skipping {}: {}", identifier, e);
                    Slot::Settled(CallResult::failure(identifier.clone(), &e))
                }
            })
            .collect();

        log_info!(
            "Dispatched {} of {} models",
            slots
                .iter()
                .filter(|s| matches!(s, Slot::Running { .. }))
                .count(),
            identifiers.len()
        );

        // join_all yields in input order, which is the caller's order
        let results = join_all(slots.into_iter().map(|slot| async move {
            match slot {
                Slot::Settled(result) => result,
                Slot::Running { model, handle } => match handle.await {
                    // Report the identifier as listed, not the registry's spelling
                    Ok(result) => CallResult { model, ..result },
                    Err(e) => {
                        log_warn!("Call task for {} did not complete: {}", model, e);
                        CallResult::failure(
                            model,
                            &ChorusError::Transport(format!("call task did not complete: {e}")),
                        )
                    }
                },
            }
        }))
        .await;

        let aggregate = AggregateResult::new(results);
        log_debug!(
            "{}/{} successful in {}ms",
            aggregate.success_count(),
            aggregate.len(),
            elapsed_ms(start)
        );
        aggregate
    }
}

/// Run one call under a timeout and a cancellation token.
///
/// A call that outlives `timeout` turns into a transport failure and cancels
/// `cancel`, so siblings sharing the token stop waiting too.
pub async fn guarded_call(
    backend: Arc<dyn Backend>,
    request: Request,
    timeout: Duration,
    cancel: CancellationToken,
) -> CallResult {
    let start = Instant::now();
    let model = request.model.identifier.clone();

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            log_debug!("{} cancelled", model);
            CallResult::failure(model, &ChorusError::Transport("cancelled".to_string()))
                .with_elapsed_ms(elapsed_ms(start))
        }
        outcome = tokio::time::timeout(timeout, backend.invoke(request)) => match outcome {
            Ok(result) => result,
            Err(_) => {
                log_warn!("{} timed out after {:?}", model, timeout);
                cancel.cancel();
                CallResult::failure(
                    model,
                    &ChorusError::Transport(format!("timed out after {timeout:?}")),
                )
                .with_elapsed_ms(elapsed_ms(start))
            }
        },
    }
}
