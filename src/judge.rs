//! Judge step: ask one chat model which of the collected answers is best

use crate::backend::Backend;
use crate::config::Config;
use crate::dispatch::guarded_call;
use crate::log_debug;
use crate::models::ModelSpec;
use crate::types::{AggregateResult, JudgmentResult, Request};

use std::fmt::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Opening line of every meta-prompt
pub const JUDGE_QUESTION: &str = "Which of the following answers is best?";

/// Fewer successful answers than this leaves nothing to compare
pub const MIN_ANSWERS_TO_JUDGE: usize = 2;

pub struct Judge {
    backend: Arc<dyn Backend>,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl Judge {
    pub fn new(backend: Arc<dyn Backend>, config: Arc<Config>, cancel: CancellationToken) -> Self {
        Self {
            backend,
            config,
            cancel,
        }
    }

    /// Judge the successful entries of `results`.
    ///
    /// Returns `None` without calling anything when fewer than two answers
    /// succeeded. A failed judge call comes back as a `JudgmentResult` with
    /// `ok == false`; `results` is never touched.
    #[tracing::instrument(skip_all, fields(judge = %self.config.judge_model))]
    pub async fn judge(&self, prompt: &str, results: &AggregateResult) -> Option<JudgmentResult> {
        let answers = results.success_count();
        if answers < MIN_ANSWERS_TO_JUDGE {
            log_debug!("Skipping judge: {} successful answer(s)", answers);
            return None;
        }

        let meta_prompt = build_meta_prompt(prompt, results);
        // Always chat-shaped, whatever the configured judge model's registry entry says
        let request = Request::new(
            meta_prompt,
            self.config.max_tokens,
            "",
            ModelSpec::chat(self.config.judge_model.as_str()),
        );
        log_debug!(
            "Judging {} answers with {}",
            answers,
            self.config.judge_model
        );

        let result = guarded_call(
            Arc::clone(&self.backend),
            request,
            self.config.timeout,
            self.cancel.child_token(),
        )
        .await;

        Some(JudgmentResult::from(result))
    }
}

/// Build the meta-prompt from the successful answers, in aggregate order
pub fn build_meta_prompt(prompt: &str, results: &AggregateResult) -> String {
    let mut meta = String::new();
    meta.push_str(JUDGE_QUESTION);
    meta.push_str("\n\n");
    let _ = writeln!(meta, "Question: {}", prompt.trim());

    for (index, result) in results.successes().enumerate() {
        let _ = write!(
            meta,
            "\nAnswer {} ({}):\n{}\n",
            index + 1,
            result.model,
            result.text
        );
    }

    meta.push_str("\nReply with the number of the best answer and a one-sentence reason.");
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChorusError;
    use crate::types::CallResult;

    #[test]
    fn test_meta_prompt_lists_successes_in_order() {
        let results = AggregateResult::new(vec![
            CallResult::success("gpt-4", "Paris."),
            CallResult::failure("gpt-9", &ChorusError::UnknownModel("gpt-9".into())),
            CallResult::success("text-davinci-003", "The capital is Paris."),
        ]);

        let meta = build_meta_prompt("What is the capital of France?", &results);

        assert!(meta.starts_with(JUDGE_QUESTION));
        assert!(meta.contains("Question: What is the capital of France?"));
        assert!(!meta.contains("gpt-9"));

        let first = meta.find("Answer 1 (gpt-4):\nParis.").expect("first answer");
        let second = meta
            .find("Answer 2 (text-davinci-003):\nThe capital is Paris.")
            .expect("second answer");
        assert!(first < second);
    }
}
