use anyhow::Result;
use chorus::judge::{JUDGE_QUESTION, build_meta_prompt};
use chorus::{AggregateResult, Backend, CallResult, CallShape, ChorusError, Judge};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use test_utils::{FakeBackend, Script, shared, test_config};

const PROMPT: &str = "What is the capital of France?";

fn judge(fake: &Arc<FakeBackend>) -> Judge {
    let backend: Arc<dyn Backend> = fake.clone();
    Judge::new(
        backend,
        shared(test_config(&[])),
        CancellationToken::new(),
    )
}

fn failed(model: &str) -> CallResult {
    CallResult::failure(model, &ChorusError::Transport("connection reset".into()))
}

#[tokio::test]
async fn test_judge_skipped_without_answers() {
    let fake = Arc::new(FakeBackend::new());

    let empty = judge(&fake).judge(PROMPT, &AggregateResult::default()).await;
    let all_failed = judge(&fake)
        .judge(
            PROMPT,
            &AggregateResult::new(vec![failed("gpt-4"), failed("text-davinci-003")]),
        )
        .await;

    assert!(empty.is_none());
    assert!(all_failed.is_none());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_judge_skipped_with_single_answer() {
    let fake = Arc::new(FakeBackend::new());
    let results = AggregateResult::new(vec![
        CallResult::success("gpt-4", "Paris."),
        failed("text-davinci-003"),
    ]);

    assert!(judge(&fake).judge(PROMPT, &results).await.is_none());
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn test_judge_called_once_with_chat_shape() -> Result<()> {
    let fake = Arc::new(FakeBackend::new().with_judge(Script::answer("Answer 2 is best.", 0)));
    let results = AggregateResult::new(vec![
        CallResult::success("text-davinci-003", "Paris"),
        failed("gpt-4"),
        CallResult::success("gpt-3.5-turbo-instruct", "The capital of France is Paris."),
    ]);

    let verdict = judge(&fake)
        .judge(PROMPT, &results)
        .await
        .ok_or_else(|| anyhow::anyhow!("judge should run"))?;

    assert!(verdict.ok);
    assert_eq!(verdict.text, "Answer 2 is best.");

    let calls = fake.judge_calls();
    assert_eq!(calls.len(), 1);
    let request = &calls[0];
    assert_eq!(request.model.shape, CallShape::Chat);
    assert!(request.prompt_prefix.is_empty());
    assert_eq!(request.prompt, build_meta_prompt(PROMPT, &results));
    assert!(request.prompt.starts_with(JUDGE_QUESTION));
    assert!(!request.prompt.contains("connection reset"));
    Ok(())
}

#[tokio::test]
async fn test_judge_failure_leaves_results_intact() -> Result<()> {
    let fake = Arc::new(
        FakeBackend::new().with_judge(Script::fail(ChorusError::Remote("status 429".into()))),
    );
    let results = AggregateResult::new(vec![
        CallResult::success("gpt-4", "Paris."),
        CallResult::success("gpt-3.5-turbo", "Paris"),
    ]);
    let before = results.clone();

    let verdict = judge(&fake)
        .judge(PROMPT, &results)
        .await
        .ok_or_else(|| anyhow::anyhow!("judge should run"))?;

    assert!(!verdict.ok);
    assert_eq!(verdict.error.as_deref(), Some("status 429"));
    assert_eq!(results, before);
    Ok(())
}
