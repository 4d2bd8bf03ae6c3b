//! Sequential batch enrichment of import candidates

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::enrichment::{EnrichmentClient, RawText};
use crate::models::{BatchFailure, EnrichmentResult, ImportCandidate};

pub const DEFAULT_BATCH_SIZE: usize = 5;

const SYSTEM_INSTRUCTION: &str = "You are a helpful inventory assistant. Output strictly valid JSON.";

/// Receives `(batch_index, total_batches)` before each batch is sent.
/// Indices are 1-based and strictly increasing.
pub trait ProgressSink: Send + Sync {
    fn batch_started(&self, batch_index: usize, total_batches: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn batch_started(&self, batch_index: usize, total_batches: usize) {
        self(batch_index, total_batches)
    }
}

/// Sink that discards progress
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn batch_started(&self, _batch_index: usize, _total_batches: usize) {}
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentOutcome {
    pub total_batches: usize,
    pub processed_batches: usize,
    /// Candidates that received at least one field
    pub enriched: usize,
    pub failures: Vec<BatchFailure>,
    /// A permanent failure stopped the remaining batches
    pub aborted: bool,
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct BatchEnricher {
    client: EnrichmentClient,
    batch_size: usize,
}

impl BatchEnricher {
    pub fn new(client: EnrichmentClient, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Enrich `candidates` in place, one batch at a time.
    ///
    /// Merges from completed batches are kept whatever happens later:
    /// soft failures skip only their own batch, a permanent failure or
    /// cancellation stops before the next batch.
    pub async fn enrich(
        &self,
        candidates: &mut [ImportCandidate],
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> EnrichmentOutcome {
        let total_batches = candidates.len().div_ceil(self.batch_size);
        let mut outcome = EnrichmentOutcome {
            total_batches,
            ..Default::default()
        };

        for (index, batch) in candidates.chunks_mut(self.batch_size).enumerate() {
            let batch_index = index + 1;

            if cancel.is_cancelled() {
                tracing::info!(batch_index, total_batches, "Enrichment cancelled");
                outcome.cancelled = true;
                break;
            }

            progress.batch_started(batch_index, total_batches);

            let prompt = match build_prompt(batch) {
                Ok(prompt) => prompt,
                Err(e) => {
                    outcome.failures.push(soft_failure(batch_index, total_batches, e.to_string()));
                    continue;
                }
            };

            let completion = match self.client.complete(&prompt, Some(SYSTEM_INSTRUCTION), true).await {
                Ok(completion) => completion,
                Err(failure) if failure.is_permanent() => {
                    tracing::error!(batch_index, total_batches, error = %failure, "Enrichment aborted");
                    outcome.failures.push(BatchFailure {
                        batch_index,
                        total_batches,
                        permanent: true,
                        message: format!("AI service unavailable (Method Not Allowed): {}", failure),
                    });
                    outcome.aborted = true;
                    break;
                }
                Err(failure) => {
                    tracing::warn!(batch_index, total_batches, error = %failure, "Enrichment batch failed");
                    outcome.failures.push(soft_failure(batch_index, total_batches, failure.to_string()));
                    continue;
                }
            };
            outcome.processed_batches += 1;

            match completion.into_structured() {
                Ok(Value::Object(results)) => {
                    outcome.enriched += merge_batch(batch, &results);
                }
                Ok(other) => {
                    tracing::warn!(batch_index, "Enrichment reply is not an object");
                    outcome.failures.push(soft_failure(
                        batch_index,
                        total_batches,
                        format!("Unexpected reply shape: {}", other),
                    ));
                }
                Err(RawText(text)) => {
                    tracing::warn!(batch_index, "Enrichment reply is not valid JSON");
                    outcome.failures.push(soft_failure(
                        batch_index,
                        total_batches,
                        format!("Unparseable reply: {}", truncate(&text, 200)),
                    ));
                }
            }
        }

        tracing::info!(
            total_batches,
            processed = outcome.processed_batches,
            enriched = outcome.enriched,
            failures = outcome.failures.len(),
            "Enrichment finished"
        );
        outcome
    }
}

fn build_prompt(batch: &[ImportCandidate]) -> serde_json::Result<String> {
    let items: Vec<Value> = batch
        .iter()
        .map(|c| serde_json::json!({ "id": c.id, "name": c.name }))
        .collect();

    Ok(format!(
        "I have a list of inventory items. Return a JSON object where the keys are the item IDs provided, \
         and the values are objects with \"category\" (string), \"description\" (concise string), and \
         \"maintenance\" (concise string) fields.\nItems: {}",
        serde_json::to_string(&items)?
    ))
}

/// Apply per-id results to the batch; returns the number of candidates changed
fn merge_batch(batch: &mut [ImportCandidate], results: &serde_json::Map<String, Value>) -> usize {
    let mut touched = 0;
    for candidate in batch.iter_mut() {
        let Some(result) = results.get(&candidate.id).and_then(EnrichmentResult::from_value) else {
            continue;
        };
        if candidate.merge_enrichment(&result) {
            touched += 1;
        }
    }
    touched
}

fn soft_failure(batch_index: usize, total_batches: usize, message: String) -> BatchFailure {
    BatchFailure {
        batch_index,
        total_batches,
        permanent: false,
        message,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::enrichment::{CompletionRequest, MockCompletionTransport, ServiceFailure};
    use crate::services::retry::RetryPolicy;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn candidates(n: usize) -> Vec<ImportCandidate> {
        (1..=n)
            .map(|i| ImportCandidate::new(format!("IT-{:02}", i), format!("Item {}", i)))
            .collect()
    }

    /// Reply enriching every id named in the prompt
    fn echo_reply(request: &CompletionRequest) -> Value {
        let prompt = &request.messages.last().unwrap().content;
        let items: Vec<Value> = serde_json::from_str(prompt.split("Items: ").nth(1).unwrap()).unwrap();
        let mut map = serde_json::Map::new();
        for item in items {
            map.insert(
                item["id"].as_str().unwrap().to_string(),
                json!({"category": "Tools", "description": "Generated", "maintenance": "Inspect yearly"}),
            );
        }
        json!({"choices": [{"message": {"content": Value::Object(map).to_string()}}]})
    }

    fn enricher(mock: MockCompletionTransport) -> BatchEnricher {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2, ServiceFailure::is_permanent);
        let client = EnrichmentClient::new(Arc::new(mock), "test-model").with_policy(policy);
        BatchEnricher::new(client, DEFAULT_BATCH_SIZE)
    }

    #[tokio::test]
    async fn test_twelve_candidates_make_three_batches() {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let recorded = sizes.clone();

        let mut mock = MockCompletionTransport::new();
        mock.expect_send().times(3).returning(move |req| {
            let prompt = &req.messages.last().unwrap().content;
            recorded.lock().unwrap().push(prompt.matches("\"id\"").count());
            Ok(echo_reply(req))
        });

        let seen = Mutex::new(Vec::new());
        let progress = |index: usize, total: usize| seen.lock().unwrap().push((index, total));

        let mut items = candidates(12);
        let outcome = enricher(mock)
            .enrich(&mut items, &progress, &CancellationToken::new())
            .await;

        assert_eq!(*sizes.lock().unwrap(), vec![5, 5, 2]);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(outcome.total_batches, 3);
        assert_eq!(outcome.processed_batches, 3);
        assert_eq!(outcome.enriched, 12);
        assert!(outcome.failures.is_empty());
        assert!(items.iter().all(|c| c.category.as_deref() == Some("Tools")));
    }

    #[tokio::test]
    async fn test_permanent_failure_keeps_earlier_batches_and_skips_rest() {
        let mut calls = 0;
        let mut mock = MockCompletionTransport::new();
        mock.expect_send().times(2).returning(move |req| {
            calls += 1;
            if calls == 1 {
                Ok(echo_reply(req))
            } else {
                Err(ServiceFailure::from_status(405, "Method Not Allowed"))
            }
        });

        let mut items = candidates(12);
        let outcome = enricher(mock)
            .enrich(&mut items, &NoProgress, &CancellationToken::new())
            .await;

        assert!(outcome.aborted);
        assert_eq!(outcome.processed_batches, 1);
        assert_eq!(outcome.enriched, 5);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].batch_index, 2);
        assert!(outcome.failures[0].permanent);

        assert!(items[..5].iter().all(|c| c.maintenance_note.is_some()));
        assert!(items[5..].iter().all(|c| c.maintenance_note.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_skips_only_its_batch() {
        let mut calls = 0;
        let mut mock = MockCompletionTransport::new();
        // batch 1 ok, batch 2 fails all three attempts, batch 3 ok
        mock.expect_send().times(5).returning(move |req| {
            calls += 1;
            if (2..=4).contains(&calls) {
                Err(ServiceFailure::from_status(500, "boom"))
            } else {
                Ok(echo_reply(req))
            }
        });

        let mut items = candidates(12);
        let outcome = enricher(mock)
            .enrich(&mut items, &NoProgress, &CancellationToken::new())
            .await;

        assert!(!outcome.aborted);
        assert_eq!(outcome.processed_batches, 2);
        assert_eq!(outcome.enriched, 7);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].batch_index, 2);
        assert!(!outcome.failures[0].permanent);
        assert!(items[5..10].iter().all(|c| c.category.is_none()));
        assert!(items[10..].iter().all(|c| c.category.is_some()));
    }

    #[tokio::test]
    async fn test_unparsed_reply_is_a_soft_failure() {
        let mut mock = MockCompletionTransport::new();
        mock.expect_send()
            .times(1)
            .returning(|_| Ok(json!({"choices": [{"message": {"content": "Sorry, I can't."}}]})));

        let mut items = candidates(3);
        let outcome = enricher(mock)
            .enrich(&mut items, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(outcome.enriched, 0);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].message.starts_with("Unparseable reply"));
        assert_eq!(items, candidates(3));
    }

    #[tokio::test]
    async fn test_blank_results_are_not_counted() {
        let mut mock = MockCompletionTransport::new();
        mock.expect_send().times(1).returning(|_| {
            let content = json!({"IT-01": {"category": ""}, "IT-02": {"description": "  "}}).to_string();
            Ok(json!({"choices": [{"message": {"content": content}}]}))
        });

        let mut items = candidates(2);
        let outcome = enricher(mock)
            .enrich(&mut items, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(outcome.enriched, 0);
        assert!(outcome.failures.is_empty());
        assert_eq!(items, candidates(2));
    }

    #[tokio::test]
    async fn test_supplied_fields_survive_merge() {
        let mut mock = MockCompletionTransport::new();
        mock.expect_send().times(1).returning(|req| Ok(echo_reply(req)));

        let mut items = candidates(1);
        items[0].description = Some("Blue handle".to_string());
        enricher(mock)
            .enrich(&mut items, &NoProgress, &CancellationToken::new())
            .await;

        assert_eq!(items[0].description.as_deref(), Some("Blue handle"));
        assert_eq!(items[0].category.as_deref(), Some("Tools"));
    }

    #[tokio::test]
    async fn test_cancellation_checked_at_batch_boundary() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let mut mock = MockCompletionTransport::new();
        mock.expect_send().times(1).returning(move |req| {
            trigger.cancel();
            Ok(echo_reply(req))
        });

        let mut items = candidates(12);
        let outcome = enricher(mock).enrich(&mut items, &NoProgress, &cancel).await;

        assert!(outcome.cancelled);
        assert_eq!(outcome.processed_batches, 1);
        assert_eq!(outcome.enriched, 5);
        assert!(items[..5].iter().all(|c| c.category.is_some()));
    }
}
