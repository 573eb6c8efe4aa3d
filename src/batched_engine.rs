use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use metrics::counter;
use std::num::NonZeroUsize;
use tokio::time::Instant;

use crate::batch::{Batch, partition};
use crate::config::ClassifierConfig;
use crate::engine::{CompletionEngine, Engine};
use crate::error::ClassifyError;
use crate::parser::{parse_labels, split_lines};
use crate::prompt::PromptBuilder;
use crate::taxonomy::CLASSIFICATION_ERROR;

/// Classifies accounts in fixed-size batches, one completion request per
/// batch, all batches in flight concurrently.
pub struct BatchedClassifier<T: CompletionEngine> {
    completion_engine: T,
    prompt: PromptBuilder,
    batch_size: NonZeroUsize,
    max_concurrent_batches: Option<NonZeroUsize>,
}

impl<T: CompletionEngine> BatchedClassifier<T> {
    pub fn new(config: &ClassifierConfig, completion_engine: T) -> Self {
        Self {
            completion_engine,
            prompt: PromptBuilder::new(
                config.model.clone(),
                config.temperature,
                config.max_tokens,
                config.taxonomy.clone(),
            ),
            batch_size: config.batch_size,
            max_concurrent_batches: config.max_concurrent_batches,
        }
    }

    /// Runs one batch and writes its labels into `slots`, which must be the
    /// batch's own range of the result buffer. Failures never escape: the
    /// whole range gets [`CLASSIFICATION_ERROR`] instead.
    #[tracing::instrument(skip_all, fields(offset = batch.offset, size = batch.items.len()))]
    async fn execute(&self, batch: Batch<'_>, slots: &mut [String]) {
        debug_assert_eq!(slots.len(), batch.items.len());
        counter!("coa_batches_total").increment(1);
        let started = Instant::now();

        match self.run_batch(&batch).await {
            Ok(labels) => {
                for (slot, label) in slots.iter_mut().zip(labels) {
                    *slot = label;
                }
                tracing::debug!(
                    elapsed_ms = started.elapsed().as_millis(),
                    "Batch classified"
                );
            }
            Err(err) => {
                counter!("coa_batch_failures_total", "kind" => err.kind()).increment(1);
                tracing::warn!(
                    error = %err,
                    accounts = ?batch.items,
                    "Batch classification failed, marking accounts as errors"
                );
                slots.fill(CLASSIFICATION_ERROR.to_string());
            }
        }
    }

    async fn run_batch(&self, batch: &Batch<'_>) -> Result<Vec<String>, ClassifyError> {
        let request = self.prompt.build_request(batch);
        let content = self.completion_engine.complete(request).await?;

        parse_labels(&content, batch.items.len()).map_err(|err| {
            tracing::warn!(
                accounts = ?batch.items,
                raw_response = %content,
                parsed = ?split_lines(&content),
                "Classifier reply does not line up with batch"
            );
            err.into()
        })
    }
}

#[async_trait]
impl<T: CompletionEngine> Engine for BatchedClassifier<T> {
    #[tracing::instrument(skip_all, fields(accounts = accounts.len()))]
    async fn classify(&self, accounts: &[String]) -> Vec<String> {
        let batches = partition(accounts, self.batch_size);
        tracing::info!(
            batches = batches.len(),
            batch_size = self.batch_size.get(),
            "Classifying accounts"
        );

        // Each batch owns the chunk of the buffer matching its offset, so
        // completion order cannot reorder labels.
        let mut labels = vec![String::new(); accounts.len()];
        let slots = labels.chunks_mut(self.batch_size.get());

        stream::iter(batches.into_iter().zip(slots))
            .for_each_concurrent(
                self.max_concurrent_batches.map(NonZeroUsize::get),
                |(batch, slots)| self.execute(batch, slots),
            )
            .await;

        counter!("coa_accounts_classified_total").increment(accounts.len() as u64);
        labels
    }
}
