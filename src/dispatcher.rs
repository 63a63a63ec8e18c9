use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{ResultAggregator, ResultCollection};
use crate::engine::InferenceClient;
use crate::parser::OutputParser;
use crate::prompt::PromptBuilder;
use crate::schema::SchemaContract;
use crate::types::{ErrorKind, InputItem, Outcome};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("worker capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),

    #[error("result collection still shared after all workers joined")]
    CollectionStillShared,
}

struct Pipeline {
    client: Arc<dyn InferenceClient>,
    prompt_builder: PromptBuilder,
    parser: OutputParser,
}

impl Pipeline {
    #[tracing::instrument(skip(self, item, cancel))]
    async fn classify(&self, index: usize, item: &InputItem, cancel: &CancellationToken) -> Outcome {
        let request = self.prompt_builder.build(item);

        let reply = match self.client.infer(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                if err.is_fatal() {
                    tracing::error!(index, error = %err, "Fatal inference error, cancelling pending items");
                    cancel.cancel();
                } else {
                    tracing::warn!(index, error = %err, "Inference failed");
                }
                return Outcome::failure(ErrorKind::InferenceError, err.to_string());
            }
        };

        match self.parser.parse(&reply) {
            Ok(record) => Outcome::Success(record),
            Err(err) => {
                tracing::warn!(index, reason = err.reason(), error = %err, "Reply rejected");
                Outcome::failure(err.kind(), err.to_string())
            }
        }
    }
}

/// Fans reviews out to a fixed pool of workers and gathers outcomes by original index.
#[derive(Clone)]
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn InferenceClient>, schema: SchemaContract) -> Self {
        let pipeline = Pipeline {
            client,
            prompt_builder: PromptBuilder::new(schema.describe()),
            parser: OutputParser::new(schema),
        };

        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    /// Cancelling `cancel` stops new items from starting; in-flight items finish.
    #[tracing::instrument(skip(self, items, cancel), fields(item_count = items.len()))]
    pub async fn run(
        &self,
        items: Vec<InputItem>,
        worker_capacity: usize,
        cancel: CancellationToken,
    ) -> Result<ResultAggregator, DispatchError> {
        if worker_capacity == 0 {
            return Err(DispatchError::InvalidCapacity(worker_capacity));
        }
        if items.is_empty() {
            tracing::info!("No items to classify");
            return Ok(ResultAggregator::default());
        }

        let run_start = Instant::now();
        let collection = Arc::new(ResultCollection::with_len(items.len()));

        let (queue_tx, queue_rx) = flume::unbounded();
        for entry in items.into_iter().enumerate() {
            // The receiver is alive for the whole run, so sending cannot fail.
            let _ = queue_tx.send(entry);
        }
        drop(queue_tx);

        let worker_count = worker_capacity.min(collection.len());
        tracing::info!(worker_count, "Starting workers");

        let workers = (0..worker_count).map(|worker_id| {
            let worker = Worker {
                id: worker_id,
                pipeline: Arc::clone(&self.pipeline),
                queue: queue_rx.clone(),
                collection: Arc::clone(&collection),
                cancel: cancel.clone(),
            };
            tokio::spawn(worker.run())
        });

        for (worker_id, result) in join_all(workers).await.into_iter().enumerate() {
            if let Err(err) = result {
                tracing::error!(worker_id, error = %err, "Worker terminated abnormally");
            }
        }

        // Only left over when every worker died.
        for (index, _) in queue_rx.drain() {
            collection.record(
                index,
                Outcome::failure(ErrorKind::WorkerAborted, "no worker left to process item"),
            );
        }

        let collection =
            Arc::into_inner(collection).ok_or(DispatchError::CollectionStillShared)?;
        let aggregator = collection.freeze();

        tracing::info!(
            elapsed_ms = run_start.elapsed().as_millis(),
            items = aggregator.len(),
            "All workers joined"
        );
        Ok(aggregator)
    }
}

struct Worker {
    id: usize,
    pipeline: Arc<Pipeline>,
    queue: flume::Receiver<(usize, InputItem)>,
    collection: Arc<ResultCollection>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        while let Ok((index, item)) = self.queue.recv_async().await {
            let outcome = if self.cancel.is_cancelled() {
                Outcome::failure(ErrorKind::Cancelled, "cancelled before dispatch")
            } else {
                tracing::debug!(worker_id = self.id, index, "Dispatching item");
                self.pipeline.classify(index, &item, &self.cancel).await
            };

            if !self.collection.record(index, outcome) {
                tracing::error!(worker_id = self.id, index, "Outcome slot already filled");
            }
        }

        tracing::debug!(worker_id = self.id, "Worker finished");
    }
}
