use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::types::{ErrorKind, Outcome};

/// Fixed-length, index-addressed outcome slots. Each slot is written at most once.
#[derive(Debug)]
pub struct ResultCollection {
    slots: Vec<OnceLock<Outcome>>,
}

impl ResultCollection {
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Records the outcome for `index`. Returns false if the slot was already filled.
    pub fn record(&self, index: usize, outcome: Outcome) -> bool {
        let kind = outcome.error_kind();
        let recorded = self.slots[index].set(outcome).is_ok();
        if recorded {
            count_outcome(kind);
        }
        recorded
    }

    /// Freezes the collection once every worker has joined.
    pub fn freeze(self) -> ResultAggregator {
        let outcomes = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.into_inner().unwrap_or_else(|| {
                    tracing::error!(index, "Item has no recorded outcome");
                    count_outcome(Some(ErrorKind::WorkerAborted));
                    Outcome::failure(
                        ErrorKind::WorkerAborted,
                        "worker terminated before recording an outcome",
                    )
                })
            })
            .collect();

        ResultAggregator { outcomes }
    }
}

fn count_outcome(kind: Option<ErrorKind>) {
    match kind {
        None => metrics::counter!("reviews_classified_total").increment(1),
        Some(kind) => {
            metrics::counter!("reviews_failed_total", "kind" => kind.as_str()).increment(1)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: BTreeMap<&'static str, usize>,
}

/// The frozen, ordered outcomes of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultAggregator {
    outcomes: Vec<Outcome>,
}

impl ResultAggregator {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn to_sequence(self) -> Vec<Outcome> {
        self.outcomes
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.outcomes.len(),
            ..Default::default()
        };
        for outcome in &self.outcomes {
            match outcome.error_kind() {
                None => summary.succeeded += 1,
                Some(kind) => *summary.failed.entry(kind.as_str()).or_default() += 1,
            }
        }
        summary
    }
}
