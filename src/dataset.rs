use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::{InputItem, Outcome};

#[derive(Debug, Deserialize)]
struct ReviewDataset {
    positive: Vec<String>,
    negative: Vec<String>,
}

/// Loads up to `per_class_limit` positive reviews followed by up to
/// `per_class_limit` negative ones.
#[tracing::instrument]
pub fn load_dataset(path: &Path, per_class_limit: usize) -> Result<Vec<InputItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    let dataset: ReviewDataset = serde_json::from_str(&raw)
        .with_context(|| format!("Dataset {} is not a positive/negative review map", path.display()))?;

    let items: Vec<InputItem> = dataset
        .positive
        .into_iter()
        .take(per_class_limit)
        .chain(dataset.negative.into_iter().take(per_class_limit))
        .collect();

    tracing::info!(items = items.len(), "Dataset loaded");
    Ok(items)
}

#[tracing::instrument(skip(outcomes), fields(items = outcomes.len()))]
pub fn write_results(path: &Path, outcomes: &[Outcome]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create results file {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, outcomes)
        .context("Failed to serialize results")?;
    writer.flush().context("Failed to flush results file")?;

    tracing::info!(path = %path.display(), "Results written");
    Ok(())
}
