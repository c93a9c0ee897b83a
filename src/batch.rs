//! Batch output files
//!
//! One JSON array of stories per run, named after the completion time. Only
//! stories that pass the dedup store end up in a batch.

use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::store::SeenStore;
use crate::story::Story;

const BATCH_NAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

#[derive(Debug)]
pub struct BatchSummary {
    pub path: PathBuf,
    pub saved: usize,
    pub skipped: usize,
}

/// Filter `stories` through the dedup store and write the new ones to a
/// batch file in `output_dir`.
///
/// The file is written before the seen-marks are committed: if writing
/// fails, the same stories are offered again next run.
pub fn save_stories(
    seen: &mut SeenStore,
    stories: Vec<Story>,
    output_dir: &Path,
) -> Result<BatchSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let (outcome, path) = seen.filter_unseen_then(stories, |kept| {
        let path = batch_path(output_dir);
        write_batch(&path, kept)?;
        Ok(path)
    })?;

    info!(
        path = %path.display(),
        saved = outcome.kept.len(),
        skipped = outcome.skipped,
        "batch saved"
    );

    Ok(BatchSummary {
        path,
        saved: outcome.kept.len(),
        skipped: outcome.skipped,
    })
}

/// `<dir>/<completion time>.json`, suffixed if that name is taken
fn batch_path(output_dir: &Path) -> PathBuf {
    let stem = Local::now().format(BATCH_NAME_FORMAT).to_string();
    let mut path = output_dir.join(format!("{}.json", stem));
    let mut n = 1;
    while path.exists() {
        path = output_dir.join(format!("{}-{}.json", stem, n));
        n += 1;
    }
    path
}

pub fn write_batch(path: &Path, stories: &[Story]) -> Result<()> {
    let json = serde_json::to_string(stories)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write batch {}", path.display()))?;
    Ok(())
}

pub fn read_batch(path: &Path) -> Result<Vec<Story>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch {}", path.display()))?;
    let stories = serde_json::from_str(&content)
        .with_context(|| format!("Invalid batch file {}", path.display()))?;
    Ok(stories)
}
