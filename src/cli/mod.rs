//! Subcommand implementations

pub mod degree;
pub mod geo;
pub mod ingest;
pub mod show;

use anyhow::Result;

use crate::batch::save_stories;
use crate::pipeline::{IngestReport, TargetStatus};
use crate::store::SeenStore;
use crate::story::Story;
use crate::Config;

/// Echo freshly ingested stories in verbose mode
pub(crate) fn print_stories(config: &Config, stories: &[Story]) {
    if config.verbose {
        for story in stories {
            println!("{}", story);
        }
    }
}

/// Print the outcome of an ingestion pass and optionally save a batch
pub(crate) fn finish_ingest(config: &Config, report: IngestReport, save: bool) -> Result<()> {
    for outcome in &report.targets {
        match &outcome.status {
            TargetStatus::Collected(n) => println!("  {:<24} {} stories", outcome.target.id(), n),
            TargetStatus::Empty => println!("  {:<24} no stories", outcome.target.id()),
            TargetStatus::UnexpectedShape { raw } => {
                println!("  {:<24} skipped: {}", outcome.target.id(), raw)
            }
        }
    }
    println!(
        "Processed {} targets with {} stories ({} malformed, {} unexpected responses skipped)",
        report.targets.len(),
        report.processed,
        report.malformed,
        report.unexpected_targets()
    );

    if save {
        let mut seen = SeenStore::open(&config.seen_db_path())?;
        let summary = save_stories(&mut seen, report.stories, &config.output_dir())?;
        println!(
            "Saved {} stories to {} (skipped {} already seen)",
            summary.saved,
            summary.path.display(),
            summary.skipped
        );
    }

    Ok(())
}
