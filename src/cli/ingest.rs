//! users / tray / location commands

use anyhow::Result;

use super::{finish_ingest, print_stories};
use crate::fetch::{tray_entries, FeedClient, FetchError, PlaceResolver};
use crate::pipeline::{ingest_with, user_targets, IngestReport, IngestTarget, Pacer};
use crate::Config;

/// Run the pipeline, echoing stories per target in verbose mode
fn run_targets(
    config: &Config,
    client: &dyn FeedClient,
    targets: &[IngestTarget],
    pacer: &Pacer,
) -> Result<IngestReport> {
    let report = ingest_with(client, targets, pacer, |_, stories| {
        print_stories(config, stories);
        Ok::<_, FetchError>(())
    })?;
    Ok(report)
}

pub fn users(
    config: &Config,
    client: &dyn FeedClient,
    pacer: &Pacer,
    ids: Vec<String>,
    save: bool,
) -> Result<()> {
    let report = run_targets(config, client, &user_targets(ids), pacer)?;
    finish_ingest(config, report, save)
}

pub fn tray(
    config: &Config,
    client: &dyn FeedClient,
    pacer: &Pacer,
    ingest_all: bool,
    save: bool,
) -> Result<()> {
    let entries = tray_entries(client)?;

    if entries.is_empty() {
        println!("Reel tray is empty.");
        return Ok(());
    }

    println!("{:<24} {}", "Username", "ID");
    println!("{}", "-".repeat(48));
    for entry in &entries {
        println!("{:<24} {}", entry.username, entry.user_id);
    }

    if ingest_all {
        let ids = entries.into_iter().map(|e| e.user_id);
        let report = run_targets(config, client, &user_targets(ids), pacer)?;
        finish_ingest(config, report, save)?;
    }
    Ok(())
}

pub fn location(
    config: &Config,
    client: &dyn FeedClient,
    pacer: &Pacer,
    name: &str,
    save: bool,
) -> Result<()> {
    let mut resolver = PlaceResolver::new();
    let Some(location_id) = resolver.resolve(client, name)? else {
        println!("No location found for '{}'.", name);
        return Ok(());
    };
    println!("{} - {}", name, location_id);

    let report = run_targets(config, client, &[IngestTarget::Location(location_id)], pacer)?;
    finish_ingest(config, report, save)
}
