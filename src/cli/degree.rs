use anyhow::{bail, Result};

use super::{finish_ingest, print_stories};
use crate::fetch::FeedClient;
use crate::pipeline::Pacer;
use crate::store::{expand_once_with, DegreeStore};
use crate::Config;

/// One discovery degree, optionally seeding the graph first
pub fn run(
    config: &Config,
    client: &dyn FeedClient,
    pacer: &Pacer,
    init: bool,
    seeds: Vec<String>,
    save: bool,
) -> Result<()> {
    let store = DegreeStore::open(&config.degree_db_path())?;

    if init {
        if seeds.is_empty() {
            bail!("--init needs at least one --seed");
        }
        let added = store.seed(seeds.as_slice())?;
        println!("Seeded {} new users ({} given)", added, seeds.len());
    }

    let report = expand_once_with(&store, client, pacer, |stories| {
        print_stories(config, stories)
    })?;
    println!(
        "Expanded {} users: {} mention pairs, {} new edges",
        report.frontier_size, report.discovered_pairs, report.new_edges
    );
    println!(
        "Frontier for the next degree: {} users",
        store.frontier()?.len()
    );

    finish_ingest(config, report.ingest, save)
}
