use anyhow::Result;

use crate::fetch::FeedClient;
use crate::pipeline::Pacer;
use crate::store::{survey, GeoStore, LocationOutcome, LocationTarget};
use crate::Config;

pub fn run(
    config: &Config,
    client: &dyn FeedClient,
    pacer: &Pacer,
    locations: Vec<LocationTarget>,
) -> Result<()> {
    let store = GeoStore::open(&config.geo_db_path())?;
    let report = survey(client, &store, &locations, pacer)?;

    for (location, outcome) in &report.locations {
        match outcome {
            LocationOutcome::Surveyed {
                stories,
                geotagged,
                recorded,
            } => println!(
                "- LOCATION: {} - {} stories, {} geotagged, {} new",
                location.label, stories, geotagged, recorded
            ),
            LocationOutcome::UnexpectedShape { raw } => {
                println!("- LOCATION: {} - skipped: {}", location.label, raw)
            }
        }
    }
    println!(
        "Recorded {} new observations ({} locations skipped)",
        report.recorded,
        report.skipped()
    );
    Ok(())
}
