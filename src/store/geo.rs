//! Geo-attribution: who was seen where, and when

use anyhow::{bail, Result};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use super::{open_connection, GEO_SCHEMA};
use crate::fetch::{FeedClient, FeedSelector};
use crate::pipeline::{normalize_items, Pacer};
use crate::story::Story;

/// A location to survey: platform id plus an operator-chosen label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationTarget {
    pub id: String,
    pub label: String,
}

impl FromStr for LocationTarget {
    type Err = anyhow::Error;

    /// `ID:LABEL`, or a bare `ID` labelled with itself
    fn from_str(s: &str) -> Result<Self> {
        let (id, label) = s.split_once(':').unwrap_or((s, s));
        if id.trim().is_empty() {
            bail!("empty location id in '{}'", s);
        }
        Ok(Self {
            id: id.trim().to_string(),
            label: label.trim().to_string(),
        })
    }
}

/// One user observed at a geotagged place
#[derive(Debug, Clone, PartialEq)]
pub struct GeoObservation {
    pub timestamp: String,
    pub place_name: String,
    pub lat: f64,
    pub lng: f64,
    pub user_id: String,
    pub nickname: String,
    pub fullname: String,
    pub place_id: String,
    pub place_label: String,
}

impl GeoObservation {
    /// Built from the story's first complete geotag only
    pub fn from_story(story: &Story, place_label: &str) -> Option<Self> {
        let geotag = story.primary_location()?;
        Some(Self {
            timestamp: story.timestamp.clone(),
            place_name: geotag.name.clone(),
            lat: geotag.lat,
            lng: geotag.lng,
            user_id: story.user_id.clone(),
            nickname: story.nickname.clone(),
            fullname: story.fullname.clone(),
            place_id: geotag.place_id.clone(),
            place_label: place_label.to_string(),
        })
    }
}

pub struct GeoStore {
    conn: Connection,
}

impl GeoStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path, GEO_SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        let conn = super::open_in_memory(GEO_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Record an observation; the first write for a (timestamp, user) wins.
    pub fn record(&self, obs: &GeoObservation) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO users
             (timestamp, placename, lat, lng, user_id, nickname, fullname, city_id, city_name)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                obs.timestamp,
                obs.place_name,
                obs.lat,
                obs.lng,
                obs.user_id,
                obs.nickname,
                obs.fullname,
                obs.place_id,
                obs.place_label,
            ],
        )?;
        Ok(inserted == 1)
    }

    pub fn observations(&self) -> Result<Vec<GeoObservation>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT timestamp, placename, lat, lng, user_id, nickname, fullname,
                      city_id, city_name
               FROM users
               ORDER BY timestamp, user_id"#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(GeoObservation {
                timestamp: row.get(0)?,
                place_name: row.get(1)?,
                lat: row.get(2)?,
                lng: row.get(3)?,
                user_id: row.get(4)?,
                nickname: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                fullname: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                place_id: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
                place_label: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[derive(Debug, Clone)]
pub enum LocationOutcome {
    Surveyed {
        stories: usize,
        geotagged: usize,
        recorded: usize,
    },
    /// The response had no `story` section; kept for the operator
    UnexpectedShape { raw: Value },
}

#[derive(Debug, Default)]
pub struct GeoReport {
    pub locations: Vec<(LocationTarget, LocationOutcome)>,
    pub recorded: usize,
}

impl GeoReport {
    pub fn skipped(&self) -> usize {
        self.locations
            .iter()
            .filter(|(_, o)| matches!(o, LocationOutcome::UnexpectedShape { .. }))
            .count()
    }
}

/// Fetch each location's stories and record the geotagged authors.
pub fn survey(
    client: &dyn FeedClient,
    store: &GeoStore,
    locations: &[LocationTarget],
    pacer: &Pacer,
) -> Result<GeoReport> {
    let mut report = GeoReport::default();

    for location in locations {
        pacer.pause();
        info!(location = %location.label, id = %location.id, "surveying location");

        let response = client.get(&FeedSelector::LocationFeed(location.id.clone()))?;

        if response.get("story").is_none() {
            warn!(
                location = %location.label,
                response = %response,
                "location response has no story section, skipping"
            );
            report.locations.push((
                location.clone(),
                LocationOutcome::UnexpectedShape { raw: response },
            ));
            continue;
        }

        let items = response["story"]
            .get("items")
            .and_then(|v| v.as_array())
            .map(|arr| arr.as_slice())
            .unwrap_or_default();
        let (stories, _) = normalize_items(items);

        let mut geotagged = 0;
        let mut recorded = 0;
        for obs in stories
            .iter()
            .filter_map(|s| GeoObservation::from_story(s, &location.label))
        {
            geotagged += 1;
            info!(
                time = %obs.timestamp,
                place = %obs.place_name,
                lat = obs.lat,
                lng = obs.lng,
                user_id = %obs.user_id,
                nickname = %obs.nickname,
                "geotagged story"
            );
            if store.record(&obs)? {
                recorded += 1;
            }
        }

        report.recorded += recorded;
        report.locations.push((
            location.clone(),
            LocationOutcome::Surveyed {
                stories: stories.len(),
                geotagged,
                recorded,
            },
        ));
    }

    Ok(report)
}
