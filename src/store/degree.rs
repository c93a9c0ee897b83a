//! Discovery graph ("degrees of separation")
//!
//! Rows are (source, refered) edges. Seeds are roots with a NULL `refered`.
//! Every user appearing on either side of an edge is part of the frontier,
//! and one call to [`expand_once`] walks the whole frontier a single time.
//! Running further degrees is left to whoever schedules us.

use anyhow::Result;
use rusqlite::{params, Connection};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

use super::{open_connection, DEGREE_SCHEMA};
use crate::fetch::FeedClient;
use crate::pipeline::{ingest_with, user_targets, IngestReport, Pacer};
use crate::story::Story;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEdge {
    pub source: String,
    /// `None` for seed rows
    pub discovered: Option<String>,
}

pub struct DegreeStore {
    conn: Connection,
}

impl DegreeStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path, DEGREE_SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        let conn = super::open_in_memory(DEGREE_SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert seed rows. Returns how many seeds were new.
    pub fn seed<S: AsRef<str>>(&self, seeds: &[S]) -> Result<usize> {
        let mut added = 0;
        for seed in seeds {
            // NULLs never collide in a primary key, so check explicitly
            added += self.conn.execute(
                "INSERT INTO degree (source, refered)
                 SELECT ?1, NULL
                 WHERE NOT EXISTS (SELECT 1 FROM degree WHERE source = ?1 AND refered IS NULL)",
                params![seed.as_ref()],
            )?;
        }
        info!(seeds = seeds.len(), added, "seeded discovery graph");
        Ok(added)
    }

    /// Insert a discovered edge. Returns false if it was already known.
    pub fn add_edge(&self, source: &str, discovered: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO degree (source, refered) VALUES (?, ?)",
            params![source, discovered],
        )?;
        Ok(inserted == 1)
    }

    pub fn edges(&self) -> Result<Vec<DiscoveryEdge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT source, refered FROM degree ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(DiscoveryEdge {
                source: row.get(0)?,
                discovered: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every known user: sources and discovered users, seeds included
    pub fn frontier(&self) -> Result<BTreeSet<String>> {
        let mut frontier = BTreeSet::new();
        for edge in self.edges()? {
            frontier.insert(edge.source);
            if let Some(discovered) = edge.discovered {
                frontier.insert(discovered);
            }
        }
        Ok(frontier)
    }
}

/// Result of one expansion degree
#[derive(Debug, Default)]
pub struct ExpansionReport {
    pub frontier_size: usize,
    pub ingest: IngestReport,
    /// Mention pairs found in the ingested stories
    pub discovered_pairs: usize,
    /// Pairs that were not in the graph yet
    pub new_edges: usize,
}

/// Walk the current frontier once and record every mention as an edge.
///
/// Edges are committed as soon as each user's stories are normalized; a
/// failed fetch later in the walk keeps the edges already written.
pub fn expand_once(
    store: &DegreeStore,
    client: &dyn FeedClient,
    pacer: &Pacer,
) -> Result<ExpansionReport> {
    expand_once_with(store, client, pacer, |_| {})
}

/// Like [`expand_once`], handing every batch of stories to `observe` as it
/// is ingested.
pub fn expand_once_with<F>(
    store: &DegreeStore,
    client: &dyn FeedClient,
    pacer: &Pacer,
    mut observe: F,
) -> Result<ExpansionReport>
where
    F: FnMut(&[Story]),
{
    let frontier = store.frontier()?;
    info!(frontier = frontier.len(), "expanding discovery graph");

    let mut discovered_pairs = 0;
    let mut new_edges = 0;
    let ingested = ingest_with(
        client,
        &user_targets(frontier.iter().cloned()),
        pacer,
        |_, stories| -> Result<()> {
            observe(stories);
            for story in stories {
                for (source, discovered) in story.discovered() {
                    discovered_pairs += 1;
                    if store.add_edge(&source, &discovered)? {
                        debug!(source = %source, discovered = %discovered, "new edge");
                        new_edges += 1;
                    }
                }
            }
            Ok(())
        },
    )?;

    info!(
        stories = ingested.processed,
        pairs = discovered_pairs,
        new_edges,
        "expansion complete"
    );
    Ok(ExpansionReport {
        frontier_size: frontier.len(),
        ingest: ingested,
        discovered_pairs,
        new_edges,
    })
}
