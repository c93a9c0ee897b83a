//! Durable crawl state in SQLite
//!
//! Three independent stores, each owning its own connection:
//! - [`SeenStore`]: media ids already saved to a batch file
//! - [`DegreeStore`]: the discovery graph driving user expansion
//! - [`GeoStore`]: users observed at geotagged locations
//!
//! Tables are created on open and only ever grow.

mod degree;
mod geo;
mod schema;
mod seen;

pub use degree::{expand_once, expand_once_with, DegreeStore, DiscoveryEdge, ExpansionReport};
pub use geo::{survey, GeoObservation, GeoReport, GeoStore, LocationOutcome, LocationTarget};
pub use schema::{DEGREE_SCHEMA, GEO_SCHEMA, SEEN_SCHEMA};
pub use seen::{FilterOutcome, SeenStore};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

/// Open (or create) a database file and make sure `schema` exists
pub(crate) fn open_connection(path: &Path, schema: &str) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch(schema)?;

    debug!(path = %path.display(), "database opened");
    Ok(conn)
}

/// In-memory connection, used by tests
#[cfg(test)]
pub(crate) fn open_in_memory(schema: &str) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(schema)?;
    Ok(conn)
}
