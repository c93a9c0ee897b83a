//! Dedup store: which media ids have already been saved

use anyhow::Result;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

use super::{open_connection, SEEN_SCHEMA};
use crate::story::Story;

/// Result of partitioning a batch against the store
#[derive(Debug, Default)]
pub struct FilterOutcome {
    /// Stories not seen before, now marked seen
    pub kept: Vec<Story>,
    /// How many stories were already known
    pub skipped: usize,
}

pub struct SeenStore {
    conn: Connection,
}

impl SeenStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_connection(path, SEEN_SCHEMA)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        let conn = super::open_in_memory(SEEN_SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn has_seen(&self, media_id: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM seen WHERE media_id = ?)",
            params![media_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Mark a media id as seen. Returns false if it already was.
    pub fn mark_seen(&self, media_id: &str) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO seen (media_id) VALUES (?)",
            params![media_id],
        )?;
        Ok(inserted == 1)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM seen", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Keep the stories whose media id is new, marking them seen.
    pub fn filter_unseen(&mut self, stories: Vec<Story>) -> Result<FilterOutcome> {
        let (outcome, ()) = self.filter_unseen_then(stories, |_| Ok(()))?;
        Ok(outcome)
    }

    /// Like [`filter_unseen`](Self::filter_unseen), but hands the kept
    /// stories to `sink` before committing. If `sink` fails nothing is
    /// marked seen, so a failed save is retried on the next run.
    pub fn filter_unseen_then<T, F>(
        &mut self,
        stories: Vec<Story>,
        sink: F,
    ) -> Result<(FilterOutcome, T)>
    where
        F: FnOnce(&[Story]) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let mut outcome = FilterOutcome::default();

        for story in stories {
            // The primary key decides: a duplicate insert changes nothing
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO seen (media_id) VALUES (?)",
                params![story.media_id],
            )?;
            if inserted == 1 {
                outcome.kept.push(story);
            } else {
                debug!(media_id = %story.media_id, "already seen");
                outcome.skipped += 1;
            }
        }

        let value = sink(&outcome.kept)?;
        tx.commit()?;
        Ok((outcome, value))
    }
}
