//! Normalized story records
//!
//! A `Story` is built once by [`normalize::normalize`] and never mutated
//! afterwards: it is read, filtered through the stores and serialized into
//! batch files or single-record snapshots.

pub mod normalize;

pub use normalize::{normalize, NormalizeError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Kind of media carried by a story
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Photo,
    Video,
    /// Any code the platform sends that we don't know how to resolve
    Other(i64),
}

impl MediaType {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => MediaType::Photo,
            2 => MediaType::Video,
            other => MediaType::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "PHOTO",
            MediaType::Video => "VIDEO",
            MediaType::Other(_) => "OTHER",
        }
    }
}

/// A user tagged inside a story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub user_id: String,
    pub nickname: String,
    pub fullname: String,
}

/// A complete geotag; partial geotags never make it into a `Story`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geotag {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub place_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub media_id: String,
    pub user_id: String,
    pub nickname: String,
    pub fullname: String,
    pub media_type: MediaType,
    /// `%Y-%m-%d %H:%M:%S`, UTC
    pub timestamp: String,
    pub url: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub locations: Vec<Geotag>,
    #[serde(default)]
    pub hashtags: BTreeSet<String>,
    #[serde(default)]
    pub ctas: Vec<String>,
}

impl Story {
    /// (author, mentioned user) pairs found in this story, in mention order
    pub fn discovered(&self) -> Vec<(String, String)> {
        self.mentions
            .iter()
            .map(|m| (self.user_id.clone(), m.user_id.clone()))
            .collect()
    }

    /// First complete geotag, if any
    pub fn primary_location(&self) -> Option<&Geotag> {
        self.locations.first()
    }

    /// Write this story as a single self-describing JSON document
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(())
    }

    /// Restore a story from a single-record snapshot
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let story = serde_json::from_str(&content)
            .with_context(|| format!("Invalid snapshot {}", path.display()))?;
        Ok(story)
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | USR ID {} NK {} - FN {} - Type: {}",
            self.media_id,
            self.user_id,
            self.nickname,
            self.fullname,
            self.media_type.as_str()
        )
    }
}

/// Minimal photo story for tests
#[cfg(test)]
pub(crate) fn test_story(media_id: &str, user_id: &str) -> Story {
    Story {
        media_id: media_id.to_string(),
        user_id: user_id.to_string(),
        nickname: format!("nick_{}", user_id),
        fullname: String::new(),
        media_type: MediaType::Photo,
        timestamp: "2021-01-01 00:00:00".to_string(),
        url: String::new(),
        caption: String::new(),
        mentions: vec![],
        locations: vec![],
        hashtags: BTreeSet::new(),
        ctas: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story_with_mentions(mentions: &[&str]) -> Story {
        let mut story = test_story("100", "A");
        story.nickname = "alice".to_string();
        story.fullname = "Alice".to_string();
        story.mentions = mentions
            .iter()
            .map(|id| Mention {
                user_id: id.to_string(),
                nickname: format!("nick_{}", id),
                fullname: String::new(),
            })
            .collect();
        story
    }

    #[test]
    fn test_discovered_pairs_follow_mention_order() {
        let story = story_with_mentions(&["C", "B"]);
        assert_eq!(
            story.discovered(),
            vec![
                ("A".to_string(), "C".to_string()),
                ("A".to_string(), "B".to_string())
            ]
        );
        assert!(story_with_mentions(&[]).discovered().is_empty());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.json");

        let mut story = story_with_mentions(&["C"]);
        story.hashtags.insert("sunset".to_string());
        story.media_type = MediaType::Other(8);
        story.save_json(&path).unwrap();

        let restored = Story::load_json(&path).unwrap();
        assert_eq!(restored, story);
    }

    #[test]
    fn test_snapshot_missing_collections_default_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("story.json");
        std::fs::write(
            &path,
            r#"{"media_id":"1","user_id":"2","nickname":"n","fullname":"f",
                "media_type":"VIDEO","timestamp":"2021-01-01 00:00:00","url":"u"}"#,
        )
        .unwrap();

        let story = Story::load_json(&path).unwrap();
        assert_eq!(story.media_type, MediaType::Video);
        assert!(story.caption.is_empty());
        assert!(story.mentions.is_empty());
        assert!(story.locations.is_empty());
        assert!(story.hashtags.is_empty());
        assert!(story.ctas.is_empty());
    }

    #[test]
    fn test_display_summary() {
        let story = story_with_mentions(&[]);
        assert_eq!(
            story.to_string(),
            "100 | USR ID A NK alice - FN Alice - Type: PHOTO"
        );
    }
}
