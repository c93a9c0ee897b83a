//! Raw story payload -> `Story`
//!
//! Required fields: `id`, `user.pk`, `user.username`, `media_type`,
//! `taken_at`. Every other section is extracted independently and falls back
//! to an empty value, so one odd section never costs us the whole record.

use chrono::DateTime;
use serde_json::Value;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::debug;

use super::{Geotag, MediaType, Mention, Story};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("malformed record: missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("malformed record: taken_at {0} is out of range")]
    InvalidTimestamp(i64),
}

/// Convert one raw story payload into a `Story`
pub fn normalize(raw: &Value) -> Result<Story, NormalizeError> {
    let media_id = raw.get("id").and_then(id_string).ok_or(missing("id"))?;

    let user = raw.get("user");
    let user_id = user
        .and_then(|u| u.get("pk"))
        .and_then(id_string)
        .ok_or(missing("user.pk"))?;
    let nickname = user
        .and_then(|u| u.get("username"))
        .and_then(|v| v.as_str())
        .ok_or(missing("user.username"))?
        .to_string();
    let fullname = user
        .and_then(|u| u.get("full_name"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let media_type = raw
        .get("media_type")
        .and_then(|v| v.as_i64())
        .map(MediaType::from_code)
        .ok_or(missing("media_type"))?;

    let taken_at = raw
        .get("taken_at")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .ok_or(missing("taken_at"))?;
    let timestamp = DateTime::from_timestamp(taken_at, 0)
        .ok_or(NormalizeError::InvalidTimestamp(taken_at))?
        .format(TIMESTAMP_FORMAT)
        .to_string();

    Ok(Story {
        url: media_url(raw, media_type),
        caption: caption(raw),
        mentions: mentions(raw),
        locations: locations(raw),
        hashtags: hashtags(raw),
        ctas: ctas(raw),
        media_id,
        user_id,
        nickname,
        fullname,
        media_type,
        timestamp,
    })
}

fn missing(field: &'static str) -> NormalizeError {
    NormalizeError::MissingField { field }
}

/// Platform ids show up both as JSON strings and as numbers
pub(crate) fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn media_url(raw: &Value, media_type: MediaType) -> String {
    let candidates = match media_type {
        MediaType::Video => raw.get("video_versions"),
        MediaType::Photo => raw
            .get("image_versions2")
            .and_then(|v| v.get("candidates")),
        MediaType::Other(code) => {
            debug!(code, "unrecognized media type, leaving url empty");
            None
        }
    };

    candidates
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|first| first.get("url"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn caption(raw: &Value) -> String {
    raw.get("caption")
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string()
}

fn mentions(raw: &Value) -> Vec<Mention> {
    section(raw, "reel_mentions")
        .iter()
        .filter_map(|entry| {
            let parsed = mention(entry);
            if parsed.is_none() {
                debug!(mention = %entry, "skipping incomplete mention");
            }
            parsed
        })
        .collect()
}

fn mention(entry: &Value) -> Option<Mention> {
    let user = entry.get("user")?;
    Some(Mention {
        user_id: user.get("pk").and_then(id_string)?,
        nickname: user.get("username")?.as_str()?.to_string(),
        fullname: user
            .get("full_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
    })
}

fn locations(raw: &Value) -> Vec<Geotag> {
    section(raw, "story_locations")
        .iter()
        .filter_map(|entry| {
            let loc = entry.get("location")?;
            let geotag = Geotag {
                name: loc.get("name")?.as_str()?.to_string(),
                lat: loc.get("lat")?.as_f64()?,
                lng: loc.get("lng")?.as_f64()?,
                place_id: loc.get("pk").and_then(id_string)?,
            };
            Some(geotag)
        })
        .collect()
}

fn hashtags(raw: &Value) -> BTreeSet<String> {
    section(raw, "story_hashtags")
        .iter()
        .filter_map(|h| h.get("hashtag")?.get("name")?.as_str().map(String::from))
        .collect()
}

fn ctas(raw: &Value) -> Vec<String> {
    section(raw, "story_cta")
        .iter()
        .filter_map(|cta| cta.get("links")?.as_array())
        .flatten()
        .filter_map(|link| link.get("webUri")?.as_str().map(String::from))
        .collect()
}

/// An optional array section; absent, null or non-array all read as empty
fn section<'a>(raw: &'a Value, key: &str) -> &'a [Value] {
    raw.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| arr.as_slice())
        .unwrap_or_default()
}
