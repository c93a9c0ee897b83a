//! Feed client seam
//!
//! The crawl core only ever asks for JSON documents through [`FeedClient`].
//! Transport, sessions and cookies live behind the trait; the HTTP
//! implementation is in [`http`].

mod http;

pub use http::HttpFeedClient;

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::story::normalize::id_string;

/// What to fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FeedSelector {
    /// Active stories of a user
    UserReel(String),
    /// Feed of a location (stories live under `story.items`)
    LocationFeed(String),
    /// Reel tray of the authenticated account
    ReelsTray,
    /// Place search by free-text name
    PlaceSearch(String),
    /// Profile info of a user
    UserInfo(String),
}

impl FeedSelector {
    /// Endpoint path relative to the API base url
    pub fn path(&self) -> String {
        match self {
            FeedSelector::UserReel(id) => format!("feed/user/{}/reel_media/", id),
            FeedSelector::LocationFeed(id) => format!("feed/location/{}/", id),
            FeedSelector::ReelsTray => "feed/reels_tray/".to_string(),
            FeedSelector::PlaceSearch(_) => "fbsearch/places/".to_string(),
            FeedSelector::UserInfo(id) => format!("users/{}/info/", id),
        }
    }

    /// Query string parameters, if the endpoint takes any
    pub fn query(&self) -> Option<(&'static str, &str)> {
        match self {
            FeedSelector::PlaceSearch(query) => Some(("query", query.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Response decode error: {0}")]
    Decode(String),
}

/// Retrieves raw JSON documents for a selector
pub trait FeedClient {
    fn get(&self, selector: &FeedSelector) -> Result<Value, FetchError>;
}

/// One followed account from the reel tray
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayEntry {
    pub user_id: String,
    pub username: String,
}

/// Followed account ids from the reel tray, in tray order
pub fn tray_entries(client: &dyn FeedClient) -> Result<Vec<TrayEntry>, FetchError> {
    let tray = client.get(&FeedSelector::ReelsTray)?;

    let entries: Vec<TrayEntry> = tray
        .get("tray")
        .and_then(|t| t.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|element| {
                    Some(TrayEntry {
                        user_id: id_string(element.get("id")?)?,
                        username: element.get("user")?.get("username")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(entries)
}

/// Public profile numbers of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub username: String,
    pub full_name: String,
    pub follower_count: i64,
    pub following_count: i64,
}

pub fn user_profile(
    client: &dyn FeedClient,
    user_id: &str,
) -> Result<Option<UserProfile>, FetchError> {
    let info = client.get(&FeedSelector::UserInfo(user_id.to_string()))?;

    let profile = info.get("user").and_then(|user| {
        Some(UserProfile {
            username: user.get("username")?.as_str()?.to_string(),
            full_name: user
                .get("full_name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            follower_count: user.get("follower_count").and_then(|v| v.as_i64()).unwrap_or(0),
            following_count: user.get("following_count").and_then(|v| v.as_i64()).unwrap_or(0),
        })
    });

    if profile.is_none() {
        warn!(user_id, response = %info, "no user section in profile response");
    }
    Ok(profile)
}

/// Place name -> location id, memoized for the resolver's lifetime
#[derive(Debug, Default)]
pub struct PlaceResolver {
    cache: HashMap<String, String>,
}

impl PlaceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best candidate (first search hit) for a place name
    pub fn resolve(
        &mut self,
        client: &dyn FeedClient,
        name: &str,
    ) -> Result<Option<String>, FetchError> {
        if let Some(id) = self.cache.get(name) {
            return Ok(Some(id.clone()));
        }

        let results = client.get(&FeedSelector::PlaceSearch(name.to_string()))?;
        let place_id = results
            .get("items")
            .and_then(|items| items.as_array())
            .and_then(|items| items.first())
            .and_then(|item| item.get("location"))
            .and_then(|loc| loc.get("pk"))
            .and_then(id_string);

        match place_id {
            Some(id) => {
                info!(place = name, location_id = %id, "resolved place");
                self.cache.insert(name.to_string(), id.clone());
                Ok(Some(id))
            }
            None => {
                warn!(place = name, "place search returned no candidates");
                Ok(None)
            }
        }
    }
}
