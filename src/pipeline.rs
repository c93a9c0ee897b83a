//! Ingestion pipeline
//!
//! Walks a list of targets one at a time, pausing between fetches, and
//! normalizes every story it finds. Results are returned to the caller in an
//! [`IngestReport`]; nothing is kept between calls.

use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PacingConfig;
use crate::fetch::{FeedClient, FeedSelector, FetchError};
use crate::story::{normalize, Story};

/// Randomized pause between consecutive fetches
#[derive(Debug, Clone)]
pub struct Pacer {
    enabled: bool,
    min: Duration,
    max: Duration,
}

impl Pacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            enabled: config.enabled,
            min: Duration::from_millis(config.min_delay_ms),
            max: Duration::from_millis(config.min_delay_ms.max(config.max_delay_ms)),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// The delay the next pause would use, or `None` when pacing is off
    pub fn next_delay(&self) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Some(Duration::from_millis(rand::rng().random_range(min..=max)))
    }

    pub fn pause(&self) {
        if let Some(delay) = self.next_delay() {
            debug!(delay_ms = delay.as_millis() as u64, "pacing");
            std::thread::sleep(delay);
        }
    }
}

/// A story source the pipeline can walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestTarget {
    User(String),
    Location(String),
}

impl IngestTarget {
    pub fn id(&self) -> &str {
        match self {
            IngestTarget::User(id) | IngestTarget::Location(id) => id,
        }
    }

    pub fn selector(&self) -> FeedSelector {
        match self {
            IngestTarget::User(id) => FeedSelector::UserReel(id.clone()),
            IngestTarget::Location(id) => FeedSelector::LocationFeed(id.clone()),
        }
    }

    /// Raw story items in a response, if the response carries any
    pub fn items<'a>(&self, response: &'a Value) -> Option<&'a [Value]> {
        let items = match self {
            IngestTarget::User(_) => response.get("items"),
            IngestTarget::Location(_) => response.get("story").and_then(|s| s.get("items")),
        };
        items
            .and_then(|v| v.as_array())
            .map(|arr| arr.as_slice())
            .filter(|arr| !arr.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TargetStatus {
    /// Number of stories normalized for the target
    Collected(usize),
    /// The target had nothing to offer; not a failure
    Empty,
    /// A location response without a `story` section, kept for the operator
    UnexpectedShape { raw: Value },
}

#[derive(Debug, Clone)]
pub struct TargetOutcome {
    pub target: IngestTarget,
    pub status: TargetStatus,
    /// Items dropped as malformed
    pub malformed: usize,
}

/// Accumulated result of one pipeline pass
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub stories: Vec<Story>,
    pub processed: usize,
    pub malformed: usize,
    pub targets: Vec<TargetOutcome>,
}

impl IngestReport {
    pub fn empty_targets(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::Empty)
            .count()
    }

    pub fn unexpected_targets(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.status, TargetStatus::UnexpectedShape { .. }))
            .count()
    }
}

/// Normalize a batch of raw items, logging and skipping malformed ones
pub fn normalize_items(items: &[Value]) -> (Vec<Story>, usize) {
    let mut stories = Vec::with_capacity(items.len());
    let mut malformed = 0;

    for (idx, item) in items.iter().enumerate() {
        match normalize(item) {
            Ok(story) => {
                debug!(story = %story, "normalized");
                stories.push(story);
            }
            Err(e) => {
                malformed += 1;
                warn!(index = idx, error = %e, "skipping malformed story");
            }
        }
    }

    (stories, malformed)
}

/// Fetch and normalize the stories of every target, in order.
///
/// Empty targets and malformed items are recorded and skipped. A transport
/// failure aborts the pass and is returned to the caller.
pub fn ingest(
    client: &dyn FeedClient,
    targets: &[IngestTarget],
    pacer: &Pacer,
) -> Result<IngestReport, FetchError> {
    ingest_with(client, targets, pacer, |_, _| Ok::<_, FetchError>(()))
}

/// Like [`ingest`], handing each target's stories to `on_target` as soon as
/// they are normalized. Work done by `on_target` for earlier targets stays
/// done when a later fetch fails.
pub fn ingest_with<E, F>(
    client: &dyn FeedClient,
    targets: &[IngestTarget],
    pacer: &Pacer,
    mut on_target: F,
) -> Result<IngestReport, E>
where
    E: From<FetchError>,
    F: FnMut(&IngestTarget, &[Story]) -> Result<(), E>,
{
    let mut report = IngestReport::default();
    let total = targets.len();

    for (idx, target) in targets.iter().enumerate() {
        pacer.pause();

        let response = client.get(&target.selector())?;

        let items = match target {
            IngestTarget::Location(_) if response.get("story").is_none() => {
                warn!(
                    target_id = target.id(),
                    response = %response,
                    "location response has no story section, skipping"
                );
                report.targets.push(TargetOutcome {
                    target: target.clone(),
                    status: TargetStatus::UnexpectedShape { raw: response },
                    malformed: 0,
                });
                continue;
            }
            _ => target.items(&response),
        };

        let Some(items) = items else {
            info!(target_id = target.id(), "empty stories for target");
            report.targets.push(TargetOutcome {
                target: target.clone(),
                status: TargetStatus::Empty,
                malformed: 0,
            });
            continue;
        };

        let username = items
            .first()
            .and_then(|i| i.get("user"))
            .and_then(|u| u.get("username"))
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        info!(
            progress = %format!("{}/{}", idx + 1, total),
            target_id = target.id(),
            username,
            items = items.len(),
            "processing target"
        );

        let (stories, malformed) = normalize_items(items);
        on_target(target, &stories)?;

        report.processed += stories.len();
        report.malformed += malformed;
        report.targets.push(TargetOutcome {
            target: target.clone(),
            status: TargetStatus::Collected(stories.len()),
            malformed,
        });
        report.stories.extend(stories);
    }

    info!(
        targets = total,
        stories = report.processed,
        malformed = report.malformed,
        "finished processing targets"
    );
    Ok(report)
}

/// Shorthand for a list of user ids
pub fn user_targets<I, S>(ids: I) -> Vec<IngestTarget>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter().map(|id| IngestTarget::User(id.into())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticClient;
    use serde_json::json;

    fn raw_story(media_id: &str, user: &str) -> Value {
        json!({
            "id": media_id,
            "user": {"pk": user, "username": format!("nick_{}", user), "full_name": ""},
            "media_type": 1,
            "taken_at": 1609459200,
            "image_versions2": {"candidates": [{"url": "https://cdn.example/x.jpg"}]}
        })
    }

    #[test]
    fn test_empty_target_is_not_an_error() {
        let client = StaticClient::new().with(
            FeedSelector::UserReel("u1".to_string()),
            json!({"items": [], "status": "ok"}),
        );

        let report = ingest(&client, &user_targets(["u1"]), &Pacer::disabled()).unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.stories.is_empty());
        assert_eq!(report.targets.len(), 1);
        assert_eq!(report.targets[0].status, TargetStatus::Empty);
        assert_eq!(report.empty_targets(), 1);
    }

    #[test]
    fn test_accumulates_across_targets_in_order() {
        let client = StaticClient::new()
            .with(
                FeedSelector::UserReel("a".to_string()),
                json!({"items": [raw_story("1", "a"), raw_story("2", "a")]}),
            )
            .with(
                FeedSelector::UserReel("b".to_string()),
                json!({"items": [raw_story("3", "b")]}),
            );

        let report = ingest(
            &client,
            &user_targets(["a", "missing", "b"]),
            &Pacer::disabled(),
        )
        .unwrap();

        let ids: Vec<_> = report.stories.iter().map(|s| s.media_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(report.processed, 3);
        assert_eq!(report.targets[0].status, TargetStatus::Collected(2));
        assert_eq!(report.targets[1].status, TargetStatus::Empty);
        assert_eq!(report.targets[2].status, TargetStatus::Collected(1));
    }

    #[test]
    fn test_malformed_item_does_not_abort_target() {
        let client = StaticClient::new().with(
            FeedSelector::UserReel("a".to_string()),
            json!({"items": [raw_story("1", "a"), {"id": "broken"}, raw_story("2", "a")]}),
        );

        let report = ingest(&client, &user_targets(["a"]), &Pacer::disabled()).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.malformed, 1);
        assert_eq!(report.targets[0].malformed, 1);
    }

    #[test]
    fn test_transport_failure_propagates() {
        let client = StaticClient::new()
            .failing(FeedSelector::UserReel("a".to_string()), "connection reset");

        let err = ingest(&client, &user_targets(["a", "b"]), &Pacer::disabled()).unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));
        assert_eq!(client.call_count(&FeedSelector::UserReel("b".to_string())), 0);
    }

    #[test]
    fn test_location_target_reads_story_items() {
        let client = StaticClient::new().with(
            FeedSelector::LocationFeed("99".to_string()),
            json!({"story": {"items": [raw_story("5", "z")]}}),
        );

        let report = ingest(
            &client,
            &[IngestTarget::Location("99".to_string())],
            &Pacer::disabled(),
        )
        .unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.stories[0].media_id, "5");
    }

    #[test]
    fn test_location_without_story_section_keeps_raw_response() {
        let client = StaticClient::new()
            .with(
                FeedSelector::LocationFeed("9".to_string()),
                json!({"error": "rate limited"}),
            )
            .with(
                FeedSelector::LocationFeed("10".to_string()),
                json!({"story": {"items": []}}),
            );

        let report = ingest(
            &client,
            &[
                IngestTarget::Location("9".to_string()),
                IngestTarget::Location("10".to_string()),
            ],
            &Pacer::disabled(),
        )
        .unwrap();

        assert_eq!(
            report.targets[0].status,
            TargetStatus::UnexpectedShape {
                raw: json!({"error": "rate limited"})
            }
        );
        assert_eq!(report.targets[1].status, TargetStatus::Empty);
        assert_eq!(report.unexpected_targets(), 1);
        assert_eq!(report.empty_targets(), 1);
    }

    #[test]
    fn test_on_target_sees_each_target_before_a_later_failure() {
        let client = StaticClient::new()
            .with(
                FeedSelector::UserReel("a".to_string()),
                json!({"items": [raw_story("1", "a")]}),
            )
            .failing(FeedSelector::UserReel("b".to_string()), "connection reset");

        let mut handled = Vec::new();
        let err = ingest_with(&client, &user_targets(["a", "b"]), &Pacer::disabled(), |t, s| {
            handled.push((t.id().to_string(), s.len()));
            Ok::<_, FetchError>(())
        })
        .unwrap_err();

        assert!(matches!(err, FetchError::Network(_)));
        assert_eq!(handled, vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_pacer_delay_within_bounds() {
        let pacer = Pacer::new(&PacingConfig {
            enabled: true,
            min_delay_ms: 800,
            max_delay_ms: 1700,
        });
        for _ in 0..50 {
            let delay = pacer.next_delay().unwrap();
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1700));
        }
        assert_eq!(Pacer::disabled().next_delay(), None);
    }
}
