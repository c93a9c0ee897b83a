//! Two discovery degrees against on-disk stores, reopened between runs the
//! way a scheduler would invoke the binary.

use serde_json::{json, Value};
use std::collections::HashMap;

use storyscout::batch::{read_batch, save_stories};
use storyscout::store::{expand_once, DegreeStore, SeenStore};
use storyscout::{FeedClient, FeedSelector, FetchError, Pacer};

struct ReelClient {
    reels: HashMap<String, Value>,
}

impl ReelClient {
    fn new(reels: &[(&str, Value)]) -> Self {
        Self {
            reels: reels
                .iter()
                .map(|(id, v)| (id.to_string(), v.clone()))
                .collect(),
        }
    }
}

impl FeedClient for ReelClient {
    fn get(&self, selector: &FeedSelector) -> Result<Value, FetchError> {
        match selector {
            FeedSelector::UserReel(id) => Ok(self
                .reels
                .get(id)
                .cloned()
                .unwrap_or_else(|| json!({"items": []}))),
            other => Err(FetchError::Network(format!("unexpected request {:?}", other))),
        }
    }
}

fn reel(user: &str, media_ids: &[&str], mentions: &[&str]) -> Value {
    let mentions: Vec<Value> = mentions
        .iter()
        .map(|m| json!({"user": {"pk": m, "username": format!("user_{}", m)}}))
        .collect();
    let items: Vec<Value> = media_ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "user": {"pk": user, "username": format!("user_{}", user), "full_name": ""},
                "media_type": 2,
                "taken_at": 1609459200,
                "video_versions": [{"url": format!("https://cdn.example/{}.mp4", id)}],
                "reel_mentions": mentions
            })
        })
        .collect();
    json!({ "items": items })
}

#[test]
fn two_degrees_grow_the_frontier_and_dedup_batches() {
    let dir = tempfile::tempdir().unwrap();
    let degree_db = dir.path().join("degree.db");
    let seen_db = dir.path().join("seen.db");
    let out = dir.path().join("batches");

    let client = ReelClient::new(&[
        ("A", reel("A", &["a1"], &["C"])),
        ("C", reel("C", &["c1", "c2"], &["D", "A"])),
    ]);
    let pacer = Pacer::disabled();

    // Degree 1: seeds A and B, A mentions C
    {
        let store = DegreeStore::open(&degree_db).unwrap();
        store.seed(&["A", "B"]).unwrap();
        let report = expand_once(&store, &client, &pacer).unwrap();
        assert_eq!(report.frontier_size, 2);
        assert_eq!(report.new_edges, 1);

        let mut seen = SeenStore::open(&seen_db).unwrap();
        let batch = save_stories(&mut seen, report.ingest.stories, &out).unwrap();
        assert_eq!(batch.saved, 1);
    }

    // Degree 2: fresh process, frontier now includes C
    let store = DegreeStore::open(&degree_db).unwrap();
    let frontier: Vec<String> = store.frontier().unwrap().into_iter().collect();
    assert_eq!(frontier, vec!["A", "B", "C"]);

    let report = expand_once(&store, &client, &pacer).unwrap();
    assert_eq!(report.ingest.processed, 3);
    // A->C again (known), C->D and C->A twice each (c1, c2)
    assert_eq!(report.discovered_pairs, 5);
    assert_eq!(report.new_edges, 2);
    let frontier: Vec<String> = store.frontier().unwrap().into_iter().collect();
    assert_eq!(frontier, vec!["A", "B", "C", "D"]);

    let mut seen = SeenStore::open(&seen_db).unwrap();
    let batch = save_stories(&mut seen, report.ingest.stories, &out).unwrap();
    assert_eq!(batch.saved, 2);
    assert_eq!(batch.skipped, 1);

    let saved: Vec<String> = read_batch(&batch.path)
        .unwrap()
        .into_iter()
        .map(|s| s.media_id)
        .collect();
    assert_eq!(saved, vec!["c1", "c2"]);
    assert_eq!(seen.count().unwrap(), 3);
}
