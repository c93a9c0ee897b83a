pub mod batch;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod store;
pub mod story;

pub use config::Config;
pub use fetch::{FeedClient, FeedSelector, FetchError, HttpFeedClient};
pub use pipeline::{ingest, ingest_with, IngestReport, IngestTarget, Pacer};
pub use store::{DegreeStore, GeoStore, SeenStore};
pub use story::{normalize, Story};
