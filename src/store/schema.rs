//! SQLite schemas
//!
//! Each table may live in its own database file or share one; nothing links
//! them. All statements are idempotent and run on every open.

/// Media ids already written to a batch file
pub const SEEN_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS seen (
    media_id TEXT PRIMARY KEY
);
"#;

/// Discovery graph edges. Seeds are stored with a NULL `refered`.
pub const DEGREE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS degree (
    source TEXT NOT NULL,
    refered TEXT,
    PRIMARY KEY (source, refered)
);
"#;

/// Users observed at geotagged locations, once per (timestamp, user)
pub const GEO_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    timestamp TEXT NOT NULL,
    placename TEXT NOT NULL,
    lat REAL NOT NULL,
    lng REAL NOT NULL,
    user_id TEXT NOT NULL,
    nickname TEXT,
    fullname TEXT,
    city_id TEXT,               -- place id of the geotag
    city_name TEXT,             -- label of the surveyed location
    PRIMARY KEY (timestamp, user_id)
);
"#;
