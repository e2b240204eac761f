//! SQL schema for the clipstat SQLite warehouse.
//!
//! Executed once at connection startup; every statement is idempotent.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Fact: one row per video, updated in place.
CREATE TABLE IF NOT EXISTS fact_video_metrics (
    video_id      TEXT PRIMARY KEY,
    published_at  TEXT NOT NULL,      -- RFC 3339 UTC
    view_count    INTEGER,            -- NULL reads back as 0
    like_count    INTEGER,
    comment_count INTEGER,
    duration      TEXT
);

-- Snapshots are strictly append-only.
CREATE TABLE IF NOT EXISTS fact_video_metrics_history (
    video_id      TEXT NOT NULL,
    snapshot_date TEXT NOT NULL,      -- RFC 3339 UTC, fixed width
    view_count    INTEGER NOT NULL,
    like_count    INTEGER NOT NULL,
    comment_count INTEGER NOT NULL,
    PRIMARY KEY (video_id, snapshot_date)
);

CREATE TABLE IF NOT EXISTS dim_video_info (
    video_id    TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    category    TEXT,
    tags        TEXT NOT NULL DEFAULT '[]'   -- JSON array, order preserved
);

CREATE TABLE IF NOT EXISTS dim_transcripts (
    video_id   TEXT PRIMARY KEY
               REFERENCES fact_video_metrics(video_id) ON DELETE CASCADE,
    transcript TEXT
);

CREATE TABLE IF NOT EXISTS dim_stats (
    video_id   TEXT PRIMARY KEY,
    popularity TEXT NOT NULL   -- 'Popular' | 'Not Popular' | 'Not Rated Yet'
);

CREATE TABLE IF NOT EXISTS dim_sentiment (
    video_id  TEXT PRIMARY KEY,
    sentiment TEXT NOT NULL    -- 'positive' | 'negative'
);

-- Audit rows are never updated; erasure leaves them in place.
CREATE TABLE IF NOT EXISTS audit_logs (
    audit_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     TEXT NOT NULL,
    action      TEXT NOT NULL CHECK (action IN ('INSERT', 'UPDATE', 'DELETE')),
    table_name  TEXT NOT NULL,
    record_id   TEXT NOT NULL,
    old_values  TEXT,              -- JSON payload or NULL
    new_values  TEXT,              -- JSON payload or NULL
    action_time TEXT NOT NULL      -- RFC 3339 UTC; store-assigned
);

CREATE INDEX IF NOT EXISTS history_latest_idx
    ON fact_video_metrics_history(video_id, snapshot_date DESC);
CREATE INDEX IF NOT EXISTS audit_table_idx  ON audit_logs(table_name);
CREATE INDEX IF NOT EXISTS audit_record_idx ON audit_logs(record_id);

PRAGMA user_version = 1;
";
