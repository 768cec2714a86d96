//! SQL schema for the freebie ledger.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision; future migrations will be gated on that number.

pub const SCHEMA_VERSION: i64 = 1;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS destinations (
    destination_id INTEGER PRIMARY KEY,
    channel_id     INTEGER NOT NULL
);

-- One row per item already delivered to a destination.
-- Rows are inserted with INSERT OR IGNORE and never updated.
CREATE TABLE IF NOT EXISTS delivery_records (
    destination_id INTEGER NOT NULL
                   REFERENCES destinations(destination_id) ON DELETE CASCADE,
    item_id        TEXT    NOT NULL,
    delivered_at   TEXT    NOT NULL,   -- RFC 3339 UTC
    PRIMARY KEY (destination_id, item_id)
);

CREATE TABLE IF NOT EXISTS process_state (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

PRAGMA user_version = 1;
";
