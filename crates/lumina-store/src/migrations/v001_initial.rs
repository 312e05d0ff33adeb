//! v001 -- Initial schema creation.
//!
//! One table per collection. Both share the same columns; list-valued and
//! open-ended fields are stored as JSON text.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Artists
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS artists (
    seq               INTEGER PRIMARY KEY AUTOINCREMENT,
    id                TEXT NOT NULL UNIQUE,
    legacy_id         TEXT,
    user_id           TEXT,                    -- owning actor
    owner_email       TEXT,
    name              TEXT NOT NULL DEFAULT '',
    genres            TEXT,                    -- JSON array
    predominant_genre TEXT,
    city              TEXT,
    country           TEXT,
    address           TEXT,
    capacity          INTEGER,
    members           INTEGER,
    lat               REAL,
    lng               REAL,
    contact_email     TEXT,
    contact_phone     TEXT,
    hide_phone        INTEGER NOT NULL DEFAULT 0,
    links             TEXT,                    -- JSON object
    photo             TEXT,                    -- data URL
    bio               TEXT,
    venues_played     TEXT,                    -- JSON array of venue ids
    extra             TEXT,                    -- JSON object
    created_at        TEXT NOT NULL,           -- RFC-3339
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_artists_user_id ON artists(user_id);

-- ----------------------------------------------------------------
-- Venues
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS venues (
    seq               INTEGER PRIMARY KEY AUTOINCREMENT,
    id                TEXT NOT NULL UNIQUE,
    legacy_id         TEXT,
    user_id           TEXT,
    owner_email       TEXT,
    name              TEXT NOT NULL DEFAULT '',
    genres            TEXT,
    predominant_genre TEXT,
    city              TEXT,
    country           TEXT,
    address           TEXT,
    capacity          INTEGER,
    members           INTEGER,
    lat               REAL,
    lng               REAL,
    contact_email     TEXT,
    contact_phone     TEXT,
    hide_phone        INTEGER NOT NULL DEFAULT 0,
    links             TEXT,
    photo             TEXT,
    bio               TEXT,
    venues_played     TEXT,
    extra             TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_venues_user_id ON venues(user_id);
"#;

/// Apply the initial schema.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
