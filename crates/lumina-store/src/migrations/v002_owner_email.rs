//! v002 -- Case-insensitive owner email lookups.
//!
//! Records created before sign-in ids existed are matched by email only.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_artists_owner_email ON artists(lower(owner_email));
CREATE INDEX IF NOT EXISTS idx_venues_owner_email ON venues(lower(owner_email));
"#;

pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
