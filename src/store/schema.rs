//! Store DDL and the `schema_meta` key/value table.
//!
//! Collections and records live in ordinary tables; each collection gets its
//! own vec0 table `collection_vec_<id>` keyed by `records.id`.

use rusqlite::{params, Connection, OptionalExtension};

pub const SCHEMA_VERSION: u32 = 1;
pub const SCHEMA_VERSION_KEY: &str = "schema_version";
pub const EMBEDDING_MODEL_KEY: &str = "embedding_model";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    dimensions INTEGER NOT NULL CHECK(dimensions > 0),
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY,
    collection_id INTEGER NOT NULL REFERENCES collections(id),
    record_id TEXT NOT NULL,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(collection_id, record_id)
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Create the base tables. Idempotent.
///
/// On an initialized store nothing is written, so opening for a read never
/// takes the write lock.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    if get_meta(conn, SCHEMA_VERSION_KEY)?.is_none() {
        conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES (?1, ?2)",
            params![SCHEMA_VERSION_KEY, SCHEMA_VERSION.to_string()],
        )?;
    }
    Ok(())
}

pub(crate) fn vec_table_name(collection_id: i64) -> String {
    format!("collection_vec_{collection_id}")
}

/// Create the vec0 table for one collection. Idempotent.
pub fn create_vec_table(conn: &Connection, collection_id: i64, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS {} USING vec0(embedding FLOAT[{dimensions}]);",
        vec_table_name(collection_id)
    ))
}

pub fn get_meta(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_meta (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}
