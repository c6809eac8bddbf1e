//! Persistent query cache backed by a single SQLite file.
//!
//! One table, keyed on `(query, service_type)`, holding the upstream response
//! as an opaque JSON blob. Entries are written once and never updated or
//! deleted; a duplicate insert is a silent no-op (first write wins).

use rusqlite::{Connection, OptionalExtension, params};
use shared::ServiceType;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cached response is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("storage connection poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable lookup / insert-once store for upstream responses.
///
/// Cheap to clone; all clones share one connection. The blocking SQLite calls
/// run under `spawn_blocking` so request tasks never stall the runtime.
#[derive(Clone)]
pub struct CacheStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").field("conn", &"<sqlite>").finish()
    }
}

impl CacheStore {
    /// Open (or create) the cache database and bring its schema up to date.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        configure_connection(&conn)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fetch the stored response for `(query, service)`, if any.
    pub async fn lookup(
        &self,
        query: &str,
        service: ServiceType,
    ) -> Result<Option<serde_json::Value>> {
        let conn = Arc::clone(&self.conn);
        let query = query.to_owned();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let raw: Option<String> = conn
                .query_row(
                    "SELECT response FROM geocache WHERE query = ?1 AND service_type = ?2",
                    params![query, service.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            match raw {
                Some(text) => Ok(Some(serde_json::from_str(&text)?)),
                None => Ok(None),
            }
        })
        .await?
    }

    /// Insert a response for `(query, service)` unless one is already stored.
    ///
    /// Returns `true` if this call created the row, `false` if another write
    /// got there first. Never overwrites an existing entry.
    pub async fn insert_if_absent(
        &self,
        query: &str,
        service: ServiceType,
        response: &serde_json::Value,
    ) -> Result<bool> {
        let conn = Arc::clone(&self.conn);
        let query = query.to_owned();
        let body = response.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            let inserted = conn.execute(
                "INSERT INTO geocache (query, service_type, response) VALUES (?1, ?2, ?3)",
                params![query, service.as_str(), body],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(e) if is_unique_violation(&e) => {
                    debug!("cache entry for ({query}, {service}) already present, keeping first write");
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
        .await?
    }
}

/// WAL plus a busy timeout so concurrent request tasks sharing the file
/// don't trip over each other's writes.
fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5_000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS geocache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            query TEXT NOT NULL,
            service_type TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(query, service_type)
        )",
    )?;

    // Databases written before the suggest endpoint existed have no
    // service_type column; all of their rows are geocode results.
    if !table_has_column(conn, "geocache", "service_type")? {
        info!("migrating cache schema: adding service_type column");
        conn.execute_batch(
            "ALTER TABLE geocache ADD COLUMN service_type TEXT NOT NULL DEFAULT 'geocode'",
        )?;
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_query_service ON geocache(query, service_type)",
    )?;

    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let pragma = format!("PRAGMA table_info({table})");
    let mut stmt = conn.prepare(&pragma)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn open_temp_store() -> (tempfile::TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path().join("geocache.db")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn lookup_on_empty_store_misses() {
        let (_dir, store) = open_temp_store();

        let result = store.lookup("Moscow", ServiceType::Geocode).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_then_lookup_round_trips() {
        let (_dir, store) = open_temp_store();
        let payload = json!({"response": {"found": 3}});

        let created = store
            .insert_if_absent("Moscow", ServiceType::Geocode, &payload)
            .await
            .unwrap();
        assert!(created);

        let hit = store.lookup("Moscow", ServiceType::Geocode).await.unwrap();
        assert_eq!(hit, Some(payload));
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_first_write() {
        let (_dir, store) = open_temp_store();
        let first = json!({"pos": "37.61 55.75"});
        let second = json!({"pos": "0.0 0.0"});

        assert!(store
            .insert_if_absent("Moscow", ServiceType::Geocode, &first)
            .await
            .unwrap());
        assert!(!store
            .insert_if_absent("Moscow", ServiceType::Geocode, &second)
            .await
            .unwrap());

        let hit = store.lookup("Moscow", ServiceType::Geocode).await.unwrap();
        assert_eq!(hit, Some(first));
    }

    #[tokio::test]
    async fn service_types_do_not_shadow_each_other() {
        let (_dir, store) = open_temp_store();
        let geocode = json!({"kind": "geocode"});
        let suggest = json!({"kind": "suggest"});

        store
            .insert_if_absent("Moscow", ServiceType::Geocode, &geocode)
            .await
            .unwrap();

        // Same text, other service: still a miss.
        assert!(store
            .lookup("Moscow", ServiceType::Suggest)
            .await
            .unwrap()
            .is_none());

        store
            .insert_if_absent("Moscow", ServiceType::Suggest, &suggest)
            .await
            .unwrap();

        assert_eq!(
            store.lookup("Moscow", ServiceType::Geocode).await.unwrap(),
            Some(geocode)
        );
        assert_eq!(
            store.lookup("Moscow", ServiceType::Suggest).await.unwrap(),
            Some(suggest)
        );
    }

    #[tokio::test]
    async fn queries_differing_in_case_are_distinct_entries() {
        let (_dir, store) = open_temp_store();

        store
            .insert_if_absent("moscow", ServiceType::Geocode, &json!(1))
            .await
            .unwrap();

        assert!(store
            .lookup("Moscow", ServiceType::Geocode)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn legacy_schema_is_migrated_without_data_loss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geocache.db");

        // Pre-migration layout: no service_type column.
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                r#"CREATE TABLE geocache (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    query TEXT NOT NULL UNIQUE,
                    response TEXT NOT NULL,
                    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
                );
                INSERT INTO geocache (query, response) VALUES ('Moscow', '{"found":true}');"#,
            )
            .unwrap();
        }

        let store = CacheStore::open(&path).unwrap();

        // Old untyped rows are readable as geocode entries.
        let hit = store.lookup("Moscow", ServiceType::Geocode).await.unwrap();
        assert_eq!(hit, Some(json!({"found": true})));
        assert!(store
            .lookup("Moscow", ServiceType::Suggest)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn reopening_an_up_to_date_store_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geocache.db");

        {
            let store = CacheStore::open(&path).unwrap();
            store
                .insert_if_absent("Moscow", ServiceType::Geocode, &json!(1))
                .await
                .unwrap();
        }

        let store = CacheStore::open(&path).unwrap();
        assert_eq!(
            store.lookup("Moscow", ServiceType::Geocode).await.unwrap(),
            Some(json!(1))
        );
    }
}
