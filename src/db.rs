// 💾 SQLite Cache Store - registry lookups that outlive the process
//
// Same get/put contract as MemoryCache, backed by one table keyed by
// (namespace, key) with JSON values. Lets a caller keep identifier,
// profile and holder caches across runs instead of re-querying the
// registry.

use crate::cache::{LookupCache, ProviderCaches};
use crate::entities::{EntityProfile, HolderRow};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS lookup_cache (
            namespace TEXT NOT NULL,
            cache_key TEXT NOT NULL,
            value TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (namespace, cache_key)
        )",
        [],
    )?;

    Ok(())
}

/// Open (or create) a cache database and return the three provider caches
/// backed by it.
pub fn open_provider_caches(path: &Path) -> Result<ProviderCaches> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open cache database: {:?}", path))?;
    setup_database(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    Ok(ProviderCaches::new(
        Arc::new(SqliteCache::<Option<String>>::new(Arc::clone(&conn), "identifiers")),
        Arc::new(SqliteCache::<Option<EntityProfile>>::new(Arc::clone(&conn), "profiles")),
        Arc::new(SqliteCache::<Vec<HolderRow>>::new(conn, "holders")),
    ))
}

pub struct SqliteCache<V> {
    conn: Arc<Mutex<Connection>>,
    namespace: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> SqliteCache<V> {
    pub fn new(conn: Arc<Mutex<Connection>>, namespace: &str) -> Self {
        SqliteCache {
            conn,
            namespace: namespace.to_string(),
            _value: PhantomData,
        }
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let value = conn
            .query_row(
                "SELECT value FROM lookup_cache WHERE namespace = ?1 AND cache_key = ?2",
                params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, json: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute(
            "INSERT OR REPLACE INTO lookup_cache (namespace, cache_key, value) VALUES (?1, ?2, ?3)",
            params![self.namespace, key, json],
        )?;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM lookup_cache WHERE namespace = ?1",
            params![self.namespace],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl<V> LookupCache<String, V> for SqliteCache<V>
where
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &String) -> Option<V> {
        match self.read(key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(namespace = %self.namespace, key = %key, "discarding unreadable cache entry: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(namespace = %self.namespace, key = %key, "cache read failed: {}", e);
                None
            }
        }
    }

    fn put(&self, key: String, value: V) {
        let result = serde_json::to_string(&value)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.write(&key, &json));
        if let Err(e) = result {
            tracing::warn!(namespace = %self.namespace, key = %key, "cache write failed: {}", e);
        }
    }

    fn len(&self) -> usize {
        self.count().unwrap_or(0)
    }
}

// ============================================================================
// TESTS
// ============================================================================
