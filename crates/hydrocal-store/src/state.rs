//! Small key/value store for bot runtime state.
//!
//! Backs the `bot_state` table. The polling loop keeps its Telegram
//! update offset here so a restart never replays already-handled updates.

use tracing::instrument;

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// Persistent key/value state, e.g. the Telegram update offset.
#[derive(Clone)]
pub struct StateStore {
    db: Database,
}

impl StateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Read an integer value, or `None` if the key was never set.
    #[instrument(skip(self))]
    pub async fn get_i64(&self, key: &'static str) -> StoreResult<Option<i64>> {
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT value FROM bot_state WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(value) => value
                        .parse::<i64>()
                        .map(Some)
                        .map_err(|e| {
                            StoreError::InvalidArgument(format!(
                                "bot_state value for '{key}' is not an integer: {e}"
                            ))
                        }),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Write an integer value, overwriting any previous one.
    #[instrument(skip(self))]
    pub async fn set_i64(&self, key: &'static str, value: i64) -> StoreResult<()> {
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO bot_state (key, value) VALUES (?1, ?2) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![key, value.to_string()],
                )?;
                Ok(())
            })
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
