//! # hydrocal-store
//!
//! Storage engine for hydrocal.
//!
//! Provides SQLite-backed persistence with WAL mode, versioned
//! transactional migrations, and the in-memory [`UserCache`] that all
//! live reads and writes flow through.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  UserCache (HashMap, lazy day rollover) │
//! ├─────────────────────────────────────────┤
//! │  UserStore   (users + user_history)     │
//! │  StateStore  (bot_state key/value)      │
//! ├─────────────────────────────────────────┤
//! │  Database (rusqlite WAL)                │
//! │  Migrations (versioned, transactional)  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use hydrocal_store::{Database, UserCache, UserStore};
//!
//! let db = Database::open_and_migrate("data/hydrocal.db").await?;
//! let cache = UserCache::new(UserStore::new(db.clone()));
//! let record = cache.get(user_id).await?;
//! ```

pub mod cache;
pub mod db;
pub mod error;
pub mod migration;
pub mod record;
pub mod state;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use cache::{CacheStats, UserCache};
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use record::{Gender, RecordPatch, UserRecord, rollover};
pub use state::StateStore;
pub use user_store::{HistoryPoint, Period, UserStore};
