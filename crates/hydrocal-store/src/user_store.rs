//! Durable per-user persistence.
//!
//! Provides SQLite-backed storage for [`UserRecord`]s plus an append-only
//! `user_history` table. Every save archives the previous row (if any)
//! into history before overwriting, which is what the trend queries read.

use chrono::{Datelike, NaiveDate, Utc};
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};
use crate::record::{Gender, UserRecord};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// Time window for history queries, anchored on "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// Parse a user-supplied period token.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Inclusive date range selected by this period, anchored on `today`.
    ///
    /// Day: today only. Week: Monday through Sunday of the current week.
    /// Month: first through last day of the current month. Year: Jan 1
    /// through Dec 31.
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            Self::Day => (today, today),
            Self::Week => {
                let start = today - chrono::Days::new(today.weekday().num_days_from_monday() as u64);
                (start, start + chrono::Days::new(6))
            }
            Self::Month => {
                let start = today.with_day(1).unwrap_or(today);
                let end = start
                    .checked_add_months(chrono::Months::new(1))
                    .and_then(|d| d.checked_sub_days(chrono::Days::new(1)))
                    .unwrap_or(today);
                (start, end)
            }
            Self::Year => {
                let start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let end = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                (start, end)
            }
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One archived snapshot row, as read back for trend queries.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    /// Unix timestamp the snapshot was archived at.
    pub logged_at: i64,
    pub logged_water: f64,
    pub logged_calories: f64,
    pub water_goal: f64,
    pub calorie_goal: f64,
    pub burned_calories: f64,
}

// ═══════════════════════════════════════════════════════════════════════
//  UserStore
// ═══════════════════════════════════════════════════════════════════════

/// Durable storage for user records and their snapshot history.
#[derive(Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    /// Create a new user store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Fetch a user's record, returning `None` if no row exists.
    #[instrument(skip(self))]
    pub async fn load(&self, user_id: i64) -> StoreResult<Option<UserRecord>> {
        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT weight, height, age, gender, activity, city, water_goal, \
                            calorie_goal, logged_water, logged_calories, burned_calories, \
                            \"current_date\" \
                     FROM users WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| {
                        Ok(UserRow {
                            weight: row.get(0)?,
                            height: row.get(1)?,
                            age: row.get(2)?,
                            gender: row.get(3)?,
                            activity: row.get(4)?,
                            city: row.get(5)?,
                            water_goal: row.get(6)?,
                            calorie_goal: row.get(7)?,
                            logged_water: row.get(8)?,
                            logged_calories: row.get(9)?,
                            burned_calories: row.get(10)?,
                            current_date: row.get(11)?,
                        })
                    },
                );
                match result {
                    Ok(row) => row.into_record().map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// Persist a full record, archiving the previous row into history.
    ///
    /// If a row already exists for `user_id` it is copied into
    /// `user_history` (timestamped now) before being overwritten, so the
    /// history captures the state just before each save.
    #[instrument(skip(self, record))]
    pub async fn save(&self, user_id: i64, record: &UserRecord) -> StoreResult<()> {
        let record = record.clone();
        let now = Utc::now().timestamp();

        self.db
            .execute_mut(move |conn| {
                let tx = conn.transaction()?;

                tx.execute(
                    "INSERT INTO user_history (user_id, weight, height, age, gender, activity, \
                            city, water_goal, calorie_goal, logged_water, logged_calories, \
                            burned_calories, \"current_date\", logged_at) \
                     SELECT user_id, weight, height, age, gender, activity, city, water_goal, \
                            calorie_goal, logged_water, logged_calories, burned_calories, \
                            \"current_date\", ?2 \
                     FROM users WHERE user_id = ?1",
                    rusqlite::params![user_id, now],
                )?;

                tx.execute(
                    "INSERT INTO users (user_id, weight, height, age, gender, activity, city, \
                            water_goal, calorie_goal, logged_water, logged_calories, \
                            burned_calories, \"current_date\") \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13) \
                     ON CONFLICT(user_id) DO UPDATE SET \
                        weight = excluded.weight, \
                        height = excluded.height, \
                        age = excluded.age, \
                        gender = excluded.gender, \
                        activity = excluded.activity, \
                        city = excluded.city, \
                        water_goal = excluded.water_goal, \
                        calorie_goal = excluded.calorie_goal, \
                        logged_water = excluded.logged_water, \
                        logged_calories = excluded.logged_calories, \
                        burned_calories = excluded.burned_calories, \
                        \"current_date\" = excluded.\"current_date\"",
                    rusqlite::params![
                        user_id,
                        record.weight,
                        record.height,
                        record.age,
                        record.gender.as_str(),
                        record.activity,
                        record.city,
                        record.water_goal,
                        record.calorie_goal,
                        record.logged_water,
                        record.logged_calories,
                        record.burned_calories,
                        record.current_date.map(|d| d.to_string()),
                    ],
                )?;

                tx.commit()?;
                Ok(())
            })
            .await?;

        debug!(user_id, "user record persisted");
        Ok(())
    }

    /// Read archived snapshots for `user_id` within `period`, ascending
    /// by archive time.
    #[instrument(skip(self))]
    pub async fn query_history(
        &self,
        user_id: i64,
        period: Period,
    ) -> StoreResult<Vec<HistoryPoint>> {
        let today = Utc::now().date_naive();
        self.query_history_at(user_id, period, today).await
    }

    /// Like [`query_history`](Self::query_history) with an injected "today"
    /// so tests do not depend on the wall clock.
    pub async fn query_history_at(
        &self,
        user_id: i64,
        period: Period,
        today: NaiveDate,
    ) -> StoreResult<Vec<HistoryPoint>> {
        let (start, end) = period.date_range(today);
        let start_ts = start.and_hms_opt(0, 0, 0).map(|t| t.and_utc().timestamp());
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map(|t| t.and_utc().timestamp());
        let (start_ts, end_ts) = match (start_ts, end_ts) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                return Err(StoreError::InvalidArgument(format!(
                    "invalid period bounds for {period}"
                )));
            }
        };

        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT logged_at, logged_water, logged_calories, water_goal, \
                            calorie_goal, burned_calories \
                     FROM user_history \
                     WHERE user_id = ?1 AND logged_at BETWEEN ?2 AND ?3 \
                     ORDER BY logged_at ASC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![user_id, start_ts, end_ts], |row| {
                        Ok(HistoryPoint {
                            logged_at: row.get(0)?,
                            logged_water: row.get(1)?,
                            logged_calories: row.get(2)?,
                            water_goal: row.get(3)?,
                            calorie_goal: row.get(4)?,
                            burned_calories: row.get(5)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Internal row mapping
// ═══════════════════════════════════════════════════════════════════════

/// Raw row data from SQLite before gender/date parsing.
struct UserRow {
    weight: f64,
    height: f64,
    age: f64,
    gender: String,
    activity: f64,
    city: String,
    water_goal: f64,
    calorie_goal: f64,
    logged_water: f64,
    logged_calories: f64,
    burned_calories: f64,
    current_date: Option<String>,
}

impl UserRow {
    fn into_record(self) -> StoreResult<UserRecord> {
        let gender = Gender::from_str(&self.gender)?;
        let current_date = match self.current_date {
            Some(s) => Some(s.parse::<NaiveDate>().map_err(|e| {
                StoreError::InvalidArgument(format!("bad current_date '{s}': {e}"))
            })?),
            None => None,
        };
        Ok(UserRecord {
            weight: self.weight,
            height: self.height,
            age: self.age,
            gender,
            activity: self.activity,
            city: self.city,
            water_goal: self.water_goal,
            calorie_goal: self.calorie_goal,
            logged_water: self.logged_water,
            logged_calories: self.logged_calories,
            burned_calories: self.burned_calories,
            current_date,
            last_active: Utc::now(),
        })
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> UserStore {
        let db = Database::open_in_memory().unwrap();
        db.run_migrations().await.unwrap();
        UserStore::new(db)
    }

    fn sample_record() -> UserRecord {
        UserRecord {
            weight: 70.0,
            height: 175.0,
            age: 30.0,
            gender: Gender::Male,
            activity: 45.0,
            city: "Lisbon".to_string(),
            water_goal: 2600.0,
            calorie_goal: 2189.0,
            logged_water: 300.0,
            logged_calories: 450.0,
            burned_calories: 120.0,
            current_date: NaiveDate::from_ymd_opt(2025, 3, 1),
            last_active: Utc::now(),
        }
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = setup_store().await;
        assert!(store.load(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = setup_store().await;
        let record = sample_record();

        store.save(42, &record).await.unwrap();

        let loaded = store.load(42).await.unwrap().unwrap();
        assert_eq!(loaded.weight, record.weight);
        assert_eq!(loaded.height, record.height);
        assert_eq!(loaded.age, record.age);
        assert_eq!(loaded.gender, record.gender);
        assert_eq!(loaded.activity, record.activity);
        assert_eq!(loaded.city, record.city);
        assert_eq!(loaded.water_goal, record.water_goal);
        assert_eq!(loaded.calorie_goal, record.calorie_goal);
        assert_eq!(loaded.logged_water, record.logged_water);
        assert_eq!(loaded.logged_calories, record.logged_calories);
        assert_eq!(loaded.burned_calories, record.burned_calories);
        assert_eq!(loaded.current_date, record.current_date);
    }

    #[tokio::test]
    async fn first_save_writes_no_history() {
        let store = setup_store().await;
        store.save(42, &sample_record()).await.unwrap();

        let points = store.query_history(42, Period::Year).await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn second_save_archives_prior_row() {
        let store = setup_store().await;
        let mut record = sample_record();
        store.save(42, &record).await.unwrap();

        record.logged_water = 700.0;
        store.save(42, &record).await.unwrap();

        let points = store.query_history(42, Period::Day).await.unwrap();
        assert_eq!(points.len(), 1);
        // History holds the value from just before the overwrite.
        assert_eq!(points[0].logged_water, 300.0);
    }

    #[tokio::test]
    async fn history_is_ascending_in_time() {
        let store = setup_store().await;
        let mut record = sample_record();
        for ml in [100.0, 200.0, 300.0, 400.0] {
            record.logged_water = ml;
            store.save(42, &record).await.unwrap();
        }

        let points = store.query_history(42, Period::Day).await.unwrap();
        assert_eq!(points.len(), 3);
        for window in points.windows(2) {
            assert!(window[0].logged_at <= window[1].logged_at);
        }
    }

    #[tokio::test]
    async fn history_is_scoped_per_user() {
        let store = setup_store().await;
        let record = sample_record();
        store.save(1, &record).await.unwrap();
        store.save(1, &record).await.unwrap();
        store.save(2, &record).await.unwrap();

        assert_eq!(store.query_history(1, Period::Day).await.unwrap().len(), 1);
        assert!(store.query_history(2, Period::Day).await.unwrap().is_empty());
    }

    #[test]
    fn period_parsing() {
        assert_eq!(Period::parse("day"), Some(Period::Day));
        assert_eq!(Period::parse(" Week "), Some(Period::Week));
        assert_eq!(Period::parse("MONTH"), Some(Period::Month));
        assert_eq!(Period::parse("year"), Some(Period::Year));
        assert_eq!(Period::parse("decade"), None);
    }

    #[test]
    fn period_ranges_anchor_on_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(); // a Wednesday

        assert_eq!(Period::Day.date_range(today), (today, today));

        let (wk_start, wk_end) = Period::Week.date_range(today);
        assert_eq!(wk_start, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(wk_end, NaiveDate::from_ymd_opt(2025, 3, 16).unwrap());

        let (mo_start, mo_end) = Period::Month.date_range(today);
        assert_eq!(mo_start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(mo_end, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());

        let (yr_start, yr_end) = Period::Year.date_range(today);
        assert_eq!(yr_start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(yr_end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn february_month_range_handles_short_month() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 15).unwrap();
        let (start, end) = Period::Month.date_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}
