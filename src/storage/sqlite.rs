//! Embedded SQLite backend
//!
//! Uses an r2d2 connection pool; the schema is kept up to date with the embedded refinery
//! migrations every time a pool is created.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, ToSql};

use super::migrations::run_migrations;
use super::repository::{
    normalize_phone, parse_timestamp, ActionLogEntry, ContactRecord, Repository, TariffCounts, UserRecord,
};
use crate::core::error::AppResult;
use crate::core::types::{ActionKind, Sender, Tariff};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Current UTC time in the layout stored by the schema defaults
const NOW: &str = "strftime('%Y-%m-%d %H:%M:%f', 'now')";

/// Create a new database connection pool
///
/// Creates the parent directory when missing, opens up to 10 connections and applies
/// pending schema migrations.
///
/// # Example
///
/// ```no_run
/// use assistbot::storage::create_pool;
///
/// let pool = create_pool("database/bot_database.db")?;
/// # Ok::<(), assistbot::core::AppError>(())
/// ```
pub fn create_pool(database_path: impl AsRef<Path>) -> AppResult<DbPool> {
    let database_path = database_path.as_ref();
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let existed = database_path.exists();
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder().max_size(10).build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn)?;

    if existed {
        log::info!("✅ Using existing database: {}", database_path.display());
    } else {
        log::info!("🔨 Created new database: {}", database_path.display());
    }

    Ok(pool)
}

/// Get a connection from the pool; it returns to the pool when dropped
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

/// [`Repository`] over an SQLite file
#[derive(Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn open(database_path: impl AsRef<Path>) -> AppResult<Self> {
        Ok(Self::new(create_pool(database_path)?))
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn count(&self, sql: &str, params: &[&dyn ToSql]) -> AppResult<u64> {
        let conn = get_connection(&self.pool)?;
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[async_trait]
impl Repository for SqliteRepository {
    fn backend(&self) -> &'static str {
        "SQLite"
    }

    async fn upsert_user(&self, sender: &Sender) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            &format!(
                "INSERT INTO users (user_id, username, first_name, last_name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                    username = excluded.username,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    last_interaction = {}",
                NOW
            ),
            params![sender.id, sender.username, sender.first_name, sender.last_name],
        )?;
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        let conn = get_connection(&self.pool)?;
        let user = conn
            .query_row(
                "SELECT user_id, username, first_name, last_name, phone_number, first_interaction, last_interaction
                 FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(UserRecord {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        first_name: row.get(2)?,
                        last_name: row.get(3)?,
                        phone_number: row.get(4)?,
                        first_interaction: timestamp_column(row, 5)?,
                        last_interaction: timestamp_column(row, 6)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    async fn log_action(&self, user_id: i64, action: ActionKind, data: Option<&str>) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            "INSERT INTO user_actions (user_id, action_type, action_data) VALUES (?1, ?2, ?3)",
            params![user_id, action.as_str(), data],
        )?;
        Ok(())
    }

    async fn log_tariff_selection(&self, user_id: i64, tariff: Tariff) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        conn.execute(
            "INSERT INTO tariff_selections (user_id, tariff_type) VALUES (?1, ?2)",
            &[&user_id as &dyn ToSql, &tariff],
        )?;
        Ok(())
    }

    async fn set_phone_number(&self, user_id: i64, phone: &str) -> AppResult<()> {
        let conn = get_connection(&self.pool)?;
        let updated = conn.execute(
            "UPDATE users SET phone_number = ?1 WHERE user_id = ?2",
            params![phone, user_id],
        )?;
        if updated == 0 {
            log::debug!("set_phone_number: no user row for {}", user_id);
        }
        Ok(())
    }

    async fn get_phone_number(&self, user_id: i64) -> AppResult<Option<String>> {
        let conn = get_connection(&self.pool)?;
        let phone: Option<Option<String>> = conn
            .query_row("SELECT phone_number FROM users WHERE user_id = ?1", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(normalize_phone(phone.flatten()))
    }

    async fn users_with_contacts(&self, limit: Option<u32>) -> AppResult<Vec<ContactRecord>> {
        let conn = get_connection(&self.pool)?;
        // LIMIT -1 means "no limit" in SQLite
        let limit = limit.map(i64::from).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT u.user_id, u.username, u.first_name, u.last_name, u.phone_number, u.first_interaction,
                    (SELECT t.tariff_type FROM tariff_selections t
                     WHERE t.user_id = u.user_id
                     ORDER BY t.timestamp DESC, t.id DESC LIMIT 1) AS tariff
             FROM users u
             WHERE u.phone_number IS NOT NULL AND TRIM(u.phone_number) <> ''
             ORDER BY u.first_interaction DESC, u.user_id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            let tariff: Option<String> = row.get(6)?;
            Ok(ContactRecord {
                user_id: row.get(0)?,
                username: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone_number: row.get(4)?,
                first_interaction: timestamp_column(row, 5)?,
                tariff: tariff.and_then(|tag| tag.parse().ok()),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    async fn all_user_ids(&self) -> AppResult<Vec<i64>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare("SELECT user_id FROM users ORDER BY user_id")?;
        let ids = stmt.query_map([], |row| row.get(0))?;
        Ok(ids.collect::<Result<Vec<i64>, _>>()?)
    }

    async fn count_users(&self) -> AppResult<u64> {
        self.count("SELECT COUNT(*) FROM users", &[])
    }

    async fn count_users_with_phone(&self) -> AppResult<u64> {
        self.count("SELECT COUNT(*) FROM users WHERE phone_number IS NOT NULL AND TRIM(phone_number) <> ''", &[])
    }

    async fn tariff_counts(&self) -> AppResult<TariffCounts> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare("SELECT tariff_type, COUNT(*) FROM tariff_selections GROUP BY tariff_type")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut counts = TariffCounts::default();
        for row in rows {
            let (tag, count) = row?;
            counts.add(&tag, u64::try_from(count).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn count_recent_users(&self, days: u32) -> AppResult<u64> {
        let modifier = format!("-{} days", days);
        self.count(
            "SELECT COUNT(*) FROM users WHERE first_interaction >= datetime('now', ?1)",
            &[&modifier as &dyn ToSql],
        )
    }

    async fn actions_for_user(&self, user_id: i64) -> AppResult<Vec<ActionLogEntry>> {
        let conn = get_connection(&self.pool)?;
        let mut stmt = conn.prepare(
            "SELECT user_id, action_type, action_data, timestamp
             FROM user_actions WHERE user_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok(ActionLogEntry {
                user_id: row.get(0)?,
                action_type: row.get(1)?,
                action_data: row.get(2)?,
                timestamp: timestamp_column(row, 3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
