//! PostgreSQL backend
//!
//! Same logical schema as the SQLite migrations. Tables are created on connect with
//! `CREATE TABLE IF NOT EXISTS`, so an existing database from an earlier deployment is
//! reused. Older deployments declared `user_id` foreign keys on the log tables; those are
//! dropped so actions can be logged before the profile row exists.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};

use super::repository::{normalize_phone, ActionLogEntry, ContactRecord, Repository, TariffCounts, UserRecord};
use crate::core::config::PostgresConfig;
use crate::core::error::{AppError, AppResult};
use crate::core::types::{ActionKind, Sender, Tariff};

const POOL_SIZE: u32 = 10;

const SCHEMA: [&str; 8] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        user_id BIGINT PRIMARY KEY,
        username TEXT,
        first_name TEXT,
        last_name TEXT,
        phone_number TEXT,
        first_interaction TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        last_interaction TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_actions (
        id SERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        action_type TEXT NOT NULL,
        action_data TEXT,
        timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tariff_selections (
        id SERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        tariff_type TEXT NOT NULL,
        timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
    "#,
    "ALTER TABLE user_actions DROP CONSTRAINT IF EXISTS user_actions_user_id_fkey",
    "ALTER TABLE tariff_selections DROP CONSTRAINT IF EXISTS tariff_selections_user_id_fkey",
    "CREATE INDEX IF NOT EXISTS idx_users_first_interaction ON users(first_interaction)",
    "CREATE INDEX IF NOT EXISTS idx_user_actions_user_id ON user_actions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_tariff_selections_user_id ON tariff_selections(user_id, timestamp)",
];

#[derive(FromRow)]
struct UserRow {
    user_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: Option<String>,
    first_interaction: NaiveDateTime,
    last_interaction: NaiveDateTime,
}

#[derive(FromRow)]
struct ContactRow {
    user_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone_number: String,
    first_interaction: NaiveDateTime,
    tariff: Option<String>,
}

#[derive(FromRow)]
struct ActionRow {
    user_id: i64,
    action_type: String,
    action_data: Option<String>,
    timestamp: NaiveDateTime,
}

/// [`Repository`] over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connects and makes sure the schema exists
    pub async fn connect(config: &PostgresConfig) -> AppResult<Self> {
        let options = connect_options(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.bootstrap_schema().await?;

        log::info!("✅ Connected to PostgreSQL (pool size: {})", POOL_SIZE);
        Ok(repo)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bootstrap_schema(&self) -> AppResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn count(&self, sql: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn connect_options(config: &PostgresConfig) -> AppResult<PgConnectOptions> {
    match config {
        PostgresConfig::Url(url) => url
            .expose_secret()
            .parse::<PgConnectOptions>()
            .map_err(|e| AppError::Config(format!("Invalid DATABASE_URL: {}", e))),
        PostgresConfig::Params {
            host,
            port,
            database,
            user,
            password,
        } => {
            let mut options = PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(user);
            if let Some(password) = password {
                options = options.password(password.expose_secret());
            }
            Ok(options)
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    fn backend(&self) -> &'static str {
        "PostgreSQL"
    }

    async fn upsert_user(&self, sender: &Sender) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                last_interaction = CURRENT_TIMESTAMP
            "#,
        )
        .bind(sender.id)
        .bind(&sender.username)
        .bind(&sender.first_name)
        .bind(&sender.last_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, username, first_name, last_name, phone_number, first_interaction, last_interaction
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| UserRecord {
            user_id: r.user_id,
            username: r.username,
            first_name: r.first_name,
            last_name: r.last_name,
            phone_number: r.phone_number,
            first_interaction: r.first_interaction,
            last_interaction: r.last_interaction,
        }))
    }

    async fn log_action(&self, user_id: i64, action: ActionKind, data: Option<&str>) -> AppResult<()> {
        sqlx::query("INSERT INTO user_actions (user_id, action_type, action_data) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(action.as_str())
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn log_tariff_selection(&self, user_id: i64, tariff: Tariff) -> AppResult<()> {
        sqlx::query("INSERT INTO tariff_selections (user_id, tariff_type) VALUES ($1, $2)")
            .bind(user_id)
            .bind(tariff.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_phone_number(&self, user_id: i64, phone: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET phone_number = $1 WHERE user_id = $2")
            .bind(phone)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            log::debug!("set_phone_number: no user row for {}", user_id);
        }
        Ok(())
    }

    async fn get_phone_number(&self, user_id: i64) -> AppResult<Option<String>> {
        let phone: Option<Option<String>> = sqlx::query_scalar("SELECT phone_number FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(normalize_phone(phone.flatten()))
    }

    async fn users_with_contacts(&self, limit: Option<u32>) -> AppResult<Vec<ContactRecord>> {
        // LIMIT NULL is "no limit" in PostgreSQL
        let rows = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT u.user_id, u.username, u.first_name, u.last_name, u.phone_number, u.first_interaction,
                   (SELECT t.tariff_type FROM tariff_selections t
                    WHERE t.user_id = u.user_id
                    ORDER BY t.timestamp DESC, t.id DESC LIMIT 1) AS tariff
            FROM users u
            WHERE u.phone_number IS NOT NULL AND TRIM(u.phone_number) <> ''
            ORDER BY u.first_interaction DESC, u.user_id DESC
            LIMIT $1
            "#,
        )
        .bind(limit.map(i64::from))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ContactRecord {
                user_id: r.user_id,
                username: r.username,
                first_name: r.first_name,
                last_name: r.last_name,
                phone_number: r.phone_number,
                first_interaction: r.first_interaction,
                tariff: r.tariff.and_then(|tag| tag.parse().ok()),
            })
            .collect())
    }

    async fn all_user_ids(&self) -> AppResult<Vec<i64>> {
        Ok(sqlx::query_scalar("SELECT user_id FROM users ORDER BY user_id")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_users(&self) -> AppResult<u64> {
        self.count("SELECT COUNT(*) FROM users").await
    }

    async fn count_users_with_phone(&self) -> AppResult<u64> {
        self.count("SELECT COUNT(*) FROM users WHERE phone_number IS NOT NULL AND TRIM(phone_number) <> ''").await
    }

    async fn tariff_counts(&self) -> AppResult<TariffCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT tariff_type, COUNT(*) FROM tariff_selections GROUP BY tariff_type")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = TariffCounts::default();
        for (tag, count) in rows {
            counts.add(&tag, u64::try_from(count).unwrap_or_default());
        }
        Ok(counts)
    }

    async fn count_recent_users(&self, days: u32) -> AppResult<u64> {
        let days = i32::try_from(days).unwrap_or(i32::MAX);
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE first_interaction >= LOCALTIMESTAMP - make_interval(days => $1)",
        )
        .bind(days)
        .fetch_one(&self.pool)
        .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn actions_for_user(&self, user_id: i64) -> AppResult<Vec<ActionLogEntry>> {
        let rows = sqlx::query_as::<_, ActionRow>(
            "SELECT user_id, action_type, action_data, timestamp FROM user_actions WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ActionLogEntry {
                user_id: r.user_id,
                action_type: r.action_type,
                action_data: r.action_data,
                timestamp: r.timestamp,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_connect_options_from_url() {
        let config = PostgresConfig::Url(SecretString::from("postgresql://bot:pw@db.local:6432/funnel"));
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "db.local");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_database(), Some("funnel"));
        assert_eq!(options.get_username(), "bot");
    }

    #[test]
    fn test_connect_options_from_params() {
        let config = PostgresConfig::Params {
            host: "localhost".to_string(),
            port: 5432,
            database: "bot".to_string(),
            user: "owner".to_string(),
            password: None,
        };
        let options = connect_options(&config).unwrap();
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_database(), Some("bot"));
    }

    #[test]
    fn test_schema_drops_legacy_foreign_keys() {
        for table in ["user_actions", "tariff_selections"] {
            let create = SCHEMA
                .iter()
                .position(|s| s.contains(&format!("CREATE TABLE IF NOT EXISTS {} ", table)))
                .unwrap();
            let drop = SCHEMA
                .iter()
                .position(|s| *s == format!("ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {table}_user_id_fkey"))
                .unwrap();
            assert!(create < drop, "{table}");
        }
        assert!(!SCHEMA.iter().any(|s| s.contains("REFERENCES")));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let config = PostgresConfig::Url(SecretString::from("::not a url::"));
        assert!(matches!(connect_options(&config), Err(AppError::Config(_))));
    }
}
