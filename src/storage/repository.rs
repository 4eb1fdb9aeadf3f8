//! Persistence contract shared by the SQLite and PostgreSQL backends
//!
//! Every write is committed on its own; nothing here retries. Errors propagate to the
//! caller untouched.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::core::error::AppResult;
use crate::core::types::{ActionKind, Sender, Tariff};

/// Timestamp layouts found in the `users`/`user_actions` tables
const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Profile row from `users`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub first_interaction: NaiveDateTime,
    pub last_interaction: NaiveDateTime,
}

/// User who shared a phone number, with the latest tariff they picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: String,
    pub first_interaction: NaiveDateTime,
    pub tariff: Option<Tariff>,
}

/// Row from `user_actions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub user_id: i64,
    pub action_type: String,
    pub action_data: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Number of selection records per tariff tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TariffCounts {
    pub basic: u64,
    pub assistant: u64,
}

impl TariffCounts {
    pub fn total(&self) -> u64 {
        self.basic + self.assistant
    }

    /// Adds `count` rows carrying the raw `tag`; unknown tags are ignored
    pub fn add(&mut self, tag: &str, count: u64) {
        match tag.parse::<Tariff>() {
            Ok(Tariff::Basic) => self.basic += count,
            Ok(Tariff::Assistant) => self.assistant += count,
            Err(_) => log::debug!("Ignoring unknown tariff tag {:?}", tag),
        }
    }
}

/// Operations the bot needs from its relational store
#[async_trait]
pub trait Repository: Send + Sync {
    /// Human readable backend name for logs
    fn backend(&self) -> &'static str;

    /// Inserts the user or refreshes handle, names and last-seen time
    async fn upsert_user(&self, sender: &Sender) -> AppResult<()>;

    async fn get_user(&self, user_id: i64) -> AppResult<Option<UserRecord>>;

    /// Appends an action log entry; the user row does not have to exist
    async fn log_action(&self, user_id: i64, action: ActionKind, data: Option<&str>) -> AppResult<()>;

    /// Appends a tariff selection; the user row does not have to exist
    async fn log_tariff_selection(&self, user_id: i64, tariff: Tariff) -> AppResult<()>;

    /// Stores the phone number; no-op for an unknown user id
    async fn set_phone_number(&self, user_id: i64, phone: &str) -> AppResult<()>;

    /// Stored phone number; blank values count as absent
    async fn get_phone_number(&self, user_id: i64) -> AppResult<Option<String>>;

    /// Users with a phone number, newest first, each with their latest tariff
    async fn users_with_contacts(&self, limit: Option<u32>) -> AppResult<Vec<ContactRecord>>;

    async fn all_user_ids(&self) -> AppResult<Vec<i64>>;

    async fn count_users(&self) -> AppResult<u64>;

    async fn count_users_with_phone(&self) -> AppResult<u64>;

    async fn tariff_counts(&self) -> AppResult<TariffCounts>;

    /// Users first seen at or after "now minus `days` days"
    async fn count_recent_users(&self, days: u32) -> AppResult<u64>;

    /// Action log of one user, oldest first
    async fn actions_for_user(&self, user_id: i64) -> AppResult<Vec<ActionLogEntry>>;
}

/// Parses a stored timestamp in any of the layouts the schema produces
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS[1..]
        .iter()
        .fold(NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMATS[0]), |parsed, format| {
            parsed.or_else(|_| NaiveDateTime::parse_from_str(raw, format))
        })
}

/// Blank phone numbers are treated as not set
pub fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone.filter(|p| !p.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_timestamp_layouts() {
        let with_fraction = parse_timestamp("2024-05-01 10:20:30.123").unwrap();
        assert_eq!(with_fraction.nanosecond(), 123_000_000);

        let plain = parse_timestamp("2024-05-01 10:20:30").unwrap();
        assert_eq!(plain.second(), 30);

        assert!(parse_timestamp("2024-05-01T10:20:30").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(Some("+7999".to_string())), Some("+7999".to_string()));
        assert_eq!(normalize_phone(Some("   ".to_string())), None);
        assert_eq!(normalize_phone(None), None);
    }

    #[test]
    fn test_tariff_counts_ignore_unknown_tags() {
        let mut counts = TariffCounts::default();
        counts.add("basic", 2);
        counts.add("assistant", 3);
        counts.add("vip", 10);
        assert_eq!(counts.total(), 5);
    }
}
