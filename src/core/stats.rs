use chrono::NaiveDateTime;
use serde::Serialize;

use crate::core::config;
use crate::core::error::AppResult;
use crate::storage::Repository;

/// Сводная статистика для администратора (/stats)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub total_users: u64,
    pub with_contacts: u64,
    /// Доля пользователей с контактом, целые проценты (0 если пользователей нет)
    pub contacts_percent: u64,
    pub basic: u64,
    pub assistant: u64,
    /// Пользователи без выбора тарифа, не меньше нуля
    pub not_chosen: u64,
    pub new_today: u64,
    pub new_week: u64,
    pub new_month: u64,
    pub generated_at: NaiveDateTime,
}

impl StatsSummary {
    /// Собирает статистику из репозитория
    pub async fn collect(repo: &dyn Repository, now: NaiveDateTime) -> AppResult<Self> {
        let total_users = repo.count_users().await?;
        let with_contacts = repo.count_users_with_phone().await?;
        let tariffs = repo.tariff_counts().await?;

        let [today, week, month] = config::admin::NEW_USER_WINDOWS;
        let new_today = repo.count_recent_users(today).await?;
        let new_week = repo.count_recent_users(week).await?;
        let new_month = repo.count_recent_users(month).await?;

        Ok(Self {
            total_users,
            with_contacts,
            contacts_percent: percent(with_contacts, total_users),
            basic: tariffs.basic,
            assistant: tariffs.assistant,
            not_chosen: total_users.saturating_sub(tariffs.basic).saturating_sub(tariffs.assistant),
            new_today,
            new_week,
            new_month,
            generated_at: now,
        })
    }
}

/// Округление до целого процента, половина округляется к чётному
fn percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = part * 100;
    let quotient = scaled / total;
    let doubled_remainder = (scaled % total) * 2;

    if doubled_remainder > total || (doubled_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
