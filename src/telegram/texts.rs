//! Тексты сообщений бота (HTML)
//!
//! Все пользовательские значения (имена, username, текст рассылки) экранируются здесь же.

use indoc::{formatdoc, indoc};
use teloxide::utils::html::escape;

use crate::core::broadcast::BroadcastReport;
use crate::core::stats::StatsSummary;
use crate::core::types::Tariff;
use crate::storage::ContactRecord;

pub const TARIFFS: &str = indoc! {"
    💛 <b>Условия доступа</b>

    💼 <b>Тариф «БАЗОВЫЙ»</b>
    Доступ в закрытый канал с разборами задач, шаблонами документов и чек-листами для ассистента.
    Еженедельные эфиры с ответами на вопросы.

    ⭐ <b>Тариф «АССИСТЕНТ ДЛЯ АССИСТЕНТА»</b>
    Всё, что входит в базовый тариф, плюс личное сопровождение: разбор ваших рабочих ситуаций,
    помощь с резюме и подготовкой к собеседованию.

    Выберите подходящий тариф 👇
"};

pub const BASIC_TARIFF: &str = indoc! {"
    💼 <b>Вы выбрали тариф «БАЗОВЫЙ»</b>

    Отличное начало! Менеджер свяжется с вами по оставленному номеру и расскажет,
    как получить доступ. Можно не ждать и написать ему самостоятельно 👇
"};

pub const ASSISTANT_TARIFF: &str = indoc! {"
    ⭐ <b>Вы выбрали тариф «АССИСТЕНТ ДЛЯ АССИСТЕНТА»</b>

    Максимум поддержки и личное сопровождение. Менеджер свяжется с вами по оставленному
    номеру и подберёт удобное время первой встречи. Или напишите ему прямо сейчас 👇
"};

pub const ABOUT_AUTHORS: &str = indoc! {"
    👥 <b>Об авторах канала</b>

    Мы практикующие ассистенты руководителей с многолетним опытом работы в крупных компаниях.
    В канале делимся тем, что сами хотели бы знать в начале пути: как выстроить работу с
    руководителем, вести календарь и документы и не выгорать.
"};

pub const ASK_QUESTION: &str = indoc! {"
    ❓ <b>Задать вопрос</b>

    Напишите нашему менеджеру, он ответит на любые вопросы о канале и тарифах.
"};

pub const CONTACT_REQUEST: &str = "Чтобы менеджер мог с вами связаться, поделитесь своим контактом:";
pub const CONTACT_BUTTON: &str = "📱 Поделиться контактом";
pub const CONTACT_SAVED: &str = "Спасибо! Ваш контакт сохранен 📱";

pub const DENIED: &str = "У вас нет прав для использования этой команды.";
pub const APOLOGY: &str = "⚠️ Произошла ошибка. Попробуйте позже.";

pub const NO_CONTACTS: &str = "Пока нет пользователей с контактами.";
pub const EXPORT_STARTED: &str = "📤 Экспорт базы контактов...";
pub const NOTHING_TO_EXPORT: &str = "Нет пользователей с контактами для экспорта.";

pub const BROADCAST_EMPTY: &str = "Текст рассылки пустой. Отправьте сообщение ещё раз или /cancel для отмены.";
pub const BROADCAST_CANCELLED: &str = "Рассылка отменена.";

pub const NOTHING_TO_CANCEL: &str = "Нечего отменять.";
pub const CANCELLED: &str = "Действие отменено.";

pub fn welcome(first_name: Option<&str>) -> String {
    let name = first_name.filter(|n| !n.trim().is_empty()).unwrap_or("друг");
    formatdoc! {"
        👋 Здравствуйте, <b>{name}</b>!

        Я бот канала «Скорая помощь для ассистента». Здесь можно узнать условия доступа,
        познакомиться с авторами и задать вопрос менеджеру.

        Выберите, что вас интересует 👇",
        name = escape(name),
    }
}

pub fn tariff_chosen(tariff: Tariff) -> &'static str {
    match tariff {
        Tariff::Basic => BASIC_TARIFF,
        Tariff::Assistant => ASSISTANT_TARIFF,
    }
}

/// Всплывающее уведомление после выбора тарифа
pub fn tariff_toast(tariff: Tariff) -> &'static str {
    match tariff {
        Tariff::Basic => "✅ Отличный выбор!",
        Tariff::Assistant => "⭐ Превосходный выбор!",
    }
}

pub fn my_id(user_id: i64) -> String {
    formatdoc! {"
        <b>Ваш Telegram ID:</b> <code>{user_id}</code>

        Этот ID можно использовать для настройки прав администратора.",
        user_id = user_id,
    }
}

pub fn stats(summary: &StatsSummary) -> String {
    formatdoc! {"
        📊 <b>Статистика бота</b>

        👥 <b>Всего пользователей:</b> {total}
        📱 <b>Оставили контакты:</b> {contacts} ({percent}%)

        📦 <b>Выбрали тарифы:</b>
          💼 Базовый: {basic}
          ⭐ Ассистент: {assistant}
          ❌ Не выбрали: {not_chosen}

        📈 <b>Активность:</b>
          Сегодня: {today}
          За неделю: {week}
          За месяц: {month}

        <i>Обновлено: {generated}</i>",
        total = summary.total_users,
        contacts = summary.with_contacts,
        percent = summary.contacts_percent,
        basic = summary.basic,
        assistant = summary.assistant,
        not_chosen = summary.not_chosen,
        today = summary.new_today,
        week = summary.new_week,
        month = summary.new_month,
        generated = summary.generated_at.format("%d.%m.%Y %H:%M"),
    }
}

pub fn user_list(rows: &[ContactRecord], total: u64) -> String {
    let mut text = format!("👥 <b>Пользователи с контактами</b> (первые {}):\n", rows.len());

    for (idx, user) in rows.iter().enumerate() {
        let mut name = user
            .first_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Без имени".to_string());
        if let Some(last_name) = user.last_name.as_deref().filter(|n| !n.is_empty()) {
            name.push(' ');
            name.push_str(last_name);
        }
        let handle = user
            .username
            .as_deref()
            .map(|u| format!(" @{}", escape(u)))
            .unwrap_or_default();
        let (emoji, tariff) = match user.tariff {
            Some(t) => (t.emoji(), t.short_name()),
            None => ("❓", "Не выбран"),
        };

        text.push_str(&formatdoc! {"

            {n}. <b>{name}</b>{handle}
               📱 <code>{phone}</code>
               🎯 Тариф: {emoji} {tariff}
               📅 Зарегистрирован: {date}
            ",
            n = idx + 1,
            name = escape(&name),
            handle = handle,
            emoji = emoji,
            tariff = tariff,
            phone = escape(&user.phone_number),
            date = user.first_interaction.format("%d.%m.%Y"),
        });
    }

    text.push_str(&format!("\n<i>Показано {} из {}</i>\n", rows.len(), total));
    text.push_str("<i>Используйте /export для полной выгрузки</i>");
    text
}

pub fn export_caption(count: usize) -> String {
    format!("✅ Экспортировано {} контактов", count)
}

pub fn broadcast_prompt(total: u64) -> String {
    formatdoc! {"
        📢 <b>Рассылка сообщений</b>

        Отправьте текст сообщения, который хотите разослать всем пользователям ({total} чел.).

        Для отмены используйте /cancel",
        total = total,
    }
}

pub fn broadcast_confirm(text: &str, total: u64) -> String {
    formatdoc! {"
        Вы собираетесь отправить это сообщение <b>{total}</b> пользователям:

        ─────────────
        {text}
        ─────────────

        Подтверждаете? Напишите <b>да</b> или <b>нет</b>",
        total = total,
        text = escape(text),
    }
}

pub fn broadcast_started(total: usize) -> String {
    format!("📨 Рассылка началась... (0/{})", total)
}

pub fn broadcast_progress(processed: usize, total: usize) -> String {
    format!("✅ {}/{}", processed, total)
}

pub fn broadcast_summary(report: &BroadcastReport) -> String {
    formatdoc! {"
        📊 <b>Рассылка завершена!</b>

        ✅ Успешно: {succeeded}
        ❌ Ошибок: {failed} (заблокировали бота)
        ⏱ Время: {secs} сек",
        succeeded = report.succeeded,
        failed = report.failed,
        secs = report.elapsed_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn contact(first_name: Option<&str>, username: Option<&str>, tariff: Option<Tariff>) -> ContactRecord {
        ContactRecord {
            user_id: 1,
            username: username.map(str::to_string),
            first_name: first_name.map(str::to_string),
            last_name: None,
            phone_number: "+79990001122".to_string(),
            first_interaction: NaiveDate::from_ymd_opt(2024, 12, 31)
                .unwrap()
                .and_hms_opt(23, 0, 0)
                .unwrap(),
            tariff,
        }
    }

    #[test]
    fn test_welcome_escapes_name() {
        let text = welcome(Some("<Ann>"));
        assert!(text.contains("&lt;Ann&gt;"));
        assert!(welcome(None).contains("друг"));
    }

    #[test]
    fn test_user_list_rows() {
        let text = user_list(
            &[
                contact(None, None, None),
                contact(Some("Олег"), Some("oleg"), Some(Tariff::Assistant)),
            ],
            7,
        );

        assert!(text.contains("1. <b>Без имени</b>"));
        assert!(text.contains("❓ Не выбран"));
        assert!(text.contains("2. <b>Олег</b> @oleg"));
        assert!(text.contains("⭐ Ассистент"));
        assert!(text.contains("31.12.2024"));
        assert!(text.contains("Показано 2 из 7"));
    }

    #[test]
    fn test_broadcast_confirm_echoes_escaped_text() {
        let text = broadcast_confirm("Скидки <50%> & подарки", 12);
        assert!(text.contains("<b>12</b>"));
        assert!(text.contains("Скидки &lt;50%&gt; &amp; подарки"));
    }

    #[test]
    fn test_broadcast_summary() {
        let report = BroadcastReport {
            attempted: 3,
            succeeded: 2,
            failed: 1,
            elapsed_secs: 4,
        };
        let text = broadcast_summary(&report);
        assert!(text.contains("Успешно: 2"));
        assert!(text.contains("Ошибок: 1"));
        assert!(text.contains("4 сек"));
    }

    #[test]
    fn test_progress_and_start_notices() {
        assert_eq!(broadcast_started(40), "📨 Рассылка началась... (0/40)");
        assert_eq!(broadcast_progress(25, 40), "✅ 25/40");
    }
}
