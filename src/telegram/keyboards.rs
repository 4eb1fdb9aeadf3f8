//! Inline and reply keyboards for every menu position

use teloxide::types::{ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use url::Url;

use crate::telegram::router::MenuAction;
use crate::telegram::texts;

fn button(text: &str, action: MenuAction) -> Vec<InlineKeyboardButton> {
    vec![InlineKeyboardButton::callback(text, action.as_ref())]
}

/// "Write to manager" row; skipped when the manager link is not a valid URL
fn manager_button(manager_url: &str) -> Option<Vec<InlineKeyboardButton>> {
    match Url::parse(manager_url) {
        Ok(url) => Some(vec![InlineKeyboardButton::url("✉️ Написать менеджеру", url)]),
        Err(e) => {
            log::warn!("Invalid manager URL {:?}: {}", manager_url, e);
            None
        }
    }
}

/// Главное меню (после /start)
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button("💛 Условия доступа", MenuAction::Tariffs),
        button("👥 Об авторах канала", MenuAction::AboutAuthors),
        button("❓ Задать вопрос", MenuAction::AskQuestion),
    ])
}

pub fn tariffs() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button("💼 Выбрать тариф «БАЗОВЫЙ»", MenuAction::SelectBasic),
        button("⭐ Выбрать тариф «АССИСТЕНТ ДЛЯ АССИСТЕНТА»", MenuAction::SelectAssistant),
        button("🏠 Назад в меню", MenuAction::MainMenu),
    ])
}

/// Shown after a tariff is chosen
pub fn contact_manager(manager_url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    rows.extend(manager_button(manager_url));
    rows.push(button("⬅️ Назад к тарифам", MenuAction::Tariffs));
    rows.push(button("🏠 В меню", MenuAction::MainMenu));
    InlineKeyboardMarkup::new(rows)
}

pub fn about_authors() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        button("💛 Условия доступа", MenuAction::Tariffs),
        button("❓ Задать вопрос", MenuAction::AskQuestion),
        button("🏠 В меню", MenuAction::MainMenu),
    ])
}

pub fn ask_question(manager_url: &str) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    rows.extend(manager_button(manager_url));
    rows.push(button("🏠 В меню", MenuAction::MainMenu));
    InlineKeyboardMarkup::new(rows)
}

/// One-time reply keyboard with a single "share contact" button
pub fn contact_request() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(texts::CONTACT_BUTTON).request(ButtonRequest::Contact)
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}
