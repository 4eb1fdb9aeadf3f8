//! Rendering of router replies into Telegram requests

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, InputFile, KeyboardRemove, ParseMode};

use super::broadcast::spawn_broadcast;
use super::types::Origin;
use crate::core::types::ActionKind;
use crate::telegram::keyboards;
use crate::telegram::router::Reply;
use crate::telegram::texts;

/// A menu position: text plus its inline keyboard
struct Screen {
    text: String,
    keyboard: InlineKeyboardMarkup,
}

impl Screen {
    fn new(text: impl Into<String>, keyboard: InlineKeyboardMarkup) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

/// Content resumed after a contact was captured
fn resumed_screen(purpose: ActionKind, manager_url: &str) -> Option<Screen> {
    match purpose {
        ActionKind::ViewTariffs => Some(Screen::new(texts::TARIFFS, keyboards::tariffs())),
        ActionKind::ViewAbout => Some(Screen::new(texts::ABOUT_AUTHORS, keyboards::about_authors())),
        ActionKind::AskQuestion => Some(Screen::new(texts::ASK_QUESTION, keyboards::ask_question(manager_url))),
        _ => None,
    }
}

async fn send_html(bot: &Bot, chat_id: ChatId, text: impl Into<String>) -> ResponseResult<Message> {
    bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await
}

/// Edits the pressed message in place; falls back to a new message if editing fails
async fn show(bot: &Bot, origin: &Origin, screen: Screen) -> ResponseResult<()> {
    if let Origin::Callback {
        chat_id, message_id, ..
    } = origin
    {
        match bot
            .edit_message_text(*chat_id, *message_id, screen.text.clone())
            .parse_mode(ParseMode::Html)
            .reply_markup(screen.keyboard.clone())
            .await
        {
            Ok(_) => return Ok(()),
            Err(e) => log::warn!("Failed to edit menu message, sending a new one: {}", e),
        }
    }

    bot.send_message(origin.chat_id(), screen.text)
        .parse_mode(ParseMode::Html)
        .reply_markup(screen.keyboard)
        .await?;
    Ok(())
}

/// Answers the callback query (if any); tariff choices get a toast
async fn answer_callback(bot: &Bot, origin: &Origin, reply: &Reply) -> ResponseResult<()> {
    if let Origin::Callback { query, .. } = origin {
        let answer = bot.answer_callback_query(query.id.clone());
        match reply {
            Reply::TariffChosen(tariff) => answer.text(texts::tariff_toast(*tariff)).await?,
            _ => answer.await?,
        };
    }
    Ok(())
}

/// Sends whatever `reply` stands for to the chat the trigger came from
pub async fn render(bot: &Bot, origin: &Origin, reply: Reply, manager_url: &str) -> ResponseResult<()> {
    answer_callback(bot, origin, &reply).await?;
    let chat_id = origin.chat_id();

    match reply {
        Reply::Ignored => {}
        Reply::Welcome { first_name } => {
            show(
                bot,
                origin,
                Screen::new(texts::welcome(first_name.as_deref()), keyboards::main_menu()),
            )
            .await?;
        }
        Reply::MyId(user_id) => {
            send_html(bot, chat_id, texts::my_id(user_id)).await?;
        }
        Reply::Tariffs => {
            show(bot, origin, Screen::new(texts::TARIFFS, keyboards::tariffs())).await?;
        }
        Reply::TariffChosen(tariff) => {
            let screen = Screen::new(texts::tariff_chosen(tariff), keyboards::contact_manager(manager_url));
            show(bot, origin, screen).await?;
        }
        Reply::AboutAuthors => {
            show(bot, origin, Screen::new(texts::ABOUT_AUTHORS, keyboards::about_authors())).await?;
        }
        Reply::AskQuestion => {
            show(
                bot,
                origin,
                Screen::new(texts::ASK_QUESTION, keyboards::ask_question(manager_url)),
            )
            .await?;
        }
        Reply::ContactRequest => {
            // A reply keyboard can't be attached by editing, so the inline menu goes away
            if let Origin::Callback {
                chat_id, message_id, ..
            } = origin
            {
                if let Err(e) = bot.delete_message(*chat_id, *message_id).await {
                    log::debug!("Failed to delete menu message: {}", e);
                }
            }
            bot.send_message(chat_id, texts::CONTACT_REQUEST)
                .reply_markup(keyboards::contact_request())
                .await?;
        }
        Reply::ContactSaved { resume } => {
            bot.send_message(chat_id, texts::CONTACT_SAVED)
                .reply_markup(KeyboardRemove::new())
                .await?;
            if let Some(screen) = resume.and_then(|purpose| resumed_screen(purpose, manager_url)) {
                show(bot, &Origin::Chat(chat_id), screen).await?;
            }
        }
        Reply::Stats(summary) => {
            send_html(bot, chat_id, texts::stats(&summary)).await?;
        }
        Reply::UserList { rows, total } => {
            send_html(bot, chat_id, texts::user_list(&rows, total)).await?;
        }
        Reply::NoContacts => {
            bot.send_message(chat_id, texts::NO_CONTACTS).await?;
        }
        Reply::Export { filename, bytes, count } => {
            bot.send_message(chat_id, texts::EXPORT_STARTED).await?;
            bot.send_document(chat_id, InputFile::memory(bytes).file_name(filename))
                .caption(texts::export_caption(count))
                .await?;
        }
        Reply::NothingToExport => {
            bot.send_message(chat_id, texts::NOTHING_TO_EXPORT).await?;
        }
        Reply::BroadcastPrompt { total } => {
            send_html(bot, chat_id, texts::broadcast_prompt(total)).await?;
        }
        Reply::BroadcastEmptyText => {
            bot.send_message(chat_id, texts::BROADCAST_EMPTY).await?;
        }
        Reply::BroadcastConfirm { text, total } => {
            send_html(bot, chat_id, texts::broadcast_confirm(&text, total)).await?;
        }
        Reply::BroadcastReady(job) => {
            bot.send_message(chat_id, texts::broadcast_started(job.recipients.len()))
                .await?;
            spawn_broadcast(bot.clone(), chat_id, job);
        }
        Reply::BroadcastCancelled => {
            bot.send_message(chat_id, texts::BROADCAST_CANCELLED).await?;
        }
        Reply::Cancelled => {
            bot.send_message(chat_id, texts::CANCELLED)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        Reply::NothingToCancel => {
            bot.send_message(chat_id, texts::NOTHING_TO_CANCEL).await?;
        }
        Reply::Denied => {
            bot.send_message(chat_id, texts::DENIED).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resumed_screens() {
        let screen = resumed_screen(ActionKind::ViewTariffs, "https://t.me/sp_assistant").unwrap();
        assert_eq!(screen.text, texts::TARIFFS);
        assert!(resumed_screen(ActionKind::SharedContact, "https://t.me/sp_assistant").is_none());
        assert!(resumed_screen(ActionKind::Start, "https://t.me/sp_assistant").is_none());
    }
}
