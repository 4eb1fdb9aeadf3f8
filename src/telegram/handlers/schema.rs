//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Contact, Message};

use super::replies::render;
use super::types::{message_sender, HandlerDeps, HandlerError, Origin};
use crate::core::error::AppError;
use crate::core::metrics;
use crate::core::types::Sender;
use crate::telegram::bot::Command;
use crate::telegram::router::{MenuAction, Trigger};
use crate::telegram::texts;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and can be used in integration tests.
/// Branch order matters: commands win over free text, so `/cancel` always works
/// while a text capture is pending.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    dptree::entry()
        .branch(command_handler(deps.clone()))
        .branch(contact_handler(deps.clone()))
        .branch(text_handler(deps.clone()))
        .branch(callback_handler(deps))
}

fn error_kind(error: &AppError) -> &'static str {
    if error.is_persistence() {
        "persistence"
    } else if matches!(error, AppError::Telegram(_)) {
        "telegram"
    } else {
        "other"
    }
}

/// Routes one trigger and renders the reply; failures end in the generic apology
async fn dispatch(bot: Bot, deps: HandlerDeps, sender: Sender, origin: Origin, trigger: Trigger) -> Result<(), HandlerError> {
    let kind = trigger.kind();

    let reply = match deps.router.handle(&sender, trigger).await {
        Ok(reply) => reply,
        Err(e) => {
            log::error!("❌ /{} handler failed for user {}: {}", kind, sender.id, e);
            metrics::record_handler_error(error_kind(&e));

            if let Origin::Callback { query, .. } = &origin {
                if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
                    log::warn!("Failed to answer callback query: {}", e);
                }
            }
            if let Err(e) = bot.send_message(origin.chat_id(), texts::APOLOGY).await {
                log::error!("Failed to send error reply to {}: {}", origin.chat_id(), e);
            }
            return Ok(());
        }
    };

    let manager_url = deps.router.config().manager_url();
    if let Err(e) = render(&bot, &origin, reply, &manager_url).await {
        log::error!("❌ Failed to deliver reply for /{} to user {}: {}", kind, sender.id, e);
        metrics::record_handler_error("telegram");
        return Err(Box::new(e) as HandlerError);
    }
    Ok(())
}

/// Handler for bot commands (/start, /myid, admin commands, /cancel)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let Some(sender) = message_sender(&msg) else {
                    return Ok(());
                };
                dispatch(bot, deps, sender, Origin::from_message(&msg), Trigger::from(cmd)).await
            }
        })
}

/// Handler for shared contacts
fn contact_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.contact().cloned())
        .endpoint(move |bot: Bot, msg: Message, contact: Contact| {
            let deps = deps.clone();
            async move {
                let Some(sender) = message_sender(&msg) else {
                    return Ok(());
                };
                let trigger = Trigger::ContactShared {
                    phone: contact.phone_number,
                };
                dispatch(bot, deps, sender, Origin::from_message(&msg), trigger).await
            }
        })
}

/// Handler for free text (broadcast body, confirmation, stray messages)
fn text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| msg.text().map(str::to_string))
        .endpoint(move |bot: Bot, msg: Message, text: String| {
            let deps = deps.clone();
            async move {
                let Some(sender) = message_sender(&msg) else {
                    return Ok(());
                };
                dispatch(bot, deps, sender, Origin::from_message(&msg), Trigger::Text(text)).await
            }
        })
}

/// Handler for inline menu buttons
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let action = q.data.as_deref().and_then(|data| data.parse::<MenuAction>().ok());
            let (Some(action), Some(origin)) = (action, Origin::from_callback(&q)) else {
                log::debug!("Ignoring callback {:?} from user {}", q.data, q.from.id);
                bot.answer_callback_query(q.id.clone()).await?;
                return Ok(());
            };
            dispatch(bot, deps, Sender::from(&q.from), origin, Trigger::Menu(action)).await
        }
    })
}
