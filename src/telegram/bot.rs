//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI
//! - Dropping updates queued while the bot was down

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};
use crate::telegram::router::Trigger;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "узнать свой Telegram ID")]
    MyId,
    #[command(description = "статистика (только для администраторов)")]
    Admin,
    #[command(description = "статистика (только для администраторов)")]
    Stats,
    #[command(description = "пользователи с контактами (только для администраторов)")]
    Users,
    #[command(description = "выгрузка контактов в CSV (только для администраторов)")]
    Export,
    #[command(description = "рассылка всем пользователям (только для администраторов)")]
    Broadcast,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

impl From<Command> for Trigger {
    fn from(command: Command) -> Self {
        match command {
            Command::Start => Trigger::Start,
            Command::MyId => Trigger::MyId,
            Command::Admin | Command::Stats => Trigger::Stats,
            Command::Users => Trigger::Users,
            Command::Export => Trigger::Export,
            Command::Broadcast => Trigger::Broadcast,
            Command::Cancel => Trigger::Cancel,
        }
    }
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid API URL or HTTP client failure
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    let token = config.require_bot_token()?;
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    // Check if local Bot API server is configured
    let bot = match &config.bot_api_url {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Removes any webhook and discards updates that queued up while the bot was offline
pub async fn skip_pending_updates(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.delete_webhook().drop_pending_updates(true).await?;
    Ok(())
}
