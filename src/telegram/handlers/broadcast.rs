//! Telegram side of the broadcast engine

use async_trait::async_trait;
use teloxide::prelude::*;

use crate::core::broadcast::{run_broadcast, BroadcastJob, Messenger};
use crate::core::config;
use crate::core::error::AppResult;
use crate::telegram::texts;

/// Delivers broadcast messages and reports progress to the admin chat
pub struct TelegramMessenger {
    bot: Bot,
    admin_chat: ChatId,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, admin_chat: ChatId) -> Self {
        Self { bot, admin_chat }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn deliver(&self, user_id: i64, text: &str) -> AppResult<()> {
        // Sent as plain text: the admin typed it, we don't parse it
        self.bot.send_message(ChatId(user_id), text).await?;
        Ok(())
    }

    async fn progress(&self, processed: usize, total: usize) {
        if let Err(e) = self
            .bot
            .send_message(self.admin_chat, texts::broadcast_progress(processed, total))
            .await
        {
            log::warn!("Failed to send broadcast progress: {}", e);
        }
    }
}

/// Runs the job in the background and posts the summary to the admin chat when done
pub fn spawn_broadcast(bot: Bot, admin_chat: ChatId, job: BroadcastJob) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let messenger = TelegramMessenger::new(bot.clone(), admin_chat);
        let report = run_broadcast(&job, &messenger, config::broadcast::send_interval()).await;

        if let Err(e) = bot
            .send_message(admin_chat, texts::broadcast_summary(&report))
            .parse_mode(teloxide::types::ParseMode::Html)
            .await
        {
            log::error!("Failed to send broadcast summary: {}", e);
        }
    })
}
