use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use tracing::{error, info};

use crate::config::TelegramConfig;
use crate::error::{RegistryError, Result};
use crate::notify::{formatters, ClaimNotice, Notifier};

/// Pushes claim summaries to the host's Telegram chats
pub struct TelegramNotifier {
    bot: Bot,
    chat_ids: Vec<i64>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        info!("Telegram notifications enabled for {} chats", config.chat_ids.len());
        Self {
            bot: Bot::new(config.bot_token.clone()),
            chat_ids: config.chat_ids.clone(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn channel(&self) -> &'static str {
        "telegram"
    }

    async fn verify(&self) -> Result<()> {
        let me = self.bot.get_me().await?;
        info!("Telegram bot @{} ready", me.username());
        Ok(())
    }

    async fn notify(&self, notice: &ClaimNotice) -> Result<()> {
        let message = formatters::telegram_html(notice);
        let mut failed = 0;

        for chat_id in &self.chat_ids {
            if let Err(e) = self
                .bot
                .send_message(ChatId(*chat_id), message.clone())
                .parse_mode(ParseMode::Html)
                .await
            {
                error!("Failed to send notification to chat {}: {}", chat_id, e);
                failed += 1;
            } else {
                info!("Notification sent to chat {}", chat_id);
            }
        }

        if failed > 0 {
            return Err(RegistryError::Other(anyhow::anyhow!(
                "{} of {} Telegram chats were not notified",
                failed,
                self.chat_ids.len()
            )));
        }
        Ok(())
    }
}
