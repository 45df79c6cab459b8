//! Outbound replies.

use engine::BoxFuture;
use teloxide::{prelude::*, types::ChatId};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid recipient \"{0}\"")]
    InvalidRecipient(String),
    #[error(transparent)]
    Request(#[from] teloxide::RequestError),
}

/// Delivers a text reply to whoever sent an event.
pub trait Outbox: Send + Sync {
    fn send<'a>(&'a self, recipient: &'a str, text: String) -> BoxFuture<'a, Result<(), TransportError>>;
}

/// Replies through the Bot API. Recipients are chat ids.
#[derive(Clone, Debug)]
pub(crate) struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub(crate) fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

pub(crate) fn parse_chat_id(recipient: &str) -> Result<ChatId, TransportError> {
    recipient
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| TransportError::InvalidRecipient(recipient.to_string()))
}

impl Outbox for TelegramOutbox {
    fn send<'a>(&'a self, recipient: &'a str, text: String) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let chat_id = parse_chat_id(recipient)?;
            self.bot.send_message(chat_id, text).await?;
            Ok(())
        })
    }
}
