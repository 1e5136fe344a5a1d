//! Telegram transport seam.
//!
//! Handlers work on the plain event types defined here and reply through the
//! [`Telegram`] trait. [`TeloxideTelegram`] is the production adapter; tests
//! substitute a recording double.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    InlineQuery as TgInlineQuery, InlineQueryResult, InlineQueryResultPhoto, MessageKind, User,
};
use tracing::warn;
use url::Url;

use super::BotError;

/// The user behind an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.0,
            is_bot: user.is_bot,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
        }
    }
}

/// Chat a command was sent in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub is_private: bool,
}

/// A command message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandMessage {
    pub text: String,
    pub sender: Sender,
    pub chat: Chat,
    /// Service messages (joins, pins, ...) and posts without a user sender.
    pub is_service: bool,
}

impl CommandMessage {
    pub fn from_telegram(msg: &Message) -> Self {
        let sender = msg.from.as_ref().map(Sender::from);
        let is_service = sender.is_none() || !matches!(msg.kind, MessageKind::Common(_));

        Self {
            text: msg.text().unwrap_or_default().to_string(),
            sender: sender.unwrap_or_default(),
            chat: Chat {
                id: msg.chat.id.0,
                is_private: msg.chat.is_private(),
            },
            is_service,
        }
    }
}

/// An inline query (`@bot some text`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineQuery {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl InlineQuery {
    pub fn from_telegram(query: &TgInlineQuery) -> Self {
        Self {
            id: query.id.clone(),
            text: query.query.clone(),
            sender: Sender::from(&query.from),
        }
    }
}

/// Where a text reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Private chat with a user.
    User(u64),
    Chat(i64),
}

/// One photo result of an inline query answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineResult {
    pub id: String,
    pub title: String,
    pub description: String,
    pub photo_url: String,
    pub thumbnail_url: String,
}

/// Full answer to an inline query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAnswer {
    pub results: Vec<InlineResult>,
    /// Seconds clients may cache the answer.
    pub cache_time: u32,
}

/// Outgoing Telegram calls used by the handlers.
#[async_trait]
pub trait Telegram: Send + Sync {
    async fn send(&self, to: Recipient, text: &str) -> Result<(), BotError>;

    async fn answer(&self, query: &InlineQuery, answer: QueryAnswer) -> Result<(), BotError>;
}

/// [`Telegram`] on top of a teloxide [`Bot`].
#[derive(Clone)]
pub struct TeloxideTelegram {
    bot: Bot,
}

impl TeloxideTelegram {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Telegram for TeloxideTelegram {
    async fn send(&self, to: Recipient, text: &str) -> Result<(), BotError> {
        let chat_id = match to {
            Recipient::User(id) => ChatId::from(UserId(id)),
            Recipient::Chat(id) => ChatId(id),
        };

        self.bot
            .send_message(chat_id, text)
            .await?;
        Ok(())
    }

    async fn answer(&self, query: &InlineQuery, answer: QueryAnswer) -> Result<(), BotError> {
        let results: Vec<InlineQueryResult> =
            answer.results.into_iter().filter_map(photo_result).collect();

        self.bot
            .answer_inline_query(query.id.clone(), results)
            .cache_time(answer.cache_time)
            .await?;
        Ok(())
    }
}

/// Telegram rejects the whole answer if one URL is invalid, so bad ones are
/// dropped here.
fn photo_result(result: InlineResult) -> Option<InlineQueryResult> {
    let urls = Url::parse(&result.photo_url).and_then(|photo| {
        Url::parse(&result.thumbnail_url).map(|thumbnail| (photo, thumbnail))
    });

    match urls {
        Ok((photo, thumbnail)) => Some(InlineQueryResult::Photo(
            InlineQueryResultPhoto::new(result.id, photo, thumbnail)
                .title(result.title)
                .description(result.description),
        )),
        Err(e) => {
            warn!(result_id = %result.id, url = %result.photo_url, error = %e, "Skipping result with invalid image URL");
            None
        }
    }
}
