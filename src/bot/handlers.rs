//! Command and inline query handlers.

use tokio::time::timeout;
use tracing::{info, warn};

use super::telegram::{CommandMessage, InlineQuery, InlineResult, QueryAnswer, Recipient};
use super::{BotError, FabBot};
use crate::fabdb::{Card, unique_sets_from_printings};

/// Seconds Telegram clients may cache an inline answer.
pub const QUERY_CACHE_TIME: u32 = 60;

const RESPONSE_HELP: &str = "\
I'm a Flesh and Blood TCG Bot 🤖 on steroids for Telegram. I will send you card information directly into your telegram channels!
You can find out more about me using /about

You can share card information from everywhere by simply typing @fabtcg_bot followed by a card query in your chat window.

👇 Available commands:
/start - Say hello!
/stop - Say Goodbye!
/card <identifier> - Show a single card, e.g. /card WTR001
/id - Sends you your Telegram ID (works for all users!).
";

const RESPONSE_ABOUT: &str = "\
This Telegram Bot is a non-commercial hobby project and is developed as open source software for fans of the FaB TCG!

The data of this bot is provided by https://fabdb.net.

This Bot is in no way affiliated with Legend Story Studios®. All intellectual IP belongs to Legend Story Studios®, \
Flesh & Blood™, and set names are trademarks of Legend Story Studios®. Flesh and Blood™ characters, cards, logos, \
and art are property of Legend Story Studios®.
";

const RESPONSE_CARD_USAGE: &str = "Usage: /card <identifier>, e.g. /card WTR001";

fn start_text(first_name: &str) -> String {
    format!(
        "Hi, {first_name}! 👋 Check out /help for further details.\n\
         You can share card information from everywhere by simply typing @fabtcg_bot followed by a card query in your chat window.\n\
         Data is provided by https://fabdb.net."
    )
}

fn stop_text(first_name: &str) -> String {
    format!("Alright, {first_name}! I won't talk to you again 🙊. Check out /help for further details.")
}

fn id_text(user_id: u64) -> String {
    format!("Your user id is {user_id}")
}

/// Plain-text summary of a single card.
fn card_text(card: &Card) -> String {
    let mut text = card.name.clone();
    if !card.rarity.is_empty() {
        text.push_str(&format!(" ({})", card.rarity));
    }
    text.push('\n');

    if !card.keywords.is_empty() {
        text.push_str(&format!("Keywords: {}\n", card.keywords.join(", ")));
    }

    let sets = unique_sets_from_printings(&card.printings);
    if !sets.is_empty() {
        text.push_str(&format!("Sets: {}\n", sets.join(", ")));
    }

    if !card.text.is_empty() {
        text.push('\n');
        text.push_str(&card.text);
    }

    text
}

/// Map cards 1:1 to photo results; ids are the batch index.
pub fn inline_results(cards: &[Card]) -> Vec<InlineResult> {
    cards
        .iter()
        .enumerate()
        .map(|(i, card)| InlineResult {
            id: i.to_string(),
            title: card.name.clone(),
            description: card.text.clone(),
            photo_url: card.image.clone(),
            thumbnail_url: card.image.clone(),
        })
        .collect()
}

impl FabBot {
    pub(crate) async fn handle_start(&self, msg: &CommandMessage) -> Result<(), BotError> {
        info!(
            username = ?msg.sender.username,
            user_id = msg.sender.id,
            "User executed start command"
        );

        self.telegram
            .send(Recipient::User(msg.sender.id), &start_text(&msg.sender.first_name))
            .await
    }

    pub(crate) async fn handle_stop(&self, msg: &CommandMessage) -> Result<(), BotError> {
        info!(
            username = ?msg.sender.username,
            user_id = msg.sender.id,
            "User executed stop command"
        );

        self.telegram
            .send(Recipient::User(msg.sender.id), &stop_text(&msg.sender.first_name))
            .await
    }

    pub(crate) async fn handle_help(&self, msg: &CommandMessage) -> Result<(), BotError> {
        info!(
            username = ?msg.sender.username,
            user_id = msg.sender.id,
            "User executed help command"
        );

        self.telegram
            .send(Recipient::Chat(msg.chat.id), RESPONSE_HELP)
            .await
    }

    pub(crate) async fn handle_about(&self, msg: &CommandMessage) -> Result<(), BotError> {
        info!(
            username = ?msg.sender.username,
            user_id = msg.sender.id,
            "User executed about command"
        );

        self.telegram
            .send(Recipient::Chat(msg.chat.id), RESPONSE_ABOUT)
            .await
    }

    /// Only answered in private chats.
    pub(crate) async fn handle_id(&self, msg: &CommandMessage) -> Result<(), BotError> {
        info!(
            username = ?msg.sender.username,
            user_id = msg.sender.id,
            "User executed id command"
        );

        if !msg.chat.is_private {
            return Ok(());
        }

        self.telegram
            .send(Recipient::Chat(msg.chat.id), &id_text(msg.sender.id))
            .await
    }

    pub(crate) async fn handle_card(&self, msg: &CommandMessage) -> Result<(), BotError> {
        let Some(identifier) = msg.text.split_whitespace().nth(1) else {
            return self
                .telegram
                .send(Recipient::Chat(msg.chat.id), RESPONSE_CARD_USAGE)
                .await;
        };

        info!(user_id = msg.sender.id, identifier, "User executed card command");

        let card = self.cards.get_card(identifier).await?;
        self.telegram
            .send(Recipient::Chat(msg.chat.id), &card_text(&card))
            .await
    }

    pub(crate) async fn handle_query(&self, query: &InlineQuery) -> Result<(), BotError> {
        let cards = match timeout(self.query_timeout, self.cards.list_cards(&query.text)).await {
            Ok(Ok(cards)) => cards,
            Ok(Err(e)) => {
                warn!(
                    from = query.sender.id,
                    query = %query.text,
                    status = ?e.status(),
                    error = %e,
                    "Failed to query cards"
                );
                return Err(e.into());
            }
            Err(_) => {
                warn!(from = query.sender.id, query = %query.text, "Card search timed out");
                return Err(BotError::Timeout(self.query_timeout));
            }
        };

        let answer = QueryAnswer {
            results: inline_results(&cards),
            cache_time: QUERY_CACHE_TIME,
        };

        self.telegram.answer(query, answer).await.inspect_err(|e| {
            warn!(from = query.sender.id, query = %query.text, error = %e, "Failed to send query response");
        })
    }
}
