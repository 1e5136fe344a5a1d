//! Test doubles for the bot's collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use teloxide::{ApiError as TgApiError, RequestError};

use super::telegram::{
    Chat, CommandMessage, InlineQuery, QueryAnswer, Recipient, Sender, Telegram,
};
use super::{BotError, BotOptions, FabBot};
use crate::fabdb::{ApiError, Card, CardSource};
use crate::metrics::{BotMetrics, EventType};

/// Records every outgoing call.
#[derive(Default)]
pub struct RecordingTelegram {
    sent: Mutex<Vec<(Recipient, String)>>,
    answers: Mutex<Vec<(String, QueryAnswer)>>,
    fail: bool,
}

impl RecordingTelegram {
    pub fn sent(&self) -> Vec<(Recipient, String)> {
        self.sent.lock().clone()
    }

    pub fn answers(&self) -> Vec<(String, QueryAnswer)> {
        self.answers.lock().clone()
    }
}

#[async_trait]
impl Telegram for RecordingTelegram {
    async fn send(&self, to: Recipient, text: &str) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Telegram(RequestError::Api(TgApiError::BotBlocked)));
        }
        self.sent.lock().push((to, text.to_string()));
        Ok(())
    }

    async fn answer(&self, query: &InlineQuery, answer: QueryAnswer) -> Result<(), BotError> {
        if self.fail {
            return Err(BotError::Telegram(RequestError::Api(TgApiError::InvalidQueryId)));
        }
        self.answers.lock().push((query.id.clone(), answer));
        Ok(())
    }
}

/// Serves a fixed card list; behaves like fabdb.net on an empty search.
#[derive(Default)]
pub struct StaticCards {
    cards: Vec<Card>,
    delay: Option<Duration>,
    lookups: Mutex<Vec<String>>,
}

impl StaticCards {
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl CardSource for StaticCards {
    async fn list_cards(&self, query: &str) -> Result<Vec<Card>, ApiError> {
        self.lookups.lock().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.cards.is_empty() {
            return Err(ApiError::NoCards);
        }
        Ok(self.cards.clone())
    }

    async fn get_card(&self, identifier: &str) -> Result<Card, ApiError> {
        let identifier = identifier.to_lowercase();
        self.lookups.lock().push(identifier.clone());
        self.cards
            .iter()
            .find(|c| c.identifier.to_lowercase() == identifier)
            .cloned()
            .ok_or(ApiError::NoCards)
    }
}

/// In-memory counters.
#[derive(Default)]
pub struct CountingMetrics {
    commands: Mutex<HashMap<String, u64>>,
    incoming: Mutex<HashMap<EventType, u64>>,
    outgoing: Mutex<HashMap<EventType, u64>>,
}

impl CountingMetrics {
    pub fn command(&self, name: &str) -> u64 {
        self.commands.lock().get(name).copied().unwrap_or(0)
    }

    pub fn total_commands(&self) -> u64 {
        self.commands.lock().values().sum()
    }

    pub fn incoming(&self, event_type: EventType) -> u64 {
        self.incoming.lock().get(&event_type).copied().unwrap_or(0)
    }

    pub fn outgoing(&self, event_type: EventType) -> u64 {
        self.outgoing.lock().get(&event_type).copied().unwrap_or(0)
    }
}

impl BotMetrics for CountingMetrics {
    fn inc_commands(&self, command: &str) {
        *self.commands.lock().entry(command.to_string()).or_default() += 1;
    }

    fn inc_events_incoming(&self, event_type: EventType) {
        *self.incoming.lock().entry(event_type).or_default() += 1;
    }

    fn inc_events_outgoing(&self, event_type: EventType) {
        *self.outgoing.lock().entry(event_type).or_default() += 1;
    }
}

/// A bot wired to test doubles, with handles to inspect them.
pub struct TestBot {
    pub bot: FabBot,
    pub telegram: Arc<RecordingTelegram>,
    pub cards: Arc<StaticCards>,
    pub metrics: Arc<CountingMetrics>,
}

impl TestBot {
    pub fn builder() -> TestBotBuilder {
        TestBotBuilder::default()
    }
}

#[derive(Default)]
pub struct TestBotBuilder {
    allowlist: Vec<u64>,
    cards: Vec<Card>,
    card_delay: Option<Duration>,
    query_timeout: Option<Duration>,
    failing_telegram: bool,
}

impl TestBotBuilder {
    pub fn allowlist(mut self, ids: Vec<u64>) -> Self {
        self.allowlist = ids;
        self
    }

    pub fn cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    pub fn slow_cards(mut self, delay: Duration, query_timeout: Duration) -> Self {
        self.card_delay = Some(delay);
        self.query_timeout = Some(query_timeout);
        self
    }

    pub fn failing_telegram(mut self) -> Self {
        self.failing_telegram = true;
        self
    }

    pub fn build(self) -> TestBot {
        let telegram = Arc::new(RecordingTelegram {
            fail: self.failing_telegram,
            ..Default::default()
        });
        let cards = Arc::new(StaticCards {
            cards: self.cards,
            delay: self.card_delay,
            ..Default::default()
        });
        let metrics = Arc::new(CountingMetrics::default());

        let mut options = BotOptions {
            allowlist: self.allowlist,
            ..Default::default()
        };
        if let Some(timeout) = self.query_timeout {
            options.query_timeout = timeout;
        }

        let bot = FabBot::new(cards.clone(), telegram.clone(), metrics.clone(), options);
        TestBot {
            bot,
            telegram,
            cards,
            metrics,
        }
    }
}

pub fn sender(id: u64) -> Sender {
    Sender {
        id,
        is_bot: false,
        first_name: "Bravo".to_string(),
        username: Some("bravo_showstopper".to_string()),
    }
}

pub fn bot_sender(id: u64) -> Sender {
    Sender {
        is_bot: true,
        ..sender(id)
    }
}

pub fn private_message(sender_id: u64, text: &str) -> CommandMessage {
    CommandMessage {
        text: text.to_string(),
        sender: sender(sender_id),
        chat: Chat {
            id: sender_id as i64,
            is_private: true,
        },
        is_service: false,
    }
}

pub fn group_message(sender_id: u64, text: &str) -> CommandMessage {
    CommandMessage {
        chat: Chat {
            id: -1001234,
            is_private: false,
        },
        ..private_message(sender_id, text)
    }
}

pub fn service_message(sender_id: u64) -> CommandMessage {
    CommandMessage {
        is_service: true,
        ..group_message(sender_id, "")
    }
}

pub fn inline_query(sender_id: u64, text: &str) -> InlineQuery {
    InlineQuery {
        id: format!("query-{sender_id}"),
        text: text.to_string(),
        sender: sender(sender_id),
    }
}

pub fn card(i: usize) -> Card {
    Card {
        identifier: format!("WTR{i:03}"),
        name: format!("Card {i}"),
        text: format!("Rules text {i}"),
        rarity: "C".to_string(),
        image: format!("https://images.example.com/WTR{i:03}.png"),
        ..Default::default()
    }
}
