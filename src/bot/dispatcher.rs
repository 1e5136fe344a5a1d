//! Message dispatcher setup.
//!
//! Parses commands with teloxide, converts updates into the bot's event
//! types and routes each command through the middleware to its handler.

use std::sync::Arc;

use teloxide::dispatching::{DefaultKey, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::InlineQuery as TgInlineQuery;
use teloxide::utils::command::BotCommands;
use tracing::trace;

use super::FabBot;
use super::telegram::{CommandMessage, InlineQuery};

/// All bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Say hello!")]
    Start(String),

    #[command(description = "Say goodbye!")]
    Stop,

    #[command(description = "Show usage")]
    Help,

    #[command(description = "About this bot")]
    About,

    #[command(description = "Show your Telegram user id")]
    Id,

    #[command(description = "Show a single card by identifier")]
    Card(String),
}

impl FabBot {
    /// Route a parsed command to its handler.
    pub async fn on_command(&self, command: Command, msg: CommandMessage) {
        match command {
            Command::Start(_) => self.message_middleware(&msg, FabBot::handle_start).await,
            Command::Stop => self.message_middleware(&msg, FabBot::handle_stop).await,
            Command::Help => self.message_middleware(&msg, FabBot::handle_help).await,
            Command::About => self.message_middleware(&msg, FabBot::handle_about).await,
            Command::Id => self.message_middleware(&msg, FabBot::handle_id).await,
            Command::Card(_) => self.message_middleware(&msg, FabBot::handle_card).await,
        }
    }

    /// Route an inline query to the card search.
    pub async fn on_inline_query(&self, query: InlineQuery) {
        self.query_middleware(&query, FabBot::handle_query).await
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: Bot,
    fab: Arc<FabBot>,
) -> Dispatcher<Bot, anyhow::Error, DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![fab])
        .default_handler(|update| async move {
            trace!(update_id = ?update.id, "Unhandled update");
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message()
        .branch(teloxide::filter_command::<Command, _>().endpoint(handle_command));

    let inline_handler = Update::filter_inline_query().endpoint(handle_inline_query);

    dptree::entry()
        .branch(message_handler)
        .branch(inline_handler)
}

async fn handle_command(msg: Message, cmd: Command, fab: Arc<FabBot>) -> anyhow::Result<()> {
    fab.on_command(cmd, CommandMessage::from_telegram(&msg)).await;
    Ok(())
}

async fn handle_inline_query(query: TgInlineQuery, fab: Arc<FabBot>) -> anyhow::Result<()> {
    fab.on_inline_query(InlineQuery::from_telegram(&query)).await;
    Ok(())
}
