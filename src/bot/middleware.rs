//! Handler middleware.
//!
//! Every message and inline query passes through one of the two wrappers
//! below before reaching its handler. Incoming events are always counted;
//! commands and outgoing events only once they get past the filters. A
//! failing or panicking handler is logged and swallowed so the dispatch loop
//! keeps running.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::telegram::{CommandMessage, InlineQuery};
use super::{BotError, FabBot};
use crate::metrics::EventType;

/// Answered for every sender, so users can look up the id to get allowlisted.
pub const BYPASS_COMMAND: &str = "/id";

/// Inline queries this short (in characters) are ignored.
pub const MIN_QUERY_CHARS: usize = 3;

/// First whitespace-delimited token of a message, e.g. `/start`.
pub fn command_name(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or_default()
}

impl FabBot {
    /// Run `next` for a command message.
    pub(crate) async fn message_middleware<'a, F, Fut>(&'a self, msg: &'a CommandMessage, next: F)
    where
        F: FnOnce(&'a FabBot, &'a CommandMessage) -> Fut,
        Fut: Future<Output = Result<(), BotError>>,
    {
        self.metrics.inc_events_incoming(EventType::Message);

        if msg.is_service || msg.sender.is_bot {
            return;
        }

        if !self.allowlist.contains(msg.sender.id) && msg.text != BYPASS_COMMAND {
            info!(
                sender_id = msg.sender.id,
                sender_username = ?msg.sender.username,
                "Received message from forbidden sender"
            );
            return;
        }

        let command = command_name(&msg.text);
        self.metrics.inc_commands(command);

        debug!(text = %msg.text, "Received message");

        if let Err(e) = run_handler(next(self, msg)).await {
            warn!(command, error = %e, "Failed to handle bot command");
            return;
        }

        self.metrics.inc_events_outgoing(EventType::Message);
    }

    /// Run `next` for an inline query.
    pub(crate) async fn query_middleware<'a, F, Fut>(&'a self, query: &'a InlineQuery, next: F)
    where
        F: FnOnce(&'a FabBot, &'a InlineQuery) -> Fut,
        Fut: Future<Output = Result<(), BotError>>,
    {
        self.metrics.inc_events_incoming(EventType::InlineQuery);

        if query.sender.is_bot || query.text.chars().count() <= MIN_QUERY_CHARS {
            return;
        }

        if !self.allowlist.contains(query.sender.id) && query.text != BYPASS_COMMAND {
            info!(
                sender_id = query.sender.id,
                sender_username = ?query.sender.username,
                "Received inline query from forbidden sender"
            );
            return;
        }

        debug!(text = %query.text, "Received inline query");

        if let Err(e) = run_handler(next(self, query)).await {
            warn!(error = %e, "Failed to handle inline query");
            return;
        }

        self.metrics.inc_events_outgoing(EventType::InlineQuery);
    }
}

/// Await a handler, turning a panic into an error.
async fn run_handler<Fut>(handler: Fut) -> Result<(), String>
where
    Fut: Future<Output = Result<(), BotError>>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => {
            error!("Handler panicked");
            Err("handler panicked".to_string())
        }
    }
}
