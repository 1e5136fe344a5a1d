//! Bot module - Core bot functionality.
//!
//! - `allowlist` - which senders get answers
//! - `telegram` - event types and the outgoing Telegram seam
//! - `middleware` - metrics, filtering and error policy around handlers
//! - `handlers` - one handler per command and for inline queries
//! - `dispatcher` - teloxide command parsing and routing
//! - `runtime` - long-polling runner with cooperative shutdown

mod allowlist;
pub mod dispatcher;
mod handlers;
mod middleware;
mod runtime;
pub mod telegram;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::fabdb::{ApiError, CardSource};
use crate::metrics::BotMetrics;

pub use runtime::run;
pub use telegram::TeloxideTelegram;

use allowlist::Allowlist;
use telegram::Telegram;

/// Errors a handler can return. The middleware logs them; they never reach
/// the dispatcher.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("telegram request failed: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("card lookup failed: {0}")]
    Cards(#[from] ApiError),

    #[error("card search timed out after {0:?}")]
    Timeout(Duration),
}

/// Construction options for [`FabBot`].
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// User ids allowed to use the bot. Empty allows everyone.
    pub allowlist: Vec<u64>,

    /// Deadline for a single inline card search.
    pub query_timeout: Duration,

    pub started_at: DateTime<Utc>,

    /// Build revision, logged at startup.
    pub revision: String,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            allowlist: Vec::new(),
            query_timeout: Duration::from_secs(10),
            started_at: Utc::now(),
            revision: String::new(),
        }
    }
}

/// The card bot: its collaborators plus the immutable allowlist.
pub struct FabBot {
    cards: Arc<dyn CardSource>,
    telegram: Arc<dyn Telegram>,
    metrics: Arc<dyn BotMetrics>,
    allowlist: Allowlist,
    query_timeout: Duration,
    started_at: DateTime<Utc>,
    revision: String,
}

impl FabBot {
    pub fn new(
        cards: Arc<dyn CardSource>,
        telegram: Arc<dyn Telegram>,
        metrics: Arc<dyn BotMetrics>,
        options: BotOptions,
    ) -> Self {
        Self {
            cards,
            telegram,
            metrics,
            allowlist: Allowlist::new(options.allowlist),
            query_timeout: options.query_timeout,
            started_at: options.started_at,
            revision: options.revision,
        }
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }
}
