//! Bot runtime - long-polling runner.

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::FabBot;
use super::dispatcher::build_dispatcher;

/// Poll interval while the dispatcher has not started yet.
const SHUTDOWN_RETRY: Duration = Duration::from_millis(100);

/// Run the receive loop until `cancel` fires.
pub async fn run(bot: Bot, fab: Arc<FabBot>, cancel: CancellationToken) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        revision = %fab.revision,
        started_at = %fab.started_at.to_rfc3339(),
        "Starting bot in polling mode"
    );

    if fab.allowlist().is_empty() {
        info!("No allowlist configured, answering everyone");
    } else {
        info!(size = fab.allowlist().len(), "Allowlist configured");
    }

    let mut dispatcher = build_dispatcher(bot, fab);
    let shutdown = dispatcher.shutdown_token();

    let stopper = tokio::spawn(async move {
        cancel.cancelled().await;
        loop {
            match shutdown.shutdown() {
                Ok(done) => {
                    done.await;
                    break;
                }
                // Dispatcher is not running yet.
                Err(_) => tokio::time::sleep(SHUTDOWN_RETRY).await,
            }
        }
        debug!("Dispatcher stopped");
    });

    dispatcher.dispatch().await;
    stopper.abort();

    info!("Bot stopped");
    Ok(())
}
