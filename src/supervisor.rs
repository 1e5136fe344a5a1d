//! Process supervisor.
//!
//! Runs the long-lived actors (bot, HTTP server, signal watcher) side by
//! side. Whichever finishes first cancels the shared token, the others wind
//! down, and the first error becomes the result.

use std::future::Future;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A group of actors sharing one cancellation token.
pub struct Supervisor {
    cancel: CancellationToken,
    actors: JoinSet<(&'static str, anyhow::Result<()>)>,
}

impl Supervisor {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            actors: JoinSet::new(),
        }
    }

    /// Start an actor. It must return once the token is cancelled.
    pub fn spawn<F>(&mut self, name: &'static str, actor: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        debug!(actor = name, "Starting actor");
        self.actors.spawn(async move { (name, actor.await) });
    }

    /// Wait for every actor, cancelling the rest as soon as one returns.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut first_error = None;

        while let Some(joined) = self.actors.join_next().await {
            let result = match joined {
                Ok((name, result)) => {
                    debug!(actor = name, "Actor finished");
                    result.map_err(|e| e.context(format!("{name} failed")))
                }
                Err(e) => Err(anyhow!("actor task failed: {e}")),
            };

            if let Err(e) = result {
                error!(error = %format!("{e:#}"), "Actor failed");
                first_error.get_or_insert(e);
            }

            if !self.cancel.is_cancelled() {
                info!("Shutting down");
                self.cancel.cancel();
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Return on SIGINT, SIGTERM, or once `cancel` fires.
pub async fn wait_for_signal(cancel: CancellationToken) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT, initiating shutdown");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating shutdown");
            }
            _ = cancel.cancelled() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, initiating shutdown");
            }
            _ = cancel.cancelled() => {}
        }
    }

    Ok(())
}
