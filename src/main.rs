//! fabtcg-bot - Flesh and Blood TCG card bot for Telegram
//!
//! Answers commands and inline queries with card data from fabdb.net.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `fabdb` - fabdb.net REST client
//! - `metrics` - Prometheus counters
//! - `bot` - Allowlist, middleware, handlers and the polling runner
//! - `server` - Health and metrics HTTP endpoints
//! - `profiling` - pprof CPU profiles (unix only)
//! - `supervisor` - Runs everything until the first actor stops

mod bot;
mod config;
mod fabdb;
mod metrics;
#[cfg(unix)]
mod profiling;
mod server;
mod supervisor;

use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::bot::{BotOptions, FabBot, TeloxideTelegram};
use crate::config::Config;
use crate::fabdb::{ClientOptions, FabDbClient};
use crate::metrics::PrometheusMetrics;
use crate::supervisor::Supervisor;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Bot construction failed.
const EXIT_INIT: u8 = 2;

/// Build revision, set by the build environment.
const REVISION: &str = match option_env!("FABTCG_BOT_REVISION") {
    Some(revision) => revision,
    None => "unknown",
};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("fabtcg-bot: {e}");
            return ExitCode::from(EXIT_INIT);
        }
    };

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let started_at = Utc::now();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting fabtcg-bot");

    let metrics = PrometheusMetrics::new(&config.metrics);

    let cards = match FabDbClient::new(ClientOptions {
        endpoint: config.fabdb_endpoint.clone(),
        timeout: config.fabdb_timeout,
    }) {
        Ok(cards) => cards,
        Err(e) => {
            error!(error = %e, "Failed to create fabdb.net client");
            return ExitCode::from(EXIT_INIT);
        }
    };

    let telegram = Bot::new(&config.bot_token);
    match telegram.get_me().await {
        Ok(me) => info!(username = %me.username(), "Bot authorized"),
        Err(e) => {
            error!(error = %e, "Failed to create Telegram bot");
            return ExitCode::from(EXIT_INIT);
        }
    }

    let fab = Arc::new(FabBot::new(
        Arc::new(cards),
        Arc::new(TeloxideTelegram::new(telegram.clone())),
        Arc::new(metrics.clone()),
        BotOptions {
            allowlist: config.admin_ids.clone(),
            query_timeout: config.query_timeout,
            started_at,
            revision: REVISION.to_string(),
        },
    ));

    let router = server::router(
        config.metrics.enabled.then_some(metrics),
        config.metrics.profile,
    );

    let cancel = CancellationToken::new();
    let mut supervisor = Supervisor::new(cancel.clone());
    supervisor.spawn("bot", bot::run(telegram, fab, cancel.clone()));
    supervisor.spawn("http", server::serve(config.http_addr, router, cancel.clone()));
    supervisor.spawn("signals", crate::supervisor::wait_for_signal(cancel));

    match supervisor.run().await {
        Ok(()) => {
            info!("Bye");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Exiting with error");
            ExitCode::FAILURE
        }
    }
}
