//! Bot metrics.
//!
//! The bot only talks to the [`BotMetrics`] trait. [`PrometheusMetrics`]
//! is the production backend and also renders the `/metrics` page.

mod prometheus;

pub use prometheus::PrometheusMetrics;

/// Namespace used when no prefix is configured.
pub const DEFAULT_NAMESPACE: &str = "fabtcgbot";

/// Kind of Telegram event, used as the `type` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Message,
    InlineQuery,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::InlineQuery => "inline",
        }
    }
}

/// Counters the dispatch middleware records.
///
/// Implementations must be safe to call concurrently from every handler task.
pub trait BotMetrics: Send + Sync {
    /// Count one executed command, labelled by its name (e.g. `/start`).
    fn inc_commands(&self, command: &str);

    /// Count one event received from Telegram.
    fn inc_events_incoming(&self, event_type: EventType);

    /// Count one event successfully answered.
    fn inc_events_outgoing(&self, event_type: EventType);
}

/// Metrics settings.
#[derive(Debug, Clone)]
pub struct MetricsOptions {
    /// Serve `/metrics`. Counters are recorded either way.
    pub enabled: bool,

    /// Replaces [`DEFAULT_NAMESPACE`] when not empty.
    pub prefix: String,

    /// Export `process_*` metrics (CPU, memory, open fds) on each render.
    pub runtime: bool,

    /// Serve a CPU profile under `/debug/pprof/`.
    pub profile: bool,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: String::new(),
            runtime: true,
            profile: false,
        }
    }
}

impl MetricsOptions {
    /// Metric namespace: the prefix without a trailing `.`, or the default.
    pub fn namespace(&self) -> String {
        if self.prefix.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            self.prefix.trim_end_matches('.').to_string()
        }
    }
}
