//! Prometheus backend built on the metrics-rs recorder.
//!
//! Each instance owns its own recorder instead of installing a global one,
//! so several instances can coexist (tests, restarts inside one process).

use std::sync::Arc;

use metrics::{Key, KeyName, Label, Level, Metadata, Recorder, SharedString, with_local_recorder};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use metrics_process::Collector;
use tracing::info;

use super::{BotMetrics, EventType, MetricsOptions};

const SUBSYSTEM: &str = "telegram";

/// Prometheus-backed [`BotMetrics`].
#[derive(Clone)]
pub struct PrometheusMetrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
    /// Process metrics, sampled right before each render.
    process: Option<Arc<Collector>>,
    commands_name: String,
    incoming_name: String,
    outgoing_name: String,
}

impl PrometheusMetrics {
    /// Create the recorder and describe the three counter families.
    pub fn new(opts: &MetricsOptions) -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        let namespace = opts.namespace();
        let metric = |name: &str| format!("{namespace}_{SUBSYSTEM}_{name}");

        let metrics = Self {
            recorder: Arc::new(recorder),
            handle,
            process: opts.runtime.then(|| Arc::new(Collector::default())),
            commands_name: metric("commands_total"),
            incoming_name: metric("events_incoming_total"),
            outgoing_name: metric("events_outgoing_total"),
        };
        metrics.describe();

        info!(namespace = %namespace, runtime = opts.runtime, "Prometheus metrics initialized");
        metrics
    }

    fn describe(&self) {
        let describe = |name: &str, help: &'static str| {
            self.recorder.describe_counter(
                KeyName::from(name.to_string()),
                None,
                SharedString::from(help),
            );
        };

        describe(&self.commands_name, "Total number of command requests.");
        describe(&self.incoming_name, "Total number of incoming messages.");
        describe(&self.outgoing_name, "Total number of outgoing messages.");

        if let Some(process) = &self.process {
            with_local_recorder(self.recorder.as_ref(), || process.describe());
        }
    }

    fn increment(&self, name: &str, label: &'static str, value: String) {
        let key = Key::from_parts(name.to_string(), vec![Label::new(label, value)]);
        let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));
        self.recorder.register_counter(&key, &metadata).increment(1);
    }

    /// Render all counters in the Prometheus text format.
    pub fn render(&self) -> String {
        if let Some(process) = &self.process {
            with_local_recorder(self.recorder.as_ref(), || process.collect());
        }
        self.handle.render()
    }
}

impl BotMetrics for PrometheusMetrics {
    fn inc_commands(&self, command: &str) {
        self.increment(&self.commands_name, "command", command.to_string());
    }

    fn inc_events_incoming(&self, event_type: EventType) {
        self.increment(&self.incoming_name, "type", event_type.as_str().to_string());
    }

    fn inc_events_outgoing(&self, event_type: EventType) {
        self.increment(&self.outgoing_name, "type", event_type.as_str().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render_with_labels() {
        let metrics = PrometheusMetrics::new(&MetricsOptions::default());

        metrics.inc_commands("/start");
        metrics.inc_commands("/start");
        metrics.inc_events_incoming(EventType::Message);
        metrics.inc_events_outgoing(EventType::InlineQuery);

        let output = metrics.render();
        assert!(
            output.contains("fabtcgbot_telegram_commands_total{command=\"/start\"} 2"),
            "got: {output}"
        );
        assert!(output.contains("fabtcgbot_telegram_events_incoming_total{type=\"message\"} 1"));
        assert!(output.contains("fabtcgbot_telegram_events_outgoing_total{type=\"inline\"} 1"));
    }

    #[test]
    fn test_prefix_replaces_namespace() {
        let metrics = PrometheusMetrics::new(&MetricsOptions {
            enabled: true,
            prefix: "cards.".to_string(),
            ..Default::default()
        });

        metrics.inc_events_incoming(EventType::InlineQuery);

        let output = metrics.render();
        assert!(output.contains("cards_telegram_events_incoming_total{type=\"inline\"} 1"), "got: {output}");
        assert!(!output.contains("fabtcgbot_"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = PrometheusMetrics::new(&MetricsOptions::default());
        let b = PrometheusMetrics::new(&MetricsOptions::default());

        a.inc_commands("/help");

        assert!(a.render().contains("command=\"/help\""));
        assert!(!b.render().contains("command=\"/help\""));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_render_includes_process_metrics() {
        let metrics = PrometheusMetrics::new(&MetricsOptions::default());

        let output = metrics.render();
        assert!(output.contains("# HELP process_cpu_seconds_total"), "got: {output}");
        assert!(output.contains("process_resident_memory_bytes "));
    }

    #[test]
    fn test_process_metrics_can_be_disabled() {
        let metrics = PrometheusMetrics::new(&MetricsOptions {
            runtime: false,
            ..Default::default()
        });
        metrics.inc_commands("/start");

        let output = metrics.render();
        assert!(output.contains("command=\"/start\""));
        assert!(!output.contains("process_"), "got: {output}");
    }
}
