use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated across layout passes.
#[derive(Debug, Default, Clone)]
pub struct RuntimeMetrics {
    passes: u64,
    failed_passes: u64,
    rerenders: u64,
    resizes: u64,
    deferred_actions: u64,
    unknown_views: u64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&mut self, succeeded: bool) {
        self.passes = self.passes.saturating_add(1);
        if !succeeded {
            self.failed_passes = self.failed_passes.saturating_add(1);
        }
    }

    pub fn record_rerenders(&mut self, count: usize) {
        self.rerenders = self.rerenders.saturating_add(count as u64);
    }

    pub fn record_resize(&mut self) {
        self.resizes = self.resizes.saturating_add(1);
    }

    pub fn record_deferred(&mut self, count: usize) {
        self.deferred_actions = self.deferred_actions.saturating_add(count as u64);
    }

    pub fn record_unknown_views(&mut self, count: usize) {
        self.unknown_views = self.unknown_views.saturating_add(count as u64);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            passes: self.passes,
            failed_passes: self.failed_passes,
            rerenders: self.rerenders,
            resizes: self.resizes,
            deferred_actions: self.deferred_actions,
            unknown_views: self.unknown_views,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub passes: u64,
    pub failed_passes: u64,
    pub rerenders: u64,
    pub resizes: u64,
    pub deferred_actions: u64,
    pub unknown_views: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "layout_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("passes".to_string(), json!(self.passes));
        map.insert("failed_passes".to_string(), json!(self.failed_passes));
        map.insert("rerenders".to_string(), json!(self.rerenders));
        map.insert("resizes".to_string(), json!(self.resizes));
        map.insert("deferred_actions".to_string(), json!(self.deferred_actions));
        map.insert("unknown_views".to_string(), json!(self.unknown_views));
        map
    }
}
