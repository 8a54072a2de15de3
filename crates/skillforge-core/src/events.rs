//! Run event recording.
//!
//! Every provider call in a run is recorded as a named event with a JSON
//! payload. The file-backed implementation lives in skillforge-infra; `()`
//! discards events and is what tests use.

use std::sync::Arc;

/// Sink for structured per-run events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &str, data: serde_json::Value);
}

impl EventSink for () {
    fn record(&self, _event: &str, _data: serde_json::Value) {}
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn record(&self, event: &str, data: serde_json::Value) {
        (**self).record(event, data);
    }
}
