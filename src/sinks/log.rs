use crate::engine::events::DebugEvent;
use crate::engine::sink::EventSink;

/// Production sink: every stage transition becomes a debug-level log line
/// tagged with the request's correlation id.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: DebugEvent) {
        tracing::debug!(
            request_id = %event.request_id,
            stage = ?event.kind,
            timestamp = ?event.timestamp,
            "request stage"
        );
    }
}
