use crate::engine::events::{DebugEvent, DebugEventKind};
use crate::engine::sink::EventSink;

/// An in-memory event sink that keeps every event of a single request.
///
/// Used to assert which stages a request went through.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Vec<DebugEvent>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event kinds in emission order.
    pub fn kinds(&self) -> Vec<DebugEventKind> {
        self.events.iter().map(|e| e.kind).collect()
    }

    pub fn saw(&self, kind: DebugEventKind) -> bool {
        self.events.iter().any(|e| e.kind == kind)
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&mut self, event: DebugEvent) {
        self.events.push(event);
    }
}
