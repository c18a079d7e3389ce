use crate::engine::events::DebugEvent;

pub trait EventSink: Send {
    fn emit(&mut self, event: DebugEvent);
}
