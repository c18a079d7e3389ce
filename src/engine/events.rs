use crate::request_id::RequestId;
use std::time::SystemTime;

/// Stage transitions of one debug request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugEventKind {
    RequestAccepted,
    SyntaxCheckStarted,
    SyntaxFailed,
    ExecutionStarted,
    ExecutionFinished,
    ExplanationRequested,
    Responded,
}

#[derive(Debug, Clone)]
pub struct DebugEvent {
    pub request_id: RequestId,
    pub kind: DebugEventKind,
    pub timestamp: SystemTime,
}

impl DebugEvent {
    pub fn new(request_id: &RequestId, kind: DebugEventKind) -> Self {
        Self {
            request_id: request_id.clone(),
            kind,
            timestamp: SystemTime::now(),
        }
    }
}
