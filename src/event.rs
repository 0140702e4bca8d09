use crate::api::{AgentConfig, ChatReply, ChatSession, Tool};
use crate::session::ExecutionStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Everything the background side (tokio tasks, the push subscription) can
/// tell the UI thread. Drained once per frame.
#[derive(Debug)]
pub enum AppEvent {
    StepUpdate {
        session_id: String,
        step: ExecutionStep,
    },
    ChatFinished {
        session_id: String,
        result: Result<ChatReply, String>,
    },
    HistoryLoaded(Result<Vec<ChatSession>, String>),
    ToolsLoaded(Result<Vec<Tool>, String>),
    ConfigLoaded(Result<AgentConfig, String>),
    ConfigSaved(Result<String, String>),
    LinkChanged(LinkState),
}
