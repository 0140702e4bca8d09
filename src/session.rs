use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ChatReply;

/// Most recent distinct step numbers kept in the live window.
pub const LIVE_WINDOW_LIMIT: usize = 16;
/// Steps shown in the plan view.
pub const PLAN_DISPLAY_LIMIT: usize = 8;
/// Entries shown in the recent-activity view.
pub const STATUS_DISPLAY_LIMIT: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub steps: Option<Vec<ExecutionStep>>,
}

impl ChatMessage {
    fn new(role: Role, content: String, steps: Option<Vec<ExecutionStep>>) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
            steps,
        }
    }

    pub fn has_steps(&self) -> bool {
        self.steps.as_ref().is_some_and(|steps| !steps.is_empty())
    }
}

/// One thought/action/observation unit of agent progress. Reported live over
/// the push channel and again, finalized, inside the chat response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub step_num: u32,
    #[serde(default)]
    pub thought: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub action_input: Value,
    #[serde(default)]
    pub observation: String,
}

impl ExecutionStep {
    pub fn is_completed(&self) -> bool {
        !self.observation.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Running,
}

/// All state scoped to the active conversation. Owned by the app and passed
/// by reference into event handlers; replaced wholesale when the session id
/// changes.
pub struct SessionState {
    session_id: String,
    messages: Vec<ChatMessage>,
    pub input: String,
    live_steps: Vec<ExecutionStep>,
    busy: bool,
    agent_state: AgentState,
}

impl SessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            input: String::new(),
            live_steps: Vec::new(),
            busy: false,
            agent_state: AgentState::Idle,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn live_steps(&self) -> &[ExecutionStep] {
        &self.live_steps
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent_state
    }

    /// Switch to a different session id, dropping every piece of
    /// session-scoped state.
    pub fn reset(&mut self, session_id: String) {
        self.session_id = session_id;
        self.messages.clear();
        self.input.clear();
        self.live_steps.clear();
        self.busy = false;
        self.agent_state = AgentState::Idle;
    }

    /// Start the send flow: append the user message optimistically, clear the
    /// composer and the live window, and hand back the text to POST. Returns
    /// `None` when the trimmed input is empty or a send is already in flight.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.busy || self.input.trim().is_empty() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        self.messages
            .push(ChatMessage::new(Role::User, text.clone(), None));
        self.live_steps.clear();
        self.busy = true;
        self.agent_state = AgentState::Running;
        Some(text)
    }

    /// Complete the send flow. Results for a session other than the current
    /// one are discarded; the transcript they belonged to is gone.
    pub fn apply_chat_result(&mut self, session_id: &str, result: Result<ChatReply, String>) {
        if session_id != self.session_id {
            return;
        }

        let message = match result {
            Ok(reply) => ChatMessage::new(Role::Assistant, reply.response, reply.steps),
            Err(description) => ChatMessage::new(
                Role::Assistant,
                format!("Sorry, something went wrong: {description}"),
                None,
            ),
        };
        self.messages.push(message);
        self.busy = false;
        self.agent_state = AgentState::Idle;
    }

    /// Upsert a live step into the bounded window: drop any entry with the
    /// same step number, append, sort ascending, keep the last 16 of the
    /// sorted result. Events for other sessions are a no-op.
    pub fn apply_step_update(&mut self, session_id: &str, step: ExecutionStep) {
        if session_id != self.session_id {
            return;
        }

        self.agent_state = AgentState::Running;
        self.live_steps.retain(|entry| entry.step_num != step.step_num);
        self.live_steps.push(step);
        self.live_steps.sort_by_key(|entry| entry.step_num);
        if self.live_steps.len() > LIVE_WINDOW_LIMIT {
            let excess = self.live_steps.len() - LIVE_WINDOW_LIMIT;
            self.live_steps.drain(..excess);
        }
    }

    /// Source of the plan view: the step list attached to the most recent
    /// assistant message wins, the live window is the fallback.
    pub fn plan_steps(&self) -> &[ExecutionStep] {
        self.messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant && message.has_steps())
            .and_then(|message| message.steps.as_deref())
            .unwrap_or(&self.live_steps)
    }

    pub fn plan_display(&self) -> &[ExecutionStep] {
        let steps = self.plan_steps();
        &steps[..steps.len().min(PLAN_DISPLAY_LIMIT)]
    }

    pub fn completed_count(&self) -> usize {
        self.plan_display()
            .iter()
            .filter(|step| step.is_completed())
            .count()
    }

    /// Recent activity: the tail of the live window when it has entries,
    /// otherwise the tail of the capped plan view.
    pub fn status_display(&self) -> &[ExecutionStep] {
        let steps = if self.live_steps.is_empty() {
            self.plan_display()
        } else {
            &self.live_steps
        };
        &steps[steps.len().saturating_sub(STATUS_DISPLAY_LIMIT)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(step_num: u32) -> ExecutionStep {
        ExecutionStep {
            step_num,
            thought: format!("thinking about step {step_num}"),
            action: "search_code".to_string(),
            action_input: json!({"query": "stack"}),
            observation: String::new(),
        }
    }

    fn completed_step(step_num: u32, observation: &str) -> ExecutionStep {
        ExecutionStep {
            observation: observation.to_string(),
            ..step(step_num)
        }
    }

    fn session() -> SessionState {
        SessionState::new("abc".to_string())
    }

    #[test]
    fn live_window_stays_sorted_and_deduplicated() {
        let mut state = session();
        for step_num in [7, 2, 9, 2, 5, 7, 1] {
            state.apply_step_update("abc", step(step_num));
        }

        let numbers: Vec<u32> = state.live_steps().iter().map(|s| s.step_num).collect();
        assert_eq!(numbers, vec![1, 2, 5, 7, 9]);
        assert_eq!(state.agent_state(), AgentState::Running);
    }

    #[test]
    fn live_window_truncates_to_last_sixteen_after_sort() {
        let mut state = session();
        for step_num in 1..=20 {
            state.apply_step_update("abc", step(step_num));
        }

        assert_eq!(state.live_steps().len(), LIVE_WINDOW_LIMIT);
        let numbers: Vec<u32> = state.live_steps().iter().map(|s| s.step_num).collect();
        assert_eq!(numbers, (5..=20).collect::<Vec<u32>>());
    }

    #[test]
    fn duplicate_step_number_replaces_the_old_entry() {
        let mut state = session();
        state.apply_step_update("abc", step(3));
        state.apply_step_update("abc", completed_step(3, "file written"));

        assert_eq!(state.live_steps().len(), 1);
        assert_eq!(state.live_steps()[0].observation, "file written");
    }

    #[test]
    fn step_update_for_other_session_is_ignored() {
        let mut state = session();
        state.apply_step_update("someone-else", step(1));

        assert!(state.live_steps().is_empty());
        assert_eq!(state.agent_state(), AgentState::Idle);
    }

    #[test]
    fn empty_or_whitespace_input_does_not_send() {
        let mut state = session();
        assert_eq!(state.begin_send(), None);

        state.input = "   \n\t ".to_string();
        assert_eq!(state.begin_send(), None);
        assert!(state.messages().is_empty());
        assert!(!state.busy());
    }

    #[test]
    fn send_is_refused_while_a_request_is_in_flight() {
        let mut state = session();
        state.input = "first".to_string();
        assert!(state.begin_send().is_some());

        state.input = "second".to_string();
        assert_eq!(state.begin_send(), None);
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn successful_send_grows_transcript_by_two_and_marks_plan_completed() {
        let mut state = session();
        state.input = "implement a stack".to_string();
        let text = state.begin_send().expect("send should start");
        assert_eq!(text, "implement a stack");
        assert!(state.busy());

        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "done".to_string(),
                steps: Some(vec![completed_step(1, "ok")]),
            }),
        );

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.messages()[1].role, Role::Assistant);
        assert!(!state.busy());
        assert_eq!(state.agent_state(), AgentState::Idle);

        let plan = state.plan_display();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].step_num, 1);
        assert!(plan[0].is_completed());
        assert_eq!(state.completed_count(), 1);
    }

    #[test]
    fn failed_send_appends_a_synthetic_assistant_message() {
        let mut state = session();
        state.input = "hello".to_string();
        state.begin_send().expect("send should start");

        state.apply_chat_result("abc", Err("request failed with status 502".to_string()));

        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[1].role, Role::Assistant);
        assert!(state.messages()[1]
            .content
            .contains("request failed with status 502"));
        assert!(!state.busy());
    }

    #[test]
    fn late_result_for_an_abandoned_session_is_discarded() {
        let mut state = session();
        state.input = "hello".to_string();
        state.begin_send().expect("send should start");
        state.reset("next".to_string());

        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "too late".to_string(),
                steps: None,
            }),
        );

        assert!(state.messages().is_empty());
        assert!(!state.busy());
    }

    #[test]
    fn starting_a_send_clears_the_live_window() {
        let mut state = session();
        state.apply_step_update("abc", step(4));
        state.input = "again".to_string();
        state.begin_send().expect("send should start");

        assert!(state.live_steps().is_empty());
        assert_eq!(state.agent_state(), AgentState::Running);
    }

    #[test]
    fn reset_clears_all_session_scoped_state() {
        let mut state = session();
        state.input = "draft".to_string();
        state.apply_step_update("abc", step(1));
        state.messages.push(ChatMessage::new(
            Role::User,
            "hello".to_string(),
            None,
        ));
        state.busy = true;
        state.agent_state = AgentState::Running;

        state.reset("def".to_string());

        assert_eq!(state.session_id(), "def");
        assert!(state.messages().is_empty());
        assert!(state.input.is_empty());
        assert!(state.live_steps().is_empty());
        assert!(!state.busy());
        assert_eq!(state.agent_state(), AgentState::Idle);
    }

    #[test]
    fn message_steps_take_precedence_over_the_live_window() {
        let mut state = session();
        state.apply_step_update("abc", step(9));
        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "answer".to_string(),
                steps: Some(vec![completed_step(1, "done"), step(2)]),
            }),
        );

        let plan: Vec<u32> = state.plan_display().iter().map(|s| s.step_num).collect();
        assert_eq!(plan, vec![1, 2]);
    }

    #[test]
    fn assistant_message_without_steps_falls_back_to_live_window() {
        let mut state = session();
        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "no steps here".to_string(),
                steps: None,
            }),
        );
        state.apply_step_update("abc", step(5));

        let plan: Vec<u32> = state.plan_display().iter().map(|s| s.step_num).collect();
        assert_eq!(plan, vec![5]);
    }

    #[test]
    fn plan_view_is_capped_to_eight_steps() {
        let mut state = session();
        let steps: Vec<ExecutionStep> = (1..=10).map(step).collect();
        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "long plan".to_string(),
                steps: Some(steps),
            }),
        );

        let plan: Vec<u32> = state.plan_display().iter().map(|s| s.step_num).collect();
        assert_eq!(plan, (1..=8).collect::<Vec<u32>>());
    }

    #[test]
    fn status_view_prefers_the_tail_of_the_live_window() {
        let mut state = session();
        for step_num in 1..=9 {
            state.apply_step_update("abc", step(step_num));
        }

        let status: Vec<u32> = state.status_display().iter().map(|s| s.step_num).collect();
        assert_eq!(status, (4..=9).collect::<Vec<u32>>());
    }

    #[test]
    fn status_view_falls_back_to_the_tail_of_the_capped_plan() {
        let mut state = session();
        let steps: Vec<ExecutionStep> = (1..=10).map(step).collect();
        state.apply_chat_result(
            "abc",
            Ok(ChatReply {
                response: "plan only".to_string(),
                steps: Some(steps),
            }),
        );

        // Plan display is steps 1..=8, so the status tail is 3..=8.
        let status: Vec<u32> = state.status_display().iter().map(|s| s.step_num).collect();
        assert_eq!(status, (3..=8).collect::<Vec<u32>>());
    }

    #[test]
    fn step_decodes_with_missing_optional_fields() {
        let step: ExecutionStep =
            serde_json::from_value(json!({"step_num": 2})).expect("partial step should decode");
        assert_eq!(step.step_num, 2);
        assert!(step.thought.is_empty());
        assert!(!step.is_completed());
    }

    #[test]
    fn whitespace_only_observation_is_not_completed() {
        assert!(!completed_step(1, "   ").is_completed());
        assert!(completed_step(1, " ok ").is_completed());
    }
}
